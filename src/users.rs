// Role-gated user administration

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::{Role, UserProfile, now_ms};
use crate::record::IndexFilter;
use crate::session::{BOOTSTRAP_USER_ID, Forbidden, Session};
use crate::store::Store;

#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Forbidden(#[from] Forbidden),

    #[error("{0}")]
    Invalid(&'static str),

    #[error("a user with email {0} already exists")]
    DuplicateEmail(String),

    #[error("user not found: {0}")]
    NotFound(String),

    #[error("the first account must be an administrator")]
    FirstAccountNotAdmin,

    #[error("you cannot remove your own account")]
    RemoveSelf,

    #[error("no user registered for {0}")]
    UnknownUser(String),

    #[error("{0:#}")]
    Store(eyre::Report),
}

impl From<eyre::Report> for UserError {
    fn from(report: eyre::Report) -> Self {
        UserError::Store(report)
    }
}

/// New account request
#[derive(Debug, Clone, PartialEq)]
pub struct InviteRequest {
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
}

/// User profiles kept alongside the assets
pub struct UserDirectory<'a> {
    store: &'a mut Store,
}

impl<'a> UserDirectory<'a> {
    pub fn new(store: &'a mut Store) -> Self {
        Self { store }
    }

    /// All users, newest first (admins only)
    pub fn list(&self, session: &Session) -> Result<Vec<UserProfile>, UserError> {
        session.require_admin("list users")?;
        self.all()
    }

    fn all(&self) -> Result<Vec<UserProfile>, UserError> {
        Ok(self.store.list::<UserProfile>(&[])?)
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>, UserError> {
        let filters = [IndexFilter::eq("email", email.trim().to_lowercase())];
        Ok(self.store.list::<UserProfile>(&filters)?.into_iter().next())
    }

    /// Resolve the session for `email`
    ///
    /// While no account exists at all, any caller gets a bootstrap admin
    /// session so the first administrator can be invited.
    pub fn session_for(&self, email: &str) -> Result<Session, UserError> {
        if let Some(user) = self.find_by_email(email)? {
            return Ok(Session::new(user));
        }
        if self.all()?.is_empty() {
            info!(email, "No users yet, using bootstrap admin session");
            return Ok(Session::bootstrap(email.trim()));
        }
        Err(UserError::UnknownUser(email.to_string()))
    }

    /// Create a profile for a new user (admins only)
    ///
    /// A bootstrap session may only create an administrator, so the store
    /// never ends up with accounts but no admin.
    pub fn invite(&mut self, session: &Session, request: InviteRequest) -> Result<UserProfile, UserError> {
        session.require_admin("invite users")?;
        if session.user().id == BOOTSTRAP_USER_ID && request.role != Role::Admin {
            return Err(UserError::FirstAccountNotAdmin);
        }

        let email = request.email.trim().to_lowercase();
        if email.is_empty() {
            return Err(UserError::Invalid("Email is required"));
        }
        if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
            return Err(UserError::Invalid("Email address is not valid"));
        }
        if self.find_by_email(&email)?.is_some() {
            return Err(UserError::DuplicateEmail(email));
        }

        let now = now_ms();
        let profile = UserProfile {
            id: Uuid::now_v7().to_string(),
            email,
            full_name: request
                .full_name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            role: request.role,
            created_at: now,
            updated_at: now,
        };
        self.store.put(&profile)?;

        info!(email = %profile.email, role = %profile.role, invited_by = %session.user().email, "User invited");
        Ok(profile)
    }

    /// Revoke a user's access (admins only, never yourself)
    pub fn remove(&mut self, session: &Session, id: &str) -> Result<(), UserError> {
        session.require_admin("remove users")?;

        if session.user().id == id {
            return Err(UserError::RemoveSelf);
        }

        let user: UserProfile = self
            .store
            .get(id)?
            .ok_or_else(|| UserError::NotFound(id.to_string()))?;
        self.store.delete::<UserProfile>(id)?;

        info!(email = %user.email, removed_by = %session.user().email, "User removed");
        Ok(())
    }
}
