// Identity and capability passed explicitly to whatever needs it

use thiserror::Error;

use crate::models::{Role, UserProfile};

/// Id given to the synthetic admin used before any account exists
pub const BOOTSTRAP_USER_ID: &str = "bootstrap";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("only administrators can {action}")]
pub struct Forbidden {
    pub action: &'static str,
}

/// The signed-in user
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    user: UserProfile,
}

impl Session {
    pub fn new(user: UserProfile) -> Self {
        Self { user }
    }

    /// Admin session for an empty user directory, so the first account can
    /// be created
    pub fn bootstrap(email: impl Into<String>) -> Self {
        Self {
            user: UserProfile {
                id: BOOTSTRAP_USER_ID.to_string(),
                email: email.into(),
                full_name: None,
                role: Role::Admin,
                created_at: 0,
                updated_at: 0,
            },
        }
    }

    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    pub fn is_admin(&self) -> bool {
        self.user.role == Role::Admin
    }

    pub fn require_admin(&self, action: &'static str) -> Result<(), Forbidden> {
        if self.is_admin() { Ok(()) } else { Err(Forbidden { action }) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(role: Role) -> UserProfile {
        UserProfile {
            id: "u1".to_string(),
            email: "someone@example.org".to_string(),
            full_name: Some("Someone".to_string()),
            role,
            created_at: 1,
            updated_at: 1,
        }
    }

    #[test]
    fn test_admin_flag_follows_role() {
        assert!(Session::new(profile(Role::Admin)).is_admin());
        assert!(!Session::new(profile(Role::User)).is_admin());
    }

    #[test]
    fn test_require_admin() {
        let session = Session::new(profile(Role::User));
        let err = session.require_admin("invite users").unwrap_err();
        assert_eq!(err.to_string(), "only administrators can invite users");

        assert!(Session::new(profile(Role::Admin)).require_admin("invite users").is_ok());
    }

    #[test]
    fn test_bootstrap_is_admin() {
        let session = Session::bootstrap("first@example.org");
        assert!(session.is_admin());
        assert_eq!(session.user().id, BOOTSTRAP_USER_ID);
    }
}
