// Data models for AssetStore

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::record::Record;

/// Physical item tracked in the inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: String,
    pub name: String,
    pub specification: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub price: Option<f64>,
    pub notes: Option<String>,
    pub status: AssetStatus,
    pub location: Option<AssetLocation>,
    pub location_detail: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl AssetRecord {
    /// Build a stored record from validated input
    pub fn from_input(id: String, input: &AssetInput, created_at: i64, updated_at: i64) -> Self {
        let input = input.normalized();
        Self {
            id,
            name: input.name,
            specification: input.specification,
            purchase_date: input.purchase_date,
            price: input.price,
            notes: input.notes,
            status: input.status,
            location: input.location,
            location_detail: input.location_detail,
            created_at,
            updated_at,
        }
    }

    /// Inverse of `from_input`, used to pre-fill an edit form
    pub fn to_input(&self) -> AssetInput {
        AssetInput {
            name: self.name.clone(),
            specification: self.specification.clone(),
            purchase_date: self.purchase_date,
            price: self.price,
            notes: self.notes.clone(),
            status: self.status,
            location: self.location,
            location_detail: self.location_detail.clone(),
        }
    }
}

impl Record for AssetRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }

    fn updated_at(&self) -> i64 {
        self.updated_at
    }

    fn collection_name() -> &'static str {
        "assets"
    }

    fn indexed_fields(&self) -> HashMap<String, String> {
        let mut fields = HashMap::new();
        fields.insert("status".to_string(), self.status.to_string());
        if let Some(location) = self.location {
            fields.insert("location".to_string(), location.to_string());
        }
        fields
    }
}

/// Asset condition. Spellings are the stored values and must match exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssetStatus {
    InUse,
    NotInUse,
    Damaged,
    UnderRepair,
}

impl AssetStatus {
    pub const ALL: [AssetStatus; 4] = [
        AssetStatus::InUse,
        AssetStatus::NotInUse,
        AssetStatus::Damaged,
        AssetStatus::UnderRepair,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AssetStatus::InUse => "InUse",
            AssetStatus::NotInUse => "NotInUse",
            AssetStatus::Damaged => "Damaged",
            AssetStatus::UnderRepair => "UnderRepair",
        }
    }

    /// Human readable label for badges and stat cards
    pub fn label(self) -> &'static str {
        match self {
            AssetStatus::InUse => "In use",
            AssetStatus::NotInUse => "Not in use",
            AssetStatus::Damaged => "Damaged",
            AssetStatus::UnderRepair => "Under repair",
        }
    }
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "status",
                value: s.to_string(),
            })
    }
}

/// Where an asset is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetLocation {
    Stage,
    Cabinet,
    Box,
}

impl AssetLocation {
    pub const ALL: [AssetLocation; 3] = [AssetLocation::Stage, AssetLocation::Cabinet, AssetLocation::Box];

    pub fn as_str(self) -> &'static str {
        match self {
            AssetLocation::Stage => "Stage",
            AssetLocation::Cabinet => "Cabinet",
            AssetLocation::Box => "Box",
        }
    }
}

impl fmt::Display for AssetLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetLocation {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetLocation::ALL
            .into_iter()
            .find(|location| location.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "location",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind}: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Form input for creating or editing an asset (no id, no timestamps)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetInput {
    pub name: String,
    pub specification: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub price: Option<f64>,
    pub notes: Option<String>,
    pub status: AssetStatus,
    pub location: Option<AssetLocation>,
    pub location_detail: Option<String>,
}

impl AssetInput {
    pub fn new(name: impl Into<String>, status: AssetStatus) -> Self {
        Self {
            name: name.into(),
            specification: None,
            purchase_date: None,
            price: None,
            notes: None,
            status,
            location: None,
            location_detail: None,
        }
    }

    /// Check every field and report all failures at once
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "Asset name is required"));
        }

        if let Some(price) = self.price {
            if !price.is_finite() {
                errors.push(FieldError::new("price", "Price must be a number"));
            } else if price < 0.0 {
                errors.push(FieldError::new("price", "Price must not be negative"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(errors))
        }
    }

    /// Blank optional text becomes `None`; the name is trimmed
    pub fn normalized(&self) -> Self {
        fn blank_to_none(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }

        Self {
            name: self.name.trim().to_string(),
            specification: blank_to_none(&self.specification),
            purchase_date: self.purchase_date,
            price: self.price,
            notes: blank_to_none(&self.notes),
            status: self.status,
            location: self.location,
            location_detail: blank_to_none(&self.location_detail),
        }
    }
}

/// A single invalid form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", summarize(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn for_field(&self, field: &str) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field == field)
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Account with access to the inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Record for UserProfile {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }

    fn updated_at(&self) -> i64 {
        self.updated_at
    }

    fn collection_name() -> &'static str {
        "user_profiles"
    }

    fn indexed_fields(&self) -> HashMap<String, String> {
        let mut fields = HashMap::new();
        fields.insert("email".to_string(), self.email.to_lowercase());
        fields.insert("role".to_string(), self.role.to_string());
        fields
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::User => f.write_str("user"),
        }
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(ParseEnumError {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

/// Helper function to get current timestamp in milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
