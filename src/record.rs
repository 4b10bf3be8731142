// Generic record trait for any storable type

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Core trait that any storable record must implement
pub trait Record: Serialize + for<'de> Deserialize<'de> + Clone + Send + Sync + 'static {
    /// Unique identifier for this record
    fn id(&self) -> &str;

    /// Creation timestamp (milliseconds since epoch); listings are newest first
    fn created_at(&self) -> i64;

    /// Timestamp when this record was last updated (milliseconds since epoch)
    fn updated_at(&self) -> i64;

    /// Collection name for this record type (e.g., "assets", "user_profiles")
    /// Determines the JSONL filename: {collection}.jsonl
    fn collection_name() -> &'static str
    where
        Self: Sized;

    /// Fields to index for equality lookups
    /// Return empty HashMap if no fields should be indexed
    fn indexed_fields(&self) -> HashMap<String, String> {
        HashMap::new()
    }
}

/// Equality lookup on an indexed field
#[derive(Debug, Clone, PartialEq)]
pub struct IndexFilter {
    /// Field name to match
    pub field: String,
    /// Value the field must equal
    pub value: String,
}

impl IndexFilter {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}
