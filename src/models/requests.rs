//! Request DTOs for the HTTP adapter
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;

use crate::cache::{MAX_KEY_LENGTH, PAYLOAD_FIELD};

/// Request body for the change feed (POST /feed/advance)
///
/// # Fields
/// - `constraint`: The constraint whose upstream data changed
/// - `version`: The new version; must not go backwards
#[derive(Debug, Clone, Deserialize)]
pub struct AdvanceRequest {
    pub constraint: String,
    pub version: u64,
}

impl AdvanceRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.constraint.is_empty() {
            return Some("Constraint cannot be empty".to_string());
        }
        if self.constraint.len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Constraint exceeds maximum length of {} characters",
                MAX_KEY_LENGTH
            ));
        }
        if self.constraint == PAYLOAD_FIELD {
            return Some(format!("'{}' is reserved", PAYLOAD_FIELD));
        }
        None
    }
}

/// Query string for GET /books
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BooksParams {
    /// Comma-separated nested fields, e.g. `author,stores`
    #[serde(default)]
    pub fields: String,
}
