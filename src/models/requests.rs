//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;

use crate::cache::{MAX_KEY_LENGTH, MAX_VALUE_LENGTH};

/// Request body for the insert operation (POST /put)
#[derive(Debug, Clone, Deserialize)]
pub struct PutRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: String,
}

impl PutRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.len() > MAX_KEY_LENGTH || self.value.len() > MAX_VALUE_LENGTH {
            return Some(format!(
                "Key and Value must be at most {} characters",
                MAX_KEY_LENGTH
            ));
        }
        None
    }
}

/// Query string for the lookup operation (GET /get?key=...)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetParams {
    #[serde(default)]
    pub key: Option<String>,
}
