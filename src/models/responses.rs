//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

const STATUS_OK: &str = "OK";
const STATUS_ERROR: &str = "ERROR";

/// Status envelope used by insert acknowledgements and all errors
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    /// "OK" or "ERROR"
    pub status: String,
    /// Human-readable outcome
    pub message: String,
}

impl StatusResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            message: message.into(),
        }
    }

    /// Acknowledgement for a successful POST /put
    pub fn inserted() -> Self {
        Self::ok("Key inserted/updated successfully.")
    }
}

/// Response body for the lookup operation (GET /get)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub status: String,
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: String,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
