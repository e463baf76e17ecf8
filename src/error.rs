//! Error types for the cache server
//!
//! Provides unified error handling using thiserror. The engine itself never
//! fails; these errors come from the HTTP layer in front of it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::StatusResponse;

// == Cache Error Enum ==
/// Unified error type for the cache server.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache
    #[error("Key not found.")]
    NotFound,

    /// Request body is not valid JSON for the endpoint
    #[error("Invalid JSON")]
    InvalidJson,

    /// Request data failed validation
    #[error("{0}")]
    InvalidRequest(String),

    /// Lookup without a key query parameter
    #[error("Missing key parameter")]
    MissingKey,

    /// Admission limit reached
    #[error("Too many requests")]
    TooManyRequests,

    /// Request exceeded its deadline
    #[error("Request timeout")]
    Timeout,

    /// Route exists but not for this method
    #[error("Method Not Allowed")]
    MethodNotAllowed,
}

impl CacheError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CacheError::NotFound => StatusCode::NOT_FOUND,
            CacheError::InvalidJson | CacheError::InvalidRequest(_) | CacheError::MissingKey => {
                StatusCode::BAD_REQUEST
            }
            CacheError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            CacheError::Timeout => StatusCode::REQUEST_TIMEOUT,
            CacheError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let body = Json(StatusResponse::error(self.to_string()));
        (self.status_code(), body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache server.
pub type Result<T> = std::result::Result<T, CacheError>;
