//! Error types for the cache layer
//!
//! Provides unified error handling using thiserror. Cache operations never
//! surface these to callers of `CacheService`; they exist for the backend
//! seams, startup validation and the HTTP surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache layer.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Remote backend unreachable or connection dropped
    #[error("Cache connection error: {0}")]
    Connection(String),

    /// Remote operation exceeded its time budget
    #[error("Cache operation timed out: {0}")]
    Timeout(String),

    /// Value could not be serialized or deserialized
    #[error("Cache serialization error: {0}")]
    Serialization(String),

    /// Any other backend failure
    #[error("Cache backend error: {0}")]
    Backend(String),

    /// Operation not supported by the backend
    #[error("Unsupported cache operation: {0}")]
    Unsupported(String),

    /// Invalid startup configuration
    #[error("Invalid cache configuration: {0}")]
    Config(String),

    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl CacheError {
    /// Returns true for errors that mean the remote connection is gone.
    pub fn is_connection(&self) -> bool {
        matches!(self, CacheError::Connection(_))
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
            CacheError::Connection(err.to_string())
        } else if err.is_timeout() {
            CacheError::Timeout(err.to_string())
        } else {
            CacheError::Backend(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) | CacheError::Serialization(_) => {
                StatusCode::BAD_REQUEST
            }
            CacheError::Connection(_) | CacheError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
            CacheError::Backend(_) | CacheError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;
