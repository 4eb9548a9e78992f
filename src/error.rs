//! Error types for the cache layer and the content API
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Failures of the remote cache tier.
///
/// These never reach an HTTP response: the cache client logs them and
/// degrades to the local tier instead.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Could not establish a connection to the remote service
    #[error("Connection error: {0}")]
    Connection(String),

    /// The connection was closed or dropped underneath us
    #[error("Disconnected: {0}")]
    Disconnected(String),

    /// Connect or command exceeded its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Cached value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Any other failure reported by the remote service
    #[error("Backend error: {0}")]
    Backend(String),
}

impl CacheError {
    /// Returns true when the failure means the connection is gone.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, CacheError::Disconnected(_) | CacheError::Connection(_))
    }

    /// Returns true when the failure says something about the connection
    /// itself. Reply errors for a single command (e.g. WRONGTYPE) and bad
    /// payloads do not.
    pub fn is_connection_level(&self) -> bool {
        self.is_disconnect() || matches!(self, CacheError::Timeout(_))
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_dropped() || err.is_io_error() || err.is_connection_refusal() {
            CacheError::Disconnected(err.to_string())
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

/// Result type for remote cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

// == API Error Enum ==
/// Errors returned by the content API handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Item or collection not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the content API.
pub type Result<T> = std::result::Result<T, ApiError>;
