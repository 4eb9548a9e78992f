//! Response DTOs for the cache administration API
//!
//! Defines the structure of outgoing HTTP response bodies.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::{ConnectionHealth, HealthSnapshot, LocalStats};

/// Cache availability summary embedded in the liveness response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheAvailability {
    /// At least one tier can serve
    pub available: bool,
    pub remote_connected: bool,
    pub local_enabled: bool,
}

/// Response body for the liveness endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status ("healthy" or "degraded")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    pub cache: CacheAvailability,
}

impl HealthResponse {
    /// Builds the liveness body. The process is "healthy" when the remote
    /// tier is up and "degraded" while it runs on the local tier alone.
    pub fn new(cache: CacheAvailability) -> Self {
        let status = if cache.remote_connected {
            "healthy"
        } else {
            "degraded"
        };
        Self {
            status: status.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            cache,
        }
    }
}

/// Response body for POST /api/cache/metrics/reset
#[derive(Debug, Clone, Serialize)]
pub struct ResetResponse {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ResetResponse {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            message: "Cache metrics reset".to_string(),
            timestamp,
        }
    }
}

/// Response body for POST /api/cache/reconnect
#[derive(Debug, Clone, Serialize)]
pub struct ReconnectResponse {
    pub connected: bool,
    pub health: ConnectionHealth,
}

/// Response body for GET /api/cache/health
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheHealthResponse {
    pub available: bool,
    pub remote: HealthSnapshot,
    pub local: LocalStats,
    pub timestamp: DateTime<Utc>,
}

/// Response body for DELETE /api/<collection>/:id
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The id that was deleted
    pub id: String,
}

impl DeleteResponse {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            message: format!("Item '{}' deleted successfully", id),
            id,
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
