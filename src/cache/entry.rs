//! Cache Entry Module
//!
//! Defines individual cache entries and the serialized response format
//! stored in both tiers.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::CacheResult;

// == Cache Entry ==
/// A single value held by the local tier together with its deadline.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: String,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry that expires `ttl_seconds` from now.
    pub fn new(value: String, ttl_seconds: u64) -> Self {
        let now = current_timestamp_ms();
        Self {
            value,
            created_at: now,
            expires_at: now.saturating_add(ttl_seconds.saturating_mul(1000)),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches `expires_at`, so a
    /// zero TTL entry is never readable.
    pub fn is_expired(&self) -> bool {
        current_timestamp_ms() >= self.expires_at
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, 0 once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        self.expires_at.saturating_sub(current_timestamp_ms())
    }
}

// == Cached Response ==
/// The part of an HTTP response that the read-through middleware replays on
/// a hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub body: String,
}

impl CachedResponse {
    pub fn encode(&self) -> CacheResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(raw: &str) -> CacheResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
