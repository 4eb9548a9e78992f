//! Cache Module
//!
//! Two-tier response cache: a shared remote tier with an in-process bounded
//! fallback, plus connection health tracking.

mod client;
mod entry;
mod health;
mod local;
mod order;
mod pattern;
mod remote;
mod stats;

#[cfg(test)]
pub(crate) mod mock;

// Re-export public types
pub use client::RemoteCacheClient;
pub use entry::{current_timestamp_ms, CacheEntry, CachedResponse};
pub use health::{
    ConnectionEvent, ConnectionHealth, ConnectionHealthMonitor, ConnectionState, HealthSnapshot,
};
pub use local::LocalCacheStore;
pub use order::InsertionOrder;
pub use pattern::GlobPattern;
pub use remote::{redact_url, scan_match_pattern, RedisBackend, RemoteBackend};
pub use stats::LocalStats;
