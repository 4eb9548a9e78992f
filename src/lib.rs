//! Response Cache - two-tier HTTP response caching for a content API
//!
//! A shared Redis tier with an in-process FIFO fallback, read-through GET
//! caching, pattern invalidation on mutation, bounded reconnection and
//! per-route metrics.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod tasks;

pub use api::{create_router, AppState};
pub use cache::{ConnectionHealthMonitor, LocalCacheStore, RemoteBackend, RemoteCacheClient};
pub use config::Config;
pub use metrics::MetricsCollector;
pub use tasks::{spawn_cleanup_task, spawn_reconnect_task};
