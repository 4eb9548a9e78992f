//! Metrics Module
//!
//! Process-wide request counters for the cache layer.

mod collector;

pub use collector::{format_hit_ratio, CacheMetrics, MetricsCollector, MetricsSnapshot, RouteStats};
