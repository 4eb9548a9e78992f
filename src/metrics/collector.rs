//! Metrics Collector Module
//!
//! Tracks hit/miss/bypass counts, a status-code histogram and per-route
//! tallies.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use crate::middleware::CacheOutcome;

// == Route Stats ==
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStats {
    pub hits: u64,
    pub misses: u64,
    pub bypasses: u64,
    pub total_requests: u64,
}

impl RouteStats {
    fn record(&mut self, outcome: Option<CacheOutcome>) {
        self.total_requests += 1;
        match outcome {
            Some(CacheOutcome::Hit) => self.hits += 1,
            Some(CacheOutcome::Miss) => self.misses += 1,
            Some(CacheOutcome::Bypass) => self.bypasses += 1,
            // Degraded outcomes and uncached routes only count as requests.
            Some(CacheOutcome::Error) | Some(CacheOutcome::Unavailable) | None => {}
        }
    }
}

// == Cache Metrics ==
/// Raw counters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub bypasses: u64,
    pub total_requests: u64,
    pub status_codes: BTreeMap<String, u64>,
    pub route_stats: BTreeMap<String, RouteStats>,
    pub last_reset: DateTime<Utc>,
}

impl CacheMetrics {
    fn new() -> Self {
        Self {
            hits: 0,
            misses: 0,
            bypasses: 0,
            total_requests: 0,
            status_codes: BTreeMap::new(),
            route_stats: BTreeMap::new(),
            last_reset: Utc::now(),
        }
    }
}

// == Metrics Snapshot ==
/// Body of the metrics endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    #[serde(flatten)]
    pub metrics: CacheMetrics,
    pub hit_ratio: String,
    pub uptime_seconds: i64,
    pub timestamp: DateTime<Utc>,
}

/// Formats `hits / total` as a percentage with two decimals, `"0%"` when
/// there were no requests.
pub fn format_hit_ratio(hits: u64, total: u64) -> String {
    if total == 0 {
        return "0%".to_string();
    }
    format!("{:.2}%", hits as f64 / total as f64 * 100.0)
}

// == Metrics Collector ==
#[derive(Debug)]
pub struct MetricsCollector {
    inner: Mutex<CacheMetrics>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(CacheMetrics::new()),
        }
    }

    /// Route key for a request: method and path, query stripped.
    pub fn route_key(method: &str, path: &str) -> String {
        let path = path.split('?').next().unwrap_or(path);
        format!("{} {}", method, path)
    }

    // == Record ==
    /// Counts one completed request.
    pub fn record(&self, route: &str, status: u16, outcome: Option<CacheOutcome>) {
        let mut m = self.inner.lock();

        m.total_requests += 1;
        *m.status_codes.entry(status.to_string()).or_insert(0) += 1;
        match outcome {
            Some(CacheOutcome::Hit) => m.hits += 1,
            Some(CacheOutcome::Miss) => m.misses += 1,
            Some(CacheOutcome::Bypass) => m.bypasses += 1,
            _ => {}
        }

        m.route_stats
            .entry(route.to_string())
            .or_default()
            .record(outcome);
    }

    // == Snapshot ==
    pub fn snapshot(&self) -> MetricsSnapshot {
        let metrics = self.inner.lock().clone();
        let now = Utc::now();
        MetricsSnapshot {
            hit_ratio: format_hit_ratio(metrics.hits, metrics.total_requests),
            uptime_seconds: (now - metrics.last_reset).num_seconds(),
            timestamp: now,
            metrics,
        }
    }

    // == Reset ==
    /// Zeroes every counter and returns the new `last_reset`.
    pub fn reset(&self) -> DateTime<Utc> {
        let fresh = CacheMetrics::new();
        let stamp = fresh.last_reset;
        *self.inner.lock() = fresh;
        stamp
    }
}
