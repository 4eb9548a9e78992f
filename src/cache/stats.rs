//! Local Tier Statistics Module
//!
//! Tracks housekeeping counters of the in-process fallback store.

use serde::Serialize;

// == Local Stats ==
/// Counters describing the local tier.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalStats {
    /// Entries dropped to make room for a new key
    pub evictions: u64,
    /// Expired entries purged on read or by the sweep
    pub expirations: u64,
    /// Current number of entries
    pub entries: usize,
    /// Configured capacity
    pub max_size: usize,
}

impl LocalStats {
    // == Constructor ==
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            ..Self::default()
        }
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    pub fn set_entries(&mut self, count: usize) {
        self.entries = count;
    }
}
