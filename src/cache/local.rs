//! Local Cache Store Module
//!
//! Bounded in-process tier combining HashMap storage with FIFO eviction and
//! lazily checked TTL expiration.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::{CacheEntry, GlobPattern, InsertionOrder, LocalStats};

#[derive(Debug)]
struct Inner {
    entries: HashMap<String, CacheEntry>,
    order: InsertionOrder,
    stats: LocalStats,
}

impl Inner {
    fn remove(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.order.remove(key);
            true
        } else {
            false
        }
    }

    fn sync_len(&mut self) {
        let len = self.entries.len();
        debug_assert_eq!(len, self.order.len());
        self.stats.set_entries(len);
    }
}

// == Local Cache Store ==
/// In-process fallback store.
///
/// Holds at most `max_size` entries. When a new key arrives at capacity the
/// earliest inserted key is evicted, regardless of how recently it was read.
/// All operations are synchronous and take `&self`; the lock is never held
/// across an await point.
#[derive(Debug)]
pub struct LocalCacheStore {
    inner: Mutex<Inner>,
    max_size: usize,
}

impl LocalCacheStore {
    // == Constructor ==
    /// Creates a store holding at most `max_size` entries.
    ///
    /// A capacity of zero disables the tier: writes are dropped and reads
    /// always miss.
    pub fn new(max_size: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: InsertionOrder::new(),
                stats: LocalStats::new(max_size),
            }),
            max_size,
        }
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl_seconds`.
    ///
    /// Overwriting an existing key replaces its value and deadline but keeps
    /// its insertion position, and never evicts.
    pub fn set(&self, key: &str, value: String, ttl_seconds: u64) {
        if !self.is_enabled() {
            return;
        }

        let mut inner = self.inner.lock();
        let entry = CacheEntry::new(value, ttl_seconds);

        if let Some(existing) = inner.entries.get_mut(key) {
            *existing = entry;
            return;
        }

        while inner.entries.len() >= self.max_size {
            match inner.order.evict_oldest() {
                Some(evicted) => {
                    inner.entries.remove(&evicted);
                    inner.stats.record_eviction();
                    debug!(key = %evicted, "local cache evicted oldest entry");
                }
                None => break,
            }
        }

        inner.entries.insert(key.to_string(), entry);
        inner.order.push(key);
        inner.sync_len();
    }

    // == Get ==
    /// Returns the value if present and unexpired.
    ///
    /// An expired entry is purged as a side effect.
    pub fn get(&self, key: &str) -> Option<String> {
        let mut inner = self.inner.lock();
        let expired = match inner.entries.get(key) {
            Some(entry) if !entry.is_expired() => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            inner.remove(key);
            inner.stats.record_expirations(1);
            inner.sync_len();
        }
        None
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether anything was removed.
    pub fn delete(&self, key: &str) -> bool {
        let mut inner = self.inner.lock();
        let removed = inner.remove(key);
        inner.sync_len();
        removed
    }

    // == Delete By Pattern ==
    /// Removes every key matching the `*` glob. Returns the number removed.
    pub fn delete_by_pattern(&self, pattern: &str) -> usize {
        let glob = GlobPattern::new(pattern);
        let mut inner = self.inner.lock();
        let matching: Vec<String> = inner
            .entries
            .keys()
            .filter(|key| glob.matches(key))
            .cloned()
            .collect();

        for key in &matching {
            inner.remove(key);
        }
        inner.sync_len();
        matching.len()
    }

    // == Exists ==
    /// True only if the key is present and unexpired.
    pub fn exists(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the store.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut inner = self.inner.lock();
        let expired_keys: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            inner.remove(key);
        }

        inner.stats.record_expirations(expired_keys.len());
        inner.sync_len();
        expired_keys.len()
    }

    // == Stats ==
    pub fn stats(&self) -> LocalStats {
        self.inner.lock().stats.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn is_enabled(&self) -> bool {
        self.max_size > 0
    }
}
