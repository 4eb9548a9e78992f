//! Two-tier cache client.
//!
//! Every operation prefers the remote tier while it is healthy and falls back
//! to the local store otherwise. Nothing here returns an error: remote
//! failures are logged, reported to the health monitor, and absorbed.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::cache::{ConnectionHealthMonitor, LocalCacheStore};

#[derive(Debug, Clone)]
pub struct RemoteCacheClient {
    monitor: Arc<ConnectionHealthMonitor>,
    local: Arc<LocalCacheStore>,
}

impl RemoteCacheClient {
    pub fn new(monitor: Arc<ConnectionHealthMonitor>, local: Arc<LocalCacheStore>) -> Self {
        Self { monitor, local }
    }

    pub fn monitor(&self) -> &Arc<ConnectionHealthMonitor> {
        &self.monitor
    }

    pub fn local(&self) -> &Arc<LocalCacheStore> {
        &self.local
    }

    fn remote_healthy(&self) -> bool {
        self.monitor.is_connected()
    }

    /// False only when neither tier can serve: remote down and local tier
    /// disabled.
    pub fn is_available(&self) -> bool {
        self.remote_healthy() || self.local.is_enabled()
    }

    // == Get ==
    /// Reads `key`, remote first.
    ///
    /// A remote miss still consults the local tier, which is written on
    /// every set and may hold a copy the remote never received.
    pub async fn get(&self, key: &str) -> Option<String> {
        if self.remote_healthy() {
            match self.monitor.backend().get(key).await {
                Ok(Some(value)) => return Some(value),
                Ok(None) => {}
                Err(e) => {
                    warn!(key = %key, error = %e, "remote GET failed, using local tier");
                    self.monitor.record_failure(&e);
                }
            }
        }
        self.local.get(key)
    }

    // == Set ==
    /// Writes both tiers: local always, remote when healthy.
    pub async fn set(&self, key: &str, value: &str, ttl_seconds: u64) {
        self.local.set(key, value.to_string(), ttl_seconds);

        if self.remote_healthy() {
            let ttl = Duration::from_secs(ttl_seconds);
            if let Err(e) = self.monitor.backend().set(key, value, ttl).await {
                warn!(key = %key, error = %e, "remote SET failed, value kept locally");
                self.monitor.record_failure(&e);
            }
        }
        debug!(key = %key, ttl_seconds, "cache set");
    }

    // == Delete ==
    pub async fn delete(&self, key: &str) {
        self.local.delete(key);

        if self.remote_healthy() {
            if let Err(e) = self.monitor.backend().delete(key).await {
                warn!(key = %key, error = %e, "remote DEL failed");
                self.monitor.record_failure(&e);
            }
        }
    }

    // == Delete By Pattern ==
    /// Removes matching keys from both tiers. Returns the total removed.
    pub async fn delete_by_pattern(&self, pattern: &str) -> u64 {
        let mut removed = self.local.delete_by_pattern(pattern) as u64;

        if self.remote_healthy() {
            match self.monitor.backend().delete_pattern(pattern).await {
                Ok(count) => removed += count,
                Err(e) => {
                    warn!(pattern = %pattern, error = %e, "remote pattern delete failed");
                    self.monitor.record_failure(&e);
                }
            }
        }
        debug!(pattern = %pattern, removed, "cache pattern delete");
        removed
    }

    // == Exists ==
    pub async fn exists(&self, key: &str) -> bool {
        if self.remote_healthy() {
            match self.monitor.backend().exists(key).await {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => {
                    warn!(key = %key, error = %e, "remote EXISTS failed, using local tier");
                    self.monitor.record_failure(&e);
                }
            }
        }
        self.local.exists(key)
    }

    // == Shutdown ==
    /// Closes the remote connection: a clean `QUIT` bounded by `timeout`,
    /// then a forced disconnect if that fails.
    pub async fn shutdown(&self, timeout: Duration) {
        let backend = self.monitor.backend();
        if !backend.is_open() {
            debug!("remote cache already closed");
            return;
        }

        match tokio::time::timeout(timeout, backend.quit()).await {
            Ok(Ok(())) => info!("remote cache connection closed cleanly"),
            Ok(Err(e)) => {
                error!(error = %e, "clean close failed, forcing disconnect");
                backend.disconnect();
            }
            Err(_) => {
                error!(?timeout, "clean close timed out, forcing disconnect");
                backend.disconnect();
            }
        }
        self.monitor.on_event(crate::cache::ConnectionEvent::End);
    }
}
