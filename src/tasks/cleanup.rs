//! TTL Cleanup Task
//!
//! Background task that periodically sweeps expired entries from the local
//! tier. Reads already purge lazily; the sweep bounds memory held by keys
//! that are never read again.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::LocalCacheStore;

/// Spawns a background task that periodically removes expired local entries.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_cleanup_task(
    local: Arc<LocalCacheStore>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting local cache cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = local.cleanup_expired();
            if removed > 0 {
                info!("Local cache cleanup: removed {} expired entries", removed);
            } else {
                debug!("Local cache cleanup: no expired entries found");
            }
        }
    })
}
