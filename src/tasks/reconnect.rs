//! Reconnect Task
//!
//! Periodically asks the health monitor to restore the remote connection.
//! The monitor enforces the attempt ceiling; this task owns the cadence,
//! backing off exponentially while attempts keep failing.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::ConnectionHealthMonitor;

/// Largest doubling exponent applied to the base interval.
const MAX_BACKOFF_EXPONENT: u32 = 16;

/// Delay before the next check after `failures` consecutive failed attempts:
/// `base * 2^failures`, never above `max` and never below `base`.
pub fn backoff_delay(base: Duration, failures: u32, max: Duration) -> Duration {
    let factor = 1u32 << failures.min(MAX_BACKOFF_EXPONENT);
    base.saturating_mul(factor).min(max.max(base))
}

/// Spawns the periodic reconnection check.
///
/// A healthy connection is checked every `interval_secs`. After a failed
/// attempt the wait doubles per failure, capped at `max_backoff_secs`.
pub fn spawn_reconnect_task(
    monitor: Arc<ConnectionHealthMonitor>,
    interval_secs: u64,
    max_backoff_secs: u64,
) -> JoinHandle<()> {
    let base = Duration::from_secs(interval_secs.max(1));
    let max = Duration::from_secs(max_backoff_secs);

    tokio::spawn(async move {
        info!(
            "Starting remote cache reconnect task with interval of {} seconds",
            base.as_secs()
        );

        let mut delay = base;
        let mut exhausted_logged = false;
        loop {
            tokio::time::sleep(delay).await;

            if monitor.is_connected() {
                exhausted_logged = false;
                delay = base;
                continue;
            }

            if monitor.try_reconnect().await {
                info!("Remote cache reconnected");
                exhausted_logged = false;
                delay = base;
                continue;
            }

            let health = monitor.health();
            delay = backoff_delay(base, health.reconnect_attempts, max);
            if health.reconnect_attempts >= health.max_reconnect_attempts {
                if !exhausted_logged {
                    warn!(
                        attempts = health.reconnect_attempts,
                        "Remote cache reconnect attempts exhausted, serving from local tier"
                    );
                    exhausted_logged = true;
                }
            } else {
                debug!(
                    attempts = health.reconnect_attempts,
                    next_in = ?delay,
                    "Remote cache still unreachable"
                );
            }
        }
    })
}
