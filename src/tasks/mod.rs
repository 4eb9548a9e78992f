//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Local cleanup: sweeps expired entries from the in-process tier
//! - Reconnect: drives bounded reconnection of the remote tier with backoff

mod cleanup;
mod reconnect;

pub use cleanup::spawn_cleanup_task;
pub use reconnect::{backoff_delay, spawn_reconnect_task};
