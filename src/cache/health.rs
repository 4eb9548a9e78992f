//! Connection Health Module
//!
//! Tracks the lifecycle of the remote connection and owns the bounded
//! reconnection procedure.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::RemoteBackend;
use crate::error::CacheError;

// == Connection State ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

// == Connection Event ==
/// Lifecycle events of the underlying connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Socket established, not yet usable
    Connect,
    /// Connection usable
    Ready,
    /// A connection-level failure
    Error(String),
    /// Connection closed
    End,
}

// == Connection Health ==
/// Health counters exposed for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionHealth {
    pub is_connected: bool,
    pub last_connected: Option<DateTime<Utc>>,
    pub reconnect_attempts: u32,
    pub max_reconnect_attempts: u32,
}

/// Point-in-time view of the monitor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    #[serde(flatten)]
    pub health: ConnectionHealth,
    pub state: ConnectionState,
    pub last_error: Option<String>,
    pub backend: &'static str,
}

#[derive(Debug)]
struct MonitorState {
    state: ConnectionState,
    health: ConnectionHealth,
    last_error: Option<String>,
}

// == Connection Health Monitor ==
/// State machine over the remote connection.
///
/// Event handling only records state; it never starts a reconnect. Retrying
/// is driven from outside through [`ConnectionHealthMonitor::try_reconnect`],
/// so the caller owns the retry cadence.
pub struct ConnectionHealthMonitor {
    backend: Arc<dyn RemoteBackend>,
    state: Mutex<MonitorState>,
}

impl std::fmt::Debug for ConnectionHealthMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHealthMonitor")
            .field("backend", &self.backend.name())
            .field("state", &*self.state.lock())
            .finish()
    }
}

impl ConnectionHealthMonitor {
    pub fn new(backend: Arc<dyn RemoteBackend>, max_reconnect_attempts: u32) -> Self {
        Self {
            backend,
            state: Mutex::new(MonitorState {
                state: ConnectionState::Disconnected,
                health: ConnectionHealth {
                    is_connected: false,
                    last_connected: None,
                    reconnect_attempts: 0,
                    max_reconnect_attempts,
                },
                last_error: None,
            }),
        }
    }

    pub fn backend(&self) -> &dyn RemoteBackend {
        self.backend.as_ref()
    }

    // == Events ==
    /// Applies one lifecycle event.
    pub fn on_event(&self, event: ConnectionEvent) {
        let mut guard = self.state.lock();
        match event {
            ConnectionEvent::Connect => {
                guard.state = ConnectionState::Connecting;
                debug!(backend = self.backend.name(), "remote cache socket established");
            }
            ConnectionEvent::Ready => {
                guard.state = ConnectionState::Connected;
                guard.health.is_connected = true;
                guard.health.last_connected = Some(Utc::now());
                guard.health.reconnect_attempts = 0;
                guard.last_error = None;
                info!(backend = self.backend.name(), "remote cache connection ready");
            }
            ConnectionEvent::Error(message) => {
                guard.state = ConnectionState::Error;
                guard.health.is_connected = false;
                warn!(backend = self.backend.name(), error = %message, "remote cache error");
                guard.last_error = Some(message);
            }
            ConnectionEvent::End => {
                guard.state = ConnectionState::Disconnected;
                guard.health.is_connected = false;
                warn!(backend = self.backend.name(), "remote cache connection closed");
            }
        }
    }

    /// Feeds a failed remote command back into the state machine.
    ///
    /// Only connection-level failures change state. A reply error for one
    /// command leaves the connection marked healthy.
    pub fn record_failure(&self, err: &CacheError) {
        if err.is_disconnect() {
            self.on_event(ConnectionEvent::End);
        } else if err.is_connection_level() {
            self.on_event(ConnectionEvent::Error(err.to_string()));
        } else {
            debug!(
                backend = self.backend.name(),
                error = %err,
                "remote command rejected, connection kept"
            );
        }
    }

    // == Connect ==
    /// Opens the backend connection, emitting `Connect` then `Ready` on
    /// success or `Error` on failure.
    pub async fn connect(&self) -> bool {
        match self.backend.connect().await {
            Ok(()) => {
                self.on_event(ConnectionEvent::Connect);
                self.on_event(ConnectionEvent::Ready);
                true
            }
            Err(e) => {
                self.on_event(ConnectionEvent::Error(e.to_string()));
                false
            }
        }
    }

    // == Try Reconnect ==
    /// One bounded reconnection attempt.
    ///
    /// Returns true immediately when already connected, and false without
    /// touching the backend once the attempt ceiling is reached.
    pub async fn try_reconnect(&self) -> bool {
        {
            let mut guard = self.state.lock();
            if guard.health.is_connected {
                return true;
            }
            if guard.health.reconnect_attempts >= guard.health.max_reconnect_attempts {
                debug!(
                    attempts = guard.health.reconnect_attempts,
                    "reconnect ceiling reached, not retrying"
                );
                return false;
            }
            guard.health.reconnect_attempts += 1;
            info!(
                attempt = guard.health.reconnect_attempts,
                max = guard.health.max_reconnect_attempts,
                "attempting remote cache reconnect"
            );
        }

        if !self.backend.is_open() && !self.connect().await {
            return false;
        }

        match self.backend.ping().await {
            Ok(()) => {
                if !self.is_connected() {
                    self.on_event(ConnectionEvent::Ready);
                }
                true
            }
            Err(e) => {
                self.record_failure(&e);
                false
            }
        }
    }

    /// Clears the attempt counter so an exhausted sequence can start over.
    pub fn reset_attempts(&self) {
        self.state.lock().health.reconnect_attempts = 0;
    }

    // == Accessors ==
    pub fn is_connected(&self) -> bool {
        self.state.lock().health.is_connected
    }

    pub fn state(&self) -> ConnectionState {
        self.state.lock().state
    }

    pub fn health(&self) -> ConnectionHealth {
        self.state.lock().health.clone()
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        let guard = self.state.lock();
        HealthSnapshot {
            health: guard.health.clone(),
            state: guard.state,
            last_error: guard.last_error.clone(),
            backend: self.backend.name(),
        }
    }
}
