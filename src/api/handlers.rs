//! API Handlers
//!
//! Shared application state and the cache administration endpoints.

use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Utc;
use tracing::info;

use crate::api::ContentStore;
use crate::cache::{ConnectionHealthMonitor, LocalCacheStore, RedisBackend, RemoteCacheClient};
use crate::config::Config;
use crate::error::CacheResult;
use crate::metrics::{MetricsCollector, MetricsSnapshot};
use crate::models::{
    CacheAvailability, CacheHealthResponse, HealthResponse, ReconnectResponse, ResetResponse,
};

/// Application state shared across all handlers.
///
/// Every shared singleton is built once at startup and handed out by `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Two-tier cache client
    pub client: RemoteCacheClient,
    /// Process-wide request metrics
    pub metrics: Arc<MetricsCollector>,
    /// Content collections behind the cache
    pub content: Arc<ContentStore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates a new AppState around an existing cache client.
    pub fn new(client: RemoteCacheClient, config: Config) -> Self {
        Self {
            client,
            metrics: Arc::new(MetricsCollector::new()),
            content: Arc::new(ContentStore::new()),
            config: Arc::new(config),
        }
    }

    /// Creates a new AppState from configuration, backed by Redis.
    ///
    /// Only builds the client; the caller decides when to connect.
    pub fn from_config(config: &Config) -> CacheResult<Self> {
        let backend = RedisBackend::new(
            &config.redis_url,
            config.connect_timeout(),
            config.command_timeout(),
        )?;
        let monitor = Arc::new(ConnectionHealthMonitor::new(
            Arc::new(backend),
            config.max_reconnect_attempts,
        ));
        let local = Arc::new(LocalCacheStore::new(config.local_max_size));
        Ok(Self::new(
            RemoteCacheClient::new(monitor, local),
            config.clone(),
        ))
    }

    fn availability(&self) -> CacheAvailability {
        CacheAvailability {
            available: self.client.is_available(),
            remote_connected: self.client.monitor().is_connected(),
            local_enabled: self.client.local().is_enabled(),
        }
    }
}

/// Handler for GET /api/cache/metrics
pub async fn metrics_handler(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

/// Handler for POST /api/cache/metrics/reset
pub async fn reset_metrics_handler(State(state): State<AppState>) -> Json<ResetResponse> {
    let stamp = state.metrics.reset();
    info!("cache metrics reset");
    Json(ResetResponse::new(stamp))
}

/// Handler for GET /api/cache/health
pub async fn cache_health_handler(State(state): State<AppState>) -> Json<CacheHealthResponse> {
    Json(CacheHealthResponse {
        available: state.client.is_available(),
        remote: state.client.monitor().snapshot(),
        local: state.client.local().stats(),
        timestamp: Utc::now(),
    })
}

/// Handler for POST /api/cache/reconnect
///
/// Restarts an exhausted reconnect sequence and makes one attempt now.
pub async fn reconnect_handler(State(state): State<AppState>) -> Json<ReconnectResponse> {
    let monitor = state.client.monitor();
    monitor.reset_attempts();
    let connected = monitor.try_reconnect().await;
    info!(connected, "manual remote cache reconnect");

    Json(ReconnectResponse {
        connected,
        health: monitor.health(),
    })
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::new(state.availability()))
}
