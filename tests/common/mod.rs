//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::{body::Body, http::Request, response::Response, Router};
use parking_lot::Mutex;
use serde_json::Value;
use tower::ServiceExt;

use response_cache::cache::GlobPattern;
use response_cache::error::{CacheError, CacheResult};
use response_cache::{
    create_router, AppState, Config, ConnectionHealthMonitor, LocalCacheStore, RemoteBackend,
    RemoteCacheClient,
};

// == Fake Remote ==
/// In-memory remote tier that can be taken down and brought back.
#[derive(Debug, Default)]
pub struct FakeRemote {
    data: Mutex<HashMap<String, (String, Instant)>>,
    open: AtomicBool,
    up: AtomicBool,
    reject_pattern_deletes: AtomicBool,
}

impl FakeRemote {
    pub fn up() -> Arc<Self> {
        let remote = Self::default();
        remote.up.store(true, Ordering::SeqCst);
        Arc::new(remote)
    }

    pub fn down() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn crash(&self) {
        self.up.store(false, Ordering::SeqCst);
        self.open.store(false, Ordering::SeqCst);
    }

    pub fn restart(&self) {
        self.up.store(true, Ordering::SeqCst);
    }

    /// Makes every later pattern delete fail with a server-side error reply.
    pub fn reject_pattern_deletes(&self) {
        self.reject_pattern_deletes.store(true, Ordering::SeqCst);
    }

    pub fn keys(&self) -> Vec<String> {
        self.data.lock().keys().cloned().collect()
    }

    fn check(&self) -> CacheResult<()> {
        if self.open.load(Ordering::SeqCst) && self.up.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CacheError::Disconnected("fake remote down".to_string()))
        }
    }
}

#[async_trait]
impl RemoteBackend for FakeRemote {
    async fn connect(&self) -> CacheResult<()> {
        if self.up.load(Ordering::SeqCst) {
            self.open.store(true, Ordering::SeqCst);
            Ok(())
        } else {
            Err(CacheError::Connection("connection refused".to_string()))
        }
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn ping(&self) -> CacheResult<()> {
        self.check()
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.check()?;
        let data = self.data.lock();
        Ok(data
            .get(key)
            .filter(|(_, deadline)| Instant::now() < *deadline)
            .map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.check()?;
        self.data
            .lock()
            .insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.check()?;
        self.data.lock().remove(key);
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> CacheResult<u64> {
        self.check()?;
        if self.reject_pattern_deletes.load(Ordering::SeqCst) {
            return Err(CacheError::Backend("ERR SCAN rejected".to_string()));
        }
        let glob = GlobPattern::new(pattern);
        let mut data = self.data.lock();
        let before = data.len();
        data.retain(|key, _| !glob.matches(key));
        Ok((before - data.len()) as u64)
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    async fn quit(&self) -> CacheResult<()> {
        self.check()?;
        self.open.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn disconnect(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

// == Test App ==
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub remote: Arc<FakeRemote>,
}

impl TestApp {
    pub async fn new(remote: Arc<FakeRemote>, config: Config) -> Self {
        let monitor = Arc::new(ConnectionHealthMonitor::new(
            remote.clone(),
            config.max_reconnect_attempts,
        ));
        monitor.connect().await;
        let local = Arc::new(LocalCacheStore::new(config.local_max_size));
        let state = AppState::new(RemoteCacheClient::new(monitor, local), config);
        Self {
            app: create_router(state.clone()),
            state,
            remote,
        }
    }

    pub async fn online() -> Self {
        Self::new(FakeRemote::up(), Config::default()).await
    }

    pub async fn offline() -> Self {
        Self::new(FakeRemote::down(), Config::default()).await
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn send_json(&self, method: &str, uri: &str, body: Value) -> Response {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }
}

/// Lets detached cache writes and invalidations land.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

pub async fn body_to_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn x_cache(response: &Response) -> &str {
    response
        .headers()
        .get("x-cache")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}
