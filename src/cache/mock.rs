//! In-memory stand-in for the remote service, used by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::cache::{GlobPattern, RemoteBackend};
use crate::error::{CacheError, CacheResult};

/// Remote backend whose reachability can be flipped at runtime.
#[derive(Debug, Default)]
pub struct MockBackend {
    data: Mutex<HashMap<String, (String, Instant)>>,
    open: AtomicBool,
    reachable: AtomicBool,
    poisoned: Mutex<HashSet<String>>,
    pub connect_calls: AtomicU32,
    pub ping_calls: AtomicU32,
}

impl MockBackend {
    pub fn online() -> Self {
        let backend = Self::default();
        backend.reachable.store(true, Ordering::SeqCst);
        backend
    }

    pub fn offline() -> Self {
        Self::default()
    }

    /// Simulates the server going away: the socket drops and further
    /// connects fail.
    pub fn go_down(&self) {
        self.reachable.store(false, Ordering::SeqCst);
        self.open.store(false, Ordering::SeqCst);
    }

    /// The server stops answering while the client still holds a socket.
    pub fn sever(&self) {
        self.reachable.store(false, Ordering::SeqCst);
    }

    pub fn come_back(&self) {
        self.reachable.store(true, Ordering::SeqCst);
    }

    /// Makes every command on `key` fail with a reply error, the way Redis
    /// answers WRONGTYPE, while the connection stays up.
    pub fn poison(&self, key: &str) {
        self.poisoned.lock().insert(key.to_string());
    }

    pub fn raw_get(&self, key: &str) -> Option<String> {
        self.data.lock().get(key).map(|(v, _)| v.clone())
    }

    fn check(&self) -> CacheResult<()> {
        if self.open.load(Ordering::SeqCst) && self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CacheError::Disconnected("mock connection closed".to_string()))
        }
    }

    fn check_key(&self, key: &str) -> CacheResult<()> {
        self.check()?;
        if self.poisoned.lock().contains(key) {
            return Err(CacheError::Backend(format!(
                "WRONGTYPE Operation against a key holding the wrong kind of value: {}",
                key
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteBackend for MockBackend {
    async fn connect(&self) -> CacheResult<()> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if self.reachable.load(Ordering::SeqCst) {
            self.open.store(true, Ordering::SeqCst);
            Ok(())
        } else {
            Err(CacheError::Connection("mock refused".to_string()))
        }
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn ping(&self) -> CacheResult<()> {
        self.ping_calls.fetch_add(1, Ordering::SeqCst);
        self.check()
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.check_key(key)?;
        let mut data = self.data.lock();
        let expired = match data.get(key) {
            Some((value, deadline)) if Instant::now() < *deadline => {
                return Ok(Some(value.clone()))
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            data.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.check_key(key)?;
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
        "mock"
    }
}
