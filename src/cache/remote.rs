//! Remote Backend Module
//!
//! Abstraction over the shared cache service plus the Redis implementation.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::debug;

use crate::error::{CacheError, CacheResult};

/// Operations the cache client needs from the shared cache service.
///
/// Implementations report failures as [`CacheError`]; deciding whether to
/// degrade is left to the caller.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Opens (or reopens) the connection.
    async fn connect(&self) -> CacheResult<()>;

    /// Whether a connection object is currently held.
    fn is_open(&self) -> bool;

    /// Round-trip liveness check.
    async fn ping(&self) -> CacheResult<()>;

    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Deletes all keys matching a glob. Returns how many were removed.
    async fn delete_pattern(&self, pattern: &str) -> CacheResult<u64>;

    async fn exists(&self, key: &str) -> CacheResult<bool>;

    /// Clean close: lets in-flight commands finish, then closes.
    async fn quit(&self) -> CacheResult<()>;

    /// Forced close, dropping the connection immediately.
    fn disconnect(&self);

    fn name(&self) -> &'static str;
}

// == Redis Backend ==
/// Redis-backed implementation using a multiplexed async connection.
///
/// The connection is opened lazily by [`RemoteBackend::connect`]. Any command
/// failing with an IO or connection-drop error discards the connection so
/// that `is_open` reports false until the next successful connect.
pub struct RedisBackend {
    client: redis::Client,
    connection: RwLock<Option<MultiplexedConnection>>,
    connect_timeout: Duration,
    command_timeout: Duration,
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend")
            .field("open", &self.is_open())
            .field("connect_timeout", &self.connect_timeout)
            .field("command_timeout", &self.command_timeout)
            .finish_non_exhaustive()
    }
}

impl RedisBackend {
    /// Creates a backend for `url` without connecting.
    pub fn new(url: &str, connect_timeout: Duration, command_timeout: Duration) -> CacheResult<Self> {
        let client = redis::Client::open(url).map_err(|e| {
            CacheError::Connection(format!("Invalid Redis URL {}: {}", redact_url(url), e))
        })?;

        Ok(Self {
            client,
            connection: RwLock::new(None),
            connect_timeout,
            command_timeout,
        })
    }

    fn connection(&self) -> CacheResult<MultiplexedConnection> {
        self.connection
            .read()
            .clone()
            .ok_or_else(|| CacheError::Disconnected("Redis connection is not open".to_string()))
    }

    /// Runs one command under the command timeout, dropping the connection
    /// when the failure means it is gone.
    async fn run<T, F>(&self, op: &str, fut: F) -> CacheResult<T>
    where
        T: Send,
        F: Future<Output = redis::RedisResult<T>> + Send,
    {
        let result = match tokio::time::timeout(self.command_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(CacheError::from(e)),
            Err(_) => Err(CacheError::Timeout(format!(
                "Redis {} exceeded {:?}",
                op, self.command_timeout
            ))),
        };

        if let Err(CacheError::Disconnected(_)) = &result {
            self.connection.write().take();
        }
        result
    }
}

#[async_trait]
impl RemoteBackend for RedisBackend {
    async fn connect(&self) -> CacheResult<()> {
        let conn = tokio::time::timeout(
            self.connect_timeout,
            self.client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| {
            CacheError::Timeout(format!("Redis connect exceeded {:?}", self.connect_timeout))
        })?
        .map_err(|e| CacheError::Connection(format!("Failed to connect to Redis: {}", e)))?;

        *self.connection.write() = Some(conn);
        debug!("Redis connection opened");
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.connection.read().is_some()
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.connection()?;
        let pong: String = self
            .run("PING", async move { redis::cmd("PING").query_async(&mut conn).await })
            .await?;

        if pong == "PONG" {
            Ok(())
        } else {
            Err(CacheError::Backend(format!("Unexpected PING reply: {}", pong)))
        }
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.connection()?;
        self.run("GET", async move { conn.get(key).await }).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.connection()?;
        let ttl_seconds = ttl.as_secs().max(1);
        self.run("SETEX", async move { conn.set_ex(key, value, ttl_seconds).await })
            .await
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.connection()?;
        self.run("DEL", async move { conn.del(key).await }).await
    }

    async fn delete_pattern(&self, pattern: &str) -> CacheResult<u64> {
        let match_arg = scan_match_pattern(pattern);
        let match_arg = match_arg.as_str();
        let mut deleted: u64 = 0;
        let mut cursor: u64 = 0;

        // SCAN keeps the server responsive where KEYS would block it.
        loop {
            let mut conn = self.connection()?;
            let (next_cursor, keys): (u64, Vec<String>) = self
                .run("SCAN", async move {
                    redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(match_arg)
                        .arg("COUNT")
                        .arg(100)
                        .query_async(&mut conn)
                        .await
                })
                .await?;

            if !keys.is_empty() {
                let mut conn = self.connection()?;
                let count: u64 = self
                    .run("DEL", async move { conn.del(&keys).await })
                    .await?;
                deleted += count;
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        debug!(pattern = pattern, deleted = deleted, "Redis pattern DEL");
        Ok(deleted)
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.connection()?;
        self.run("EXISTS", async move { conn.exists(key).await }).await
    }

    async fn quit(&self) -> CacheResult<()> {
        let mut conn = self.connection()?;
        let result: CacheResult<()> = self
            .run("QUIT", async move { redis::cmd("QUIT").query_async(&mut conn).await })
            .await;
        self.connection.write().take();
        result
    }

    fn disconnect(&self) {
        self.connection.write().take();
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

/// Translates a `*`-only glob into a `SCAN MATCH` pattern.
///
/// Redis also treats `?`, `[`, `]` and `\` as glob syntax; they are escaped so
/// both tiers delete the same key set.
pub fn scan_match_pattern(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Redacts credentials from a Redis URL for logging.
pub fn redact_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            let prefix = &url[..=colon_pos];
            let suffix = &url[at_pos..];
            return format!("{}***{}", prefix, suffix);
        }
    }
    url.to_string()
}
