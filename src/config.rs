//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Connection URL of the shared remote cache
    pub redis_url: String,
    /// Capacity of the in-process fallback tier (0 disables it)
    pub local_max_size: usize,
    /// TTL in seconds applied to cached responses
    pub default_ttl: u64,
    /// Seconds between reconnection checks, and the base of the backoff
    pub reconnect_interval: u64,
    /// Upper bound in seconds on the delay between failed reconnects
    pub max_reconnect_backoff: u64,
    /// Ceiling on consecutive reconnection attempts
    pub max_reconnect_attempts: u32,
    /// Remote connect timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Remote command timeout in milliseconds
    pub command_timeout_ms: u64,
    /// Seconds between sweeps of expired local entries
    pub cleanup_interval: u64,
    /// Responses with larger bodies are passed through uncached
    pub max_cached_body_bytes: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `REDIS_URL` - remote cache URL (default: redis://127.0.0.1:6379)
    /// - `LOCAL_CACHE_MAX_SIZE` - local tier capacity (default: 1000)
    /// - `DEFAULT_TTL` - response TTL in seconds (default: 300)
    /// - `RECONNECT_INTERVAL` - reconnect check period in seconds (default: 30)
    /// - `MAX_RECONNECT_BACKOFF` - cap on the reconnect backoff in seconds (default: 300)
    /// - `MAX_RECONNECT_ATTEMPTS` - reconnect ceiling (default: 10)
    /// - `CONNECT_TIMEOUT_MS` - connect timeout (default: 5000)
    /// - `COMMAND_TIMEOUT_MS` - per-command timeout (default: 2000)
    /// - `CLEANUP_INTERVAL` - local sweep period in seconds (default: 60)
    /// - `MAX_CACHED_BODY_BYTES` - largest cacheable body (default: 1 MiB)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT", defaults.server_port),
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            local_max_size: parse_var("LOCAL_CACHE_MAX_SIZE", defaults.local_max_size),
            default_ttl: parse_var("DEFAULT_TTL", defaults.default_ttl),
            reconnect_interval: parse_var("RECONNECT_INTERVAL", defaults.reconnect_interval),
            max_reconnect_backoff: parse_var(
                "MAX_RECONNECT_BACKOFF",
                defaults.max_reconnect_backoff,
            ),
            max_reconnect_attempts: parse_var(
                "MAX_RECONNECT_ATTEMPTS",
                defaults.max_reconnect_attempts,
            ),
            connect_timeout_ms: parse_var("CONNECT_TIMEOUT_MS", defaults.connect_timeout_ms),
            command_timeout_ms: parse_var("COMMAND_TIMEOUT_MS", defaults.command_timeout_ms),
            cleanup_interval: parse_var("CLEANUP_INTERVAL", defaults.cleanup_interval),
            max_cached_body_bytes: parse_var(
                "MAX_CACHED_BODY_BYTES",
                defaults.max_cached_body_bytes,
            ),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            local_max_size: 1000,
            default_ttl: 300,
            reconnect_interval: 30,
            max_reconnect_backoff: 300,
            max_reconnect_attempts: 10,
            connect_timeout_ms: 5000,
            command_timeout_ms: 2000,
            cleanup_interval: 60,
            max_cached_body_bytes: 1024 * 1024,
        }
    }
}
