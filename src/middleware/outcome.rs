//! Per-request cache outcome shared between middleware stages.

use axum::http::{HeaderName, HeaderValue};

pub static X_CACHE: HeaderName = HeaderName::from_static("x-cache");
pub static X_CACHE_KEY: HeaderName = HeaderName::from_static("x-cache-key");
pub static X_CACHE_INVALIDATED: HeaderName = HeaderName::from_static("x-cache-invalidated");
pub static X_RESPONSE_TIME: HeaderName = HeaderName::from_static("x-response-time");

/// What the read-through stage did with a request.
///
/// Travels in the response extensions so the metrics stage can count it
/// without parsing headers; the `X-Cache` header carries the same value for
/// external observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
    Bypass,
    Error,
    Unavailable,
}

impl CacheOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheOutcome::Hit => "HIT",
            CacheOutcome::Miss => "MISS",
            CacheOutcome::Bypass => "BYPASS",
            CacheOutcome::Error => "ERROR",
            CacheOutcome::Unavailable => "UNAVAILABLE",
        }
    }

    pub fn header_value(&self) -> HeaderValue {
        HeaderValue::from_static(self.as_str())
    }
}

impl std::fmt::Display for CacheOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
