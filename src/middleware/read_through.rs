//! Read-through response caching for GET routes.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{OriginalUri, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::stream;
use tracing::{debug, error, warn};

use crate::cache::{CachedResponse, RemoteCacheClient};
use crate::middleware::{CacheOutcome, X_CACHE, X_CACHE_KEY};

pub type KeyFn = Arc<dyn Fn(&Request) -> String + Send + Sync>;
pub type BypassFn = Arc<dyn Fn(&Request) -> bool + Send + Sync>;

// == Bypass ==
/// Per-request opt-out of caching.
#[derive(Clone)]
pub enum Bypass {
    Never,
    Always,
    When(BypassFn),
}

impl Bypass {
    pub fn when<F>(f: F) -> Self
    where
        F: Fn(&Request) -> bool + Send + Sync + 'static,
    {
        Bypass::When(Arc::new(f))
    }

    /// Bypasses requests carrying `nocache=true` in the query string.
    pub fn nocache_query() -> Self {
        Bypass::when(|request| {
            request
                .uri()
                .query()
                .map(|q| q.split('&').any(|pair| pair == "nocache=true"))
                .unwrap_or(false)
        })
    }

    fn applies(&self, request: &Request) -> bool {
        match self {
            Bypass::Never => false,
            Bypass::Always => true,
            Bypass::When(f) => f(request),
        }
    }
}

impl std::fmt::Debug for Bypass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Bypass::Never => f.write_str("Never"),
            Bypass::Always => f.write_str("Always"),
            Bypass::When(_) => f.write_str("When(..)"),
        }
    }
}

/// Default cache key: the request URL as the client sent it (path and
/// query), unaffected by router nesting.
pub fn default_cache_key(request: &Request) -> String {
    let uri = request
        .extensions()
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or_else(|| request.uri());
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

// == Cache Policy ==
/// Configuration of one read-through middleware instance.
#[derive(Clone)]
pub struct CachePolicy {
    pub ttl_seconds: u64,
    key_fn: KeyFn,
    bypass: Bypass,
}

impl CachePolicy {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            ttl_seconds,
            key_fn: Arc::new(default_cache_key),
            bypass: Bypass::Never,
        }
    }

    pub fn with_key_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Request) -> String + Send + Sync + 'static,
    {
        self.key_fn = Arc::new(f);
        self
    }

    pub fn with_bypass(mut self, bypass: Bypass) -> Self {
        self.bypass = bypass;
        self
    }

    pub fn key_for(&self, request: &Request) -> String {
        (self.key_fn)(request)
    }
}

impl std::fmt::Debug for CachePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachePolicy")
            .field("ttl_seconds", &self.ttl_seconds)
            .field("bypass", &self.bypass)
            .finish_non_exhaustive()
    }
}

// == Read Through State ==
#[derive(Debug, Clone)]
pub struct ReadThrough {
    client: RemoteCacheClient,
    policy: CachePolicy,
    max_body_bytes: usize,
}

impl ReadThrough {
    pub fn new(client: RemoteCacheClient, policy: CachePolicy, max_body_bytes: usize) -> Self {
        Self {
            client,
            policy,
            max_body_bytes,
        }
    }
}

fn tag(response: &mut Response, outcome: CacheOutcome, key: Option<&str>) {
    response
        .headers_mut()
        .insert(X_CACHE.clone(), outcome.header_value());
    if let Some(value) = key.and_then(|k| HeaderValue::from_str(k).ok()) {
        response.headers_mut().insert(X_CACHE_KEY.clone(), value);
    }
    response.extensions_mut().insert(outcome);
}

fn replay(cached: CachedResponse) -> Response {
    let status = StatusCode::from_u16(cached.status).unwrap_or(StatusCode::OK);
    let mut response = (status, cached.body).into_response();
    if let Some(value) = cached
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
    {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    response
}

// == Middleware ==
/// Serves cached GET responses and captures successful ones on a miss.
///
/// A hit never reaches the handler. Storing after a miss happens in a
/// detached task, so the client response never waits on the cache.
pub async fn read_through(
    State(state): State<ReadThrough>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    if state.policy.bypass.applies(&request) {
        let mut response = next.run(request).await;
        tag(&mut response, CacheOutcome::Bypass, None);
        return response;
    }

    if !state.client.is_available() {
        warn!("cache layer unavailable, serving uncached");
        let mut response = next.run(request).await;
        tag(&mut response, CacheOutcome::Unavailable, None);
        return response;
    }

    let key = state.policy.key_for(&request);

    let outcome = match state.client.get(&key).await {
        Some(raw) => match CachedResponse::decode(&raw) {
            Ok(cached) => {
                debug!(key = %key, "cache hit");
                let mut response = replay(cached);
                tag(&mut response, CacheOutcome::Hit, Some(&key));
                return response;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "unreadable cached value, treating as miss");
                CacheOutcome::Error
            }
        },
        None => CacheOutcome::Miss,
    };

    let response = next.run(request).await;
    let mut response = capture(&state, &key, response).await;
    tag(&mut response, outcome, Some(&key));
    response
}

/// Buffers a successful response body and schedules it for storage.
async fn capture(state: &ReadThrough, key: &str, response: Response) -> Response {
    if !response.status().is_success() {
        return response;
    }

    let declared_len = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared_len.is_some_and(|len| len > state.max_body_bytes) {
        debug!(key = %key, "response too large to cache");
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            // Hand the failure on to the client as the handler's own body
            // would have, under the handler's status.
            error!(key = %key, error = %e, "failed to read handler response body, not caching");
            parts.headers.remove(header::CONTENT_LENGTH);
            let failed = stream::once(async move { Err::<Bytes, _>(e) });
            return Response::from_parts(parts, Body::from_stream(failed));
        }
    };

    if bytes.len() <= state.max_body_bytes {
        match std::str::from_utf8(&bytes) {
            Ok(text) => {
                let cached = CachedResponse {
                    status: parts.status.as_u16(),
                    content_type: parts
                        .headers
                        .get(header::CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string),
                    body: text.to_string(),
                };
                store(state, key, cached);
            }
            Err(_) => debug!(key = %key, "non UTF-8 body, not cached"),
        }
    }

    Response::from_parts(parts, Body::from(bytes))
}

fn store(state: &ReadThrough, key: &str, cached: CachedResponse) {
    let encoded = match cached.encode() {
        Ok(encoded) => encoded,
        Err(e) => {
            warn!(key = %key, error = %e, "failed to encode response for cache");
            return;
        }
    };

    let client = state.client.clone();
    let key = key.to_string();
    let ttl = state.policy.ttl_seconds;
    tokio::spawn(async move {
        client.set(&key, &encoded, ttl).await;
    });
}
