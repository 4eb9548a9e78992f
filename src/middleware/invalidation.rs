//! Pattern invalidation after successful mutations.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use futures::future::join_all;
use tracing::{debug, info};

use crate::cache::RemoteCacheClient;
use crate::middleware::X_CACHE_INVALIDATED;

#[derive(Debug, Clone)]
pub struct Invalidation {
    client: RemoteCacheClient,
    patterns: Arc<Vec<String>>,
}

impl Invalidation {
    pub fn new<I, S>(client: RemoteCacheClient, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            client,
            patterns: Arc::new(patterns.into_iter().map(Into::into).collect()),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

fn is_mutating(method: &Method) -> bool {
    [Method::POST, Method::PUT, Method::PATCH, Method::DELETE].contains(method)
}

/// Drops cached entries matching the configured patterns once a mutating
/// handler has succeeded.
///
/// The handler's response is returned untouched apart from the
/// `X-Cache-Invalidated` header; the deletes run in a detached task.
pub async fn invalidate(
    State(state): State<Invalidation>,
    request: Request,
    next: Next,
) -> Response {
    if !is_mutating(request.method()) || state.patterns.is_empty() {
        return next.run(request).await;
    }

    let mut response = next.run(request).await;
    if !response.status().is_success() {
        debug!(status = %response.status(), "mutation failed, cache left intact");
        return response;
    }

    let client = state.client.clone();
    let patterns = Arc::clone(&state.patterns);
    tokio::spawn(async move {
        let removed = join_all(patterns.iter().map(|p| client.delete_by_pattern(p))).await;
        for (pattern, count) in patterns.iter().zip(removed) {
            info!(pattern = %pattern, removed = count, "cache invalidated");
        }
    });

    if let Ok(value) = HeaderValue::from_str(&state.patterns.join(",")) {
        response
            .headers_mut()
            .insert(X_CACHE_INVALIDATED.clone(), value);
    }
    response
}
