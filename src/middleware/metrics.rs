//! Request metrics and response timing.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};

use crate::metrics::MetricsCollector;
use crate::middleware::{CacheOutcome, X_RESPONSE_TIME};

/// Route bucket for requests that matched no route.
pub const UNMATCHED_ROUTE: &str = "<unmatched>";

/// Wraps every request: stamps `X-Response-Time` and records the status
/// and cache outcome with the collector.
///
/// Routes are keyed by the matched route template (`/api/builds/:id`), so
/// the number of tracked routes is bounded by the router, not by traffic.
pub async fn track_metrics(
    State(metrics): State<Arc<MetricsCollector>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str())
        .unwrap_or(UNMATCHED_ROUTE);
    let route = MetricsCollector::route_key(request.method().as_str(), path);
    let start = Instant::now();

    let mut response = next.run(request).await;

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    if let Ok(value) = HeaderValue::from_str(&format!("{:.2}ms", elapsed_ms)) {
        response.headers_mut().insert(X_RESPONSE_TIME.clone(), value);
    }

    let outcome = response.extensions().get::<CacheOutcome>().copied();
    metrics.record(&route, response.status().as_u16(), outcome);
    response
}
