//! API Routes
//!
//! Configures the Axum router: cache administration endpoints plus the
//! content collections wrapped in read-through caching and invalidation.

use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Extension, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::content::{create_item, delete_item, get_item, list_items, replace_item, Collection};
use super::handlers::{
    cache_health_handler, health_handler, metrics_handler, reconnect_handler,
    reset_metrics_handler, AppState,
};
use crate::middleware::{
    invalidate, read_through, track_metrics, Bypass, CachePolicy, Invalidation, ReadThrough,
};

/// Routes of one content collection, with its cache middleware.
///
/// GETs are cached under the request URL; successful mutations drop every
/// key under the collection's base path.
fn collection_router(state: &AppState, collection: Collection) -> Router<AppState> {
    let base = collection.base_path();
    let policy = CachePolicy::new(state.config.default_ttl).with_bypass(Bypass::nocache_query());
    let cache = ReadThrough::new(
        state.client.clone(),
        policy,
        state.config.max_cached_body_bytes,
    );
    let invalidation = Invalidation::new(
        state.client.clone(),
        [collection.invalidation_pattern()],
    );

    Router::new()
        .route(&base, get(list_items).post(create_item))
        .route(
            &format!("{}/:id", base),
            get(get_item).put(replace_item).delete(delete_item),
        )
        .route_layer(from_fn_with_state(invalidation, invalidate))
        .route_layer(from_fn_with_state(cache, read_through))
        .route_layer(Extension(collection))
}

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/cache/metrics` - Metrics snapshot
/// - `POST /api/cache/metrics/reset` - Zero the metrics
/// - `GET /api/cache/health` - Connection and local tier diagnostics
/// - `POST /api/cache/reconnect` - Manual reconnect
/// - `GET /health` - Liveness with cache availability
/// - `/api/{builds,dictionary,tier-lists}` and `/:id` - Content CRUD
///
/// # Middleware
/// - Metrics: wraps every request (innermost of the global layers)
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/api/cache/metrics", get(metrics_handler))
        .route("/api/cache/metrics/reset", post(reset_metrics_handler))
        .route("/api/cache/health", get(cache_health_handler))
        .route("/api/cache/reconnect", post(reconnect_handler))
        .route("/health", get(health_handler));

    for collection in Collection::ALL {
        router = router.merge(collection_router(&state, collection));
    }

    let metrics = Arc::clone(&state.metrics);
    router
        .layer(from_fn_with_state(metrics, track_metrics))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
