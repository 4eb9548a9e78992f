//! Integration Tests for the cached content API
//!
//! Drives the full router with `oneshot`, backed by a fake remote tier.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use tower::ServiceExt;

use common::{body_to_json, settle, x_cache, FakeRemote, TestApp};
use response_cache::api::Collection;
use response_cache::middleware::{read_through, CachePolicy, ReadThrough};
use response_cache::models::ItemPayload;
use response_cache::Config;

fn seed(app: &TestApp, collection: Collection, name: &str) -> String {
    let payload: ItemPayload = serde_json::from_value(json!({ "name": name })).unwrap();
    let item = app.state.content.create(collection, payload);
    item["id"].as_str().unwrap().to_string()
}

// == Read-through ==

#[tokio::test]
async fn test_miss_then_hit_round_trip() {
    let app = TestApp::online().await;
    let id = seed(&app, Collection::Builds, "Frost Mage");
    let uri = format!("/api/builds/{}", id);

    let first = app.get(&uri).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(x_cache(&first), "MISS");
    assert_eq!(first.headers()["x-cache-key"], uri.as_str());
    let first_body = body_to_json(first).await;

    settle().await;
    assert!(app.remote.keys().contains(&uri));

    let second = app.get(&uri).await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(x_cache(&second), "HIT");
    assert_eq!(
        second.headers()["content-type"],
        "application/json"
    );
    assert_eq!(body_to_json(second).await, first_body);
}

#[tokio::test]
async fn test_hit_does_not_run_handler() {
    let app = TestApp::online().await;
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = calls.clone();
    let router = Router::new()
        .route(
            "/api/counted",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    "payload"
                }
            }),
        )
        .layer(from_fn_with_state(
            ReadThrough::new(app.state.client.clone(), CachePolicy::new(60), 1024),
            read_through,
        ));

    let request = || Request::builder().uri("/api/counted").body(Body::empty()).unwrap();

    let first = router.clone().oneshot(request()).await.unwrap();
    assert_eq!(x_cache(&first), "MISS");
    settle().await;

    let second = router.clone().oneshot(request()).await.unwrap();
    assert_eq!(x_cache(&second), "HIT");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_entries_expire_after_ttl() {
    let config = Config {
        default_ttl: 1,
        ..Config::default()
    };
    let app = TestApp::new(FakeRemote::up(), config).await;
    seed(&app, Collection::Dictionary, "aggro");

    assert_eq!(x_cache(&app.get("/api/dictionary").await), "MISS");
    settle().await;
    assert_eq!(x_cache(&app.get("/api/dictionary").await), "HIT");

    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(x_cache(&app.get("/api/dictionary").await), "MISS");
}

#[tokio::test]
async fn test_unreadable_cached_value_is_replaced() {
    let app = TestApp::online().await;
    seed(&app, Collection::Builds, "a");
    app.state
        .client
        .local()
        .set("/api/builds", "not json".to_string(), 60);

    let response = app.get("/api/builds").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(x_cache(&response), "ERROR");
    let items = body_to_json(response).await;
    assert_eq!(items.as_array().unwrap().len(), 1);
    settle().await;

    assert_eq!(x_cache(&app.get("/api/builds").await), "HIT");
}

#[tokio::test]
async fn test_error_responses_are_not_cached() {
    let app = TestApp::online().await;

    let first = app.get("/api/builds/missing").await;
    assert_eq!(first.status(), StatusCode::NOT_FOUND);
    settle().await;

    let second = app.get("/api/builds/missing").await;
    assert_eq!(second.status(), StatusCode::NOT_FOUND);
    assert_eq!(x_cache(&second), "MISS");
    assert!(app.remote.keys().is_empty());
}

#[tokio::test]
async fn test_nocache_query_bypasses() {
    let app = TestApp::online().await;

    let response = app.get("/api/tier-lists?nocache=true").await;
    assert_eq!(x_cache(&response), "BYPASS");
    assert!(response.headers().get("x-cache-key").is_none());

    settle().await;
    assert!(app.remote.keys().is_empty());
    assert_eq!(app.state.metrics.snapshot().metrics.bypasses, 1);
}

// == Invalidation ==

#[tokio::test]
async fn test_mutation_invalidates_collection() {
    let app = TestApp::online().await;
    seed(&app, Collection::TierLists, "season 1");

    app.get("/api/tier-lists").await;
    settle().await;
    assert_eq!(x_cache(&app.get("/api/tier-lists").await), "HIT");

    let created = app
        .send_json("POST", "/api/tier-lists", json!({ "name": "season 2" }))
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    assert_eq!(created.headers()["x-cache-invalidated"], "/api/tier-lists*");
    settle().await;

    let after = app.get("/api/tier-lists").await;
    assert_eq!(x_cache(&after), "MISS");
    let items = body_to_json(after).await;
    assert_eq!(items.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_remote_invalidation_failure_still_purges_local() {
    let app = TestApp::online().await;
    seed(&app, Collection::TierLists, "season 1");

    app.get("/api/tier-lists").await;
    settle().await;
    assert!(app.state.client.local().get("/api/tier-lists").is_some());

    app.remote.reject_pattern_deletes();
    let created = app
        .send_json("POST", "/api/tier-lists", json!({ "name": "season 2" }))
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    assert_eq!(created.headers()["x-cache-invalidated"], "/api/tier-lists*");
    settle().await;

    assert!(app.state.client.local().get("/api/tier-lists").is_none());
    assert!(app.state.client.monitor().is_connected());
}

#[tokio::test]
async fn test_invalidation_is_scoped_to_collection() {
    let app = TestApp::online().await;
    seed(&app, Collection::Builds, "a");

    app.get("/api/builds").await;
    settle().await;

    app.send_json("POST", "/api/dictionary", json!({ "term": "kite" }))
        .await;
    settle().await;

    assert_eq!(x_cache(&app.get("/api/builds").await), "HIT");
}

#[tokio::test]
async fn test_failed_mutation_keeps_cache() {
    let app = TestApp::online().await;
    let id = seed(&app, Collection::Builds, "a");
    let uri = format!("/api/builds/{}", id);

    app.get(&uri).await;
    settle().await;

    let response = app
        .send_json("PUT", "/api/builds/unknown", json!({ "name": "b" }))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().get("x-cache-invalidated").is_none());
    settle().await;

    assert_eq!(x_cache(&app.get(&uri).await), "HIT");
}

// == Degradation ==

#[tokio::test]
async fn test_degraded_mode_serves_from_local_tier() {
    let app = TestApp::offline().await;
    seed(&app, Collection::Builds, "a");

    assert_eq!(x_cache(&app.get("/api/builds").await), "MISS");
    settle().await;
    assert_eq!(x_cache(&app.get("/api/builds").await), "HIT");
    assert_eq!(app.state.client.local().len(), 1);

    let health = body_to_json(app.get("/health").await).await;
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["cache"]["available"], true);
}

#[tokio::test]
async fn test_remote_crash_falls_back_without_errors() {
    let app = TestApp::online().await;
    seed(&app, Collection::Builds, "a");

    app.get("/api/builds").await;
    settle().await;
    app.remote.crash();

    let response = app.get("/api/builds").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(x_cache(&response), "HIT");
    assert!(!app.state.client.monitor().is_connected());
}

#[tokio::test]
async fn test_unavailable_when_no_tier_can_serve() {
    let config = Config {
        local_max_size: 0,
        ..Config::default()
    };
    let app = TestApp::new(FakeRemote::down(), config).await;

    let response = app.get("/api/builds").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(x_cache(&response), "UNAVAILABLE");
    assert!(response.headers().get("x-cache-key").is_none());
}

#[tokio::test]
async fn test_reconnect_endpoint_restores_remote() {
    let app = TestApp::offline().await;
    let monitor = app.state.client.monitor();
    for _ in 0..app.state.config.max_reconnect_attempts {
        monitor.try_reconnect().await;
    }
    assert!(!monitor.try_reconnect().await);

    app.remote.restart();
    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/cache/reconnect")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    let json = body_to_json(response).await;
    assert_eq!(json["connected"], true);
    assert_eq!(json["health"]["reconnectAttempts"], 0);

    let health = body_to_json(app.get("/api/cache/health").await).await;
    assert_eq!(health["remote"]["state"], "connected");
    assert_eq!(health["remote"]["backend"], "fake");
}

// == Metrics ==

#[tokio::test]
async fn test_metrics_hit_ratio() {
    let app = TestApp::online().await;
    seed(&app, Collection::Builds, "a");

    app.get("/api/builds").await;
    settle().await;
    app.get("/api/builds").await;
    app.get("/api/builds").await;

    let json = body_to_json(app.get("/api/cache/metrics").await).await;
    let route = &json["routeStats"]["GET /api/builds"];
    assert_eq!(route["hits"], 2);
    assert_eq!(route["misses"], 1);
    assert_eq!(route["totalRequests"], 3);
    assert_eq!(json["totalRequests"], 3);
    assert_eq!(json["statusCodes"]["200"], 3);
    assert_eq!(json["hitRatio"], "66.67%");
}

#[tokio::test]
async fn test_metrics_reset() {
    let app = TestApp::online().await;
    app.get("/health").await;
    app.get("/api/builds").await;

    let before = Utc::now();
    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/cache/metrics/reset")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let reset = body_to_json(response).await;
    let stamp: DateTime<Utc> = reset["timestamp"].as_str().unwrap().parse().unwrap();
    assert!(stamp >= before);

    // The reset request itself completes after the counters were zeroed.
    let snapshot = app.state.metrics.snapshot();
    assert_eq!(snapshot.metrics.total_requests, 1);
    assert_eq!(snapshot.metrics.hits + snapshot.metrics.misses, 0);
    assert!(snapshot.metrics.last_reset >= before);
}

#[tokio::test]
async fn test_response_time_header() {
    let app = TestApp::online().await;

    let response = app.get("/api/cache/health").await;
    let value = response.headers()["x-response-time"].to_str().unwrap();
    assert!(value.ends_with("ms"));
    assert!(value.trim_end_matches("ms").parse::<f64>().is_ok());
}

// == Content CRUD ==

#[tokio::test]
async fn test_crud_cycle() {
    let app = TestApp::online().await;

    let created = app
        .send_json("POST", "/api/dictionary", json!({ "term": "kite" }))
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let item = body_to_json(created).await;
    let uri = format!("/api/dictionary/{}", item["id"].as_str().unwrap());

    let replaced = app
        .send_json("PUT", &uri, json!({ "term": "kiting" }))
        .await;
    assert_eq!(replaced.status(), StatusCode::OK);
    assert_eq!(body_to_json(replaced).await["term"], "kiting");

    let deleted = app
        .send(
            Request::builder()
                .method("DELETE")
                .uri(&uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(deleted.status(), StatusCode::OK);

    let gone = app.get(&uri).await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    let error = body_to_json(gone).await;
    assert!(error["error"].as_str().unwrap().contains("not found"));
}
