//! Integration Tests for API Endpoints
//!
//! Drives the full request/response cycle: cached queries, change feed,
//! raw cache access, and statistics.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    Router,
};
use dep_cache::{api::create_router, cache::MemoryBackend, AppState, Config};
use serde_json::Value;
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app() -> Router {
    let backend = MemoryBackend::new(100, 300);
    let state = AppState::from_config(&Config::default(), Arc::new(backend));
    create_router(state)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get(app: &Router, uri: &str, session: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(id) = session {
        builder = builder.header("session-id", id);
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn advance(app: &Router, constraint: &str, version: u64) -> Value {
    let body = format!(r#"{{"constraint":"{}","version":{}}}"#, constraint, version);
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/feed/advance")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_to_json(response.into_body()).await
}

fn cache_status(response: &Response<Body>) -> String {
    response.headers()["x-cache"].to_str().unwrap().to_string()
}

/// Cache writes are fire-and-forget; wait until the key shows up as a hit.
async fn wait_for_hit(app: &Router, key: &str) {
    let uri = format!("/cache/{}", key);
    for _ in 0..50 {
        let json = body_to_json(get(app, &uri, None).await.into_body()).await;
        if json["hit"].as_bool() == Some(true) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("key {} never became a hit", key);
}

// == Cached Query Tests ==

#[tokio::test]
async fn test_books_miss_then_hit() {
    let app = create_test_app();

    let first = get(&app, "/books?fields=author", None).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(cache_status(&first), "MISS");
    let first_json = body_to_json(first.into_body()).await;
    assert_eq!(first_json["books"][0]["author"]["name"], "Author 1");

    wait_for_hit(&app, "books%3Ffields%3Dauthor").await;

    let second = get(&app, "/books?fields=author", None).await;
    assert_eq!(cache_status(&second), "HIT");
    assert_eq!(body_to_json(second.into_body()).await, first_json);
}

#[tokio::test]
async fn test_advance_invalidates_dependent_query() {
    let app = create_test_app();

    get(&app, "/books?fields=author", None).await;
    wait_for_hit(&app, "books%3Ffields%3Dauthor").await;

    advance(&app, "constraint:db.author", 1).await;

    let response = get(&app, "/books?fields=author", None).await;
    assert_eq!(cache_status(&response), "MISS");
}

#[tokio::test]
async fn test_advance_leaves_independent_query_cached() {
    let app = create_test_app();

    // Plain books never touch the author table
    get(&app, "/books", None).await;
    wait_for_hit(&app, "books%3Ffields%3D").await;

    advance(&app, "constraint:db.author", 1).await;

    let response = get(&app, "/books", None).await;
    assert_eq!(cache_status(&response), "HIT");
}

#[tokio::test]
async fn test_stale_lookup_reports_constraint() {
    let app = create_test_app();

    get(&app, "/books?fields=stores", None).await;
    wait_for_hit(&app, "books%3Ffields%3Dstores").await;
    advance(&app, "constraint:db.stores", 4).await;

    let json = body_to_json(
        get(&app, "/cache/books%3Ffields%3Dstores", None)
            .await
            .into_body(),
    )
    .await;
    assert_eq!(json["hit"], false);
    assert_eq!(json["reason"], "stale");
    assert_eq!(json["constraint"], "constraint:db.stores");
}

#[tokio::test]
async fn test_sessions_have_separate_entries() {
    let app = create_test_app();

    get(&app, "/books", Some("alice")).await;
    wait_for_hit(&app, "session:alice:books%3Ffields%3D").await;

    let bob = get(&app, "/books", Some("bob")).await;
    assert_eq!(cache_status(&bob), "MISS");
}

#[tokio::test]
async fn test_books_unknown_field() {
    let app = create_test_app();

    let response = get(&app, "/books?fields=isbn", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("isbn"));
}

// == Change Feed Tests ==

#[tokio::test]
async fn test_advance_is_monotonic() {
    let app = create_test_app();

    let applied = advance(&app, "constraint:db.books", 10).await;
    assert_eq!(applied["outcome"], "applied");

    let ignored = advance(&app, "constraint:db.books", 3).await;
    assert_eq!(ignored["outcome"], "ignored");
    assert_eq!(ignored["version"], 10);

    let json = body_to_json(
        get(&app, "/versions/constraint:db.books", None)
            .await
            .into_body(),
    )
    .await;
    assert_eq!(json["version"], 10);
}

#[tokio::test]
async fn test_advance_rejects_empty_constraint() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/feed/advance")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"constraint":"","version":1}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_versions_listing() {
    let app = create_test_app();
    advance(&app, "b", 2).await;
    advance(&app, "a", 1).await;

    let json = body_to_json(get(&app, "/versions", None).await.into_body()).await;
    let versions = json["versions"].as_array().unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0]["constraint"], "a");
    assert_eq!(versions[1]["version"], 2);
}

#[tokio::test]
async fn test_unknown_version_is_zero() {
    let app = create_test_app();

    let json = body_to_json(get(&app, "/versions/never-seen", None).await.into_body()).await;
    assert_eq!(json["version"], 0);
}

// == Raw Cache Access Tests ==

#[tokio::test]
async fn test_delete_forces_miss() {
    let app = create_test_app();

    get(&app, "/books", None).await;
    wait_for_hit(&app, "books%3Ffields%3D").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/cache/books%3Ffields%3D")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["removed"], true);

    let again = get(&app, "/books", None).await;
    assert_eq!(cache_status(&again), "MISS");
}

#[tokio::test]
async fn test_lookup_absent_key() {
    let app = create_test_app();

    let json = body_to_json(get(&app, "/cache/nothing", None).await.into_body()).await;
    assert_eq!(json["hit"], false);
    assert_eq!(json["reason"], "absent");
}

// == Stats & Health Tests ==

#[tokio::test]
async fn test_stats_count_hits_and_misses() {
    let app = create_test_app();

    get(&app, "/books", None).await;
    wait_for_hit(&app, "books%3Ffields%3D").await;
    get(&app, "/books", None).await;

    let json = body_to_json(get(&app, "/stats", None).await.into_body()).await;
    assert!(json["cache"]["hits"].as_u64().unwrap() >= 2);
    assert!(json["cache"]["misses"].as_u64().unwrap() >= 1);
    assert_eq!(json["cache"]["writes"], 1);
    assert_eq!(json["store"]["total_entries"], 1);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let response = get(&app, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}
