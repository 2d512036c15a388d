//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each admin endpoint.

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use sweep_cache::{api::create_router, AppState, CacheStore, Config};
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app() -> (Router, CacheStore<String>) {
    let cache = CacheStore::new(&Config::default());
    let app = create_router(AppState::new(cache.clone()));
    (app, cache)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

// == SET Endpoint Tests ==

#[tokio::test]
async fn test_set_endpoint_success() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/set")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"key":"test_key","value":"test_value"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert!(json["message"].as_str().unwrap().contains("test_key"));
}

#[tokio::test]
async fn test_invalid_json_request() {
    let (app, _) = create_test_app();

    let (status, _) = send(&app, "PUT", "/set", Some(r#"{"key":"#)).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_empty_key_request() {
    let (app, _) = create_test_app();

    let (status, json) = send(&app, "PUT", "/set", Some(r#"{"key":"","value":"v"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("empty"));
}

// == GET Endpoint Tests ==

#[tokio::test]
async fn test_get_endpoint_success() {
    let (app, _) = create_test_app();

    send(&app, "PUT", "/set", Some(r#"{"key":"get_key","value":"get_value"}"#)).await;
    let (status, json) = send(&app, "GET", "/get/get_key", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["key"], "get_key");
    assert_eq!(json["value"], "get_value");
}

#[tokio::test]
async fn test_get_endpoint_not_found() {
    let (app, _) = create_test_app();

    let (status, json) = send(&app, "GET", "/get/nonexistent_key", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json.get("error").is_some());
}

// == DELETE Endpoint Tests ==

#[tokio::test]
async fn test_delete_endpoint_is_idempotent() {
    let (app, _) = create_test_app();

    send(&app, "PUT", "/set", Some(r#"{"key":"delete_key","value":"v"}"#)).await;

    let (first, _) = send(&app, "DELETE", "/del/delete_key", None).await;
    let (second, _) = send(&app, "DELETE", "/del/delete_key", None).await;
    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/get/delete_key", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_prefix_endpoint() {
    let (app, cache) = create_test_app();
    cache.store("user:1", "a".to_string(), Duration::ZERO);
    cache.store("user:2", "b".to_string(), Duration::ZERO);
    cache.store("order:5", "c".to_string(), Duration::ZERO);

    let (status, json) = send(&app, "DELETE", "/prefix/user:", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["removed"], 2);
    assert!(cache.get("order:5").is_some());
    assert!(cache.get("user:1").is_none());
}

// == Stats and Health ==

#[tokio::test]
async fn test_stats_endpoint() {
    let (app, _) = create_test_app();

    send(&app, "PUT", "/set", Some(r#"{"key":"stats_key","value":"v"}"#)).await;
    send(&app, "GET", "/get/stats_key", None).await;
    send(&app, "GET", "/get/nonexistent", None).await;

    let (status, json) = send(&app, "GET", "/stats", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["puts"], 1);
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["total_entries"], 1);
    assert_eq!(json["watermark"], 1);
    assert_eq!(json["sweeper_running"], true);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = create_test_app();

    let (status, json) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}

// == TTL ==

#[tokio::test]
async fn test_ttl_expiration_via_api() {
    let (app, _) = create_test_app();

    send(&app, "PUT", "/set", Some(r#"{"key":"ttl_test","value":"v","ttl":1}"#)).await;
    let (before, _) = send(&app, "GET", "/get/ttl_test", None).await;
    assert_eq!(before, StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(1100)).await;

    let (after, _) = send(&app, "GET", "/get/ttl_test", None).await;
    assert_eq!(after, StatusCode::NOT_FOUND);
}
