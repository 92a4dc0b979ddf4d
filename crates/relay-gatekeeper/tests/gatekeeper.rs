//! End-to-end behaviour of the gatekeeper against an in-process mock router.
//!
//! Run with: cargo test --package relay-gatekeeper --test gatekeeper

use axum::body::{to_bytes, Body};
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::routing::post;
use axum::Json;
use relay_gatekeeper::{create_router, ApiKey, Gatekeeper, RouterClient};
use relay_policy::DenyList;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

const KEY: &str = "MY_SECRET_KEY_123";

/// Counts calls, remembers the last body, answers with a canned status.
#[derive(Default)]
struct MockRouter {
    calls: AtomicUsize,
    last_body: Mutex<Option<Value>>,
    status: Mutex<Option<StatusCode>>,
}

async fn mock_query(State(mock): State<Arc<MockRouter>>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    mock.calls.fetch_add(1, Ordering::SeqCst);
    *mock.last_body.lock().unwrap() = Some(body.clone());

    let status = mock.status.lock().unwrap().unwrap_or(StatusCode::OK);
    if status != StatusCode::OK {
        return (
            status,
            Json(json!({
                "error": "execution failed",
                "detail": "Table 'sakila.nope' doesn't exist",
                "request_id": body["request_id"],
                "target": "manager"
            })),
        );
    }
    (
        status,
        Json(json!({
            "request_id": body["request_id"],
            "mode": body["mode"],
            "statement_type": "READ",
            "target": "manager",
            "result": { "rows": [[1]] }
        })),
    )
}

/// Start the mock router on an ephemeral port; returns its `/query` URL.
async fn spawn_mock(mock: Arc<MockRouter>) -> String {
    let app = axum::Router::new()
        .route("/query", post(mock_query))
        .with_state(mock);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/query", addr)
}

fn gatekeeper_app(router_url: &str) -> axum::Router {
    let client = RouterClient::new(router_url, Duration::from_secs(5)).unwrap();
    let gatekeeper = Gatekeeper::new(ApiKey::new(KEY), DenyList::default(), client);
    create_router(Arc::new(gatekeeper))
}

async fn call(app: axum::Router, key: Option<&str>, body: Value) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/query")
        .header("content-type", "application/json");
    if let Some(key) = key {
        builder = builder.header("X-API-Key", key);
    }
    let response = app
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn missing_key_is_unauthorized_and_not_forwarded() {
    let mock = Arc::new(MockRouter::default());
    let app = gatekeeper_app(&spawn_mock(mock.clone()).await);

    let (status, body) = call(app, None, json!({ "sql": "SELECT 1;" })).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "unauthorized" }));
    assert_eq!(mock.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn wrong_key_is_unauthorized_even_for_blocked_sql() {
    let mock = Arc::new(MockRouter::default());
    let app = gatekeeper_app(&spawn_mock(mock.clone()).await);

    let (status, body) = call(app, Some("nope"), json!({ "sql": "DROP TABLE x;" })).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "unauthorized" }));
    assert_eq!(mock.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn denied_statement_is_blocked_and_not_forwarded() {
    let mock = Arc::new(MockRouter::default());
    let app = gatekeeper_app(&spawn_mock(mock.clone()).await);

    let (status, body) = call(app, Some(KEY), json!({ "sql": "DROP TABLE x;" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "blocked by gatekeeper policy" }));
    assert_eq!(mock.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_mode_is_rejected_at_the_edge() {
    let mock = Arc::new(MockRouter::default());
    let app = gatekeeper_app(&spawn_mock(mock.clone()).await);

    let (status, body) = call(app, Some(KEY), json!({ "sql": "SELECT 1;", "mode": "roundrobin" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid request");
    assert_eq!(mock.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn allowed_statement_is_forwarded_with_supplied_request_id() {
    let mock = Arc::new(MockRouter::default());
    let app = gatekeeper_app(&spawn_mock(mock.clone()).await);

    let (status, body) = call(
        app,
        Some(KEY),
        json!({ "sql": "SELECT 1;", "mode": "ping", "request_id": "bench-1" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["request_id"], "bench-1");
    assert_eq!(body["mode"], "ping");
    assert_eq!(mock.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        mock.last_body.lock().unwrap().clone().unwrap(),
        json!({ "sql": "SELECT 1;", "mode": "ping", "request_id": "bench-1" })
    );
}

#[tokio::test]
async fn request_id_is_generated_when_absent() {
    let mock = Arc::new(MockRouter::default());
    let url = spawn_mock(mock.clone()).await;

    let (_, first) = call(gatekeeper_app(&url), Some(KEY), json!({ "sql": "SELECT 1;" })).await;
    let (_, second) = call(gatekeeper_app(&url), Some(KEY), json!({ "sql": "SELECT 1;" })).await;

    let first_id = first["request_id"].as_str().unwrap().to_string();
    let second_id = second["request_id"].as_str().unwrap().to_string();
    assert!(!first_id.is_empty());
    assert_ne!(first_id, second_id);

    // Mode defaults to direct on the forwarded body.
    let forwarded = mock.last_body.lock().unwrap().clone().unwrap();
    assert_eq!(forwarded["mode"], "direct");
}

#[tokio::test]
async fn router_error_status_and_body_are_relayed() {
    let mock = Arc::new(MockRouter::default());
    *mock.status.lock().unwrap() = Some(StatusCode::INTERNAL_SERVER_ERROR);
    let app = gatekeeper_app(&spawn_mock(mock.clone()).await);

    let (status, body) = call(
        app,
        Some(KEY),
        json!({ "sql": "SELECT * FROM nope", "request_id": "r-500" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "execution failed");
    assert_eq!(body["request_id"], "r-500");
    assert_eq!(body["target"], "manager");
}

#[tokio::test]
async fn unreachable_router_is_bad_gateway() {
    // Bind then drop to get a port with nothing listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let app = gatekeeper_app(&format!("http://{}/query", addr));
    let (status, body) = call(app, Some(KEY), json!({ "sql": "SELECT 1;", "request_id": "r-502" })).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "upstream unavailable");
    assert_eq!(body["request_id"], "r-502");
    assert_eq!(body["target"], "router");
    assert!(!body.to_string().contains(KEY));
}

#[tokio::test]
async fn health_needs_no_key() {
    let mock = Arc::new(MockRouter::default());
    let app = gatekeeper_app(&spawn_mock(mock).await);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn body_without_content_type_is_forwarded() {
    let mock = Arc::new(MockRouter::default());
    let app = gatekeeper_app(&spawn_mock(mock.clone()).await);

    let request = Request::builder()
        .method("POST")
        .uri("/query")
        .header("X-API-Key", KEY)
        .body(Body::from(json!({ "sql": "SELECT 1;", "request_id": "no-ct" }).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(mock.calls.load(Ordering::SeqCst), 1);
    let forwarded = mock.last_body.lock().unwrap().clone().unwrap();
    assert_eq!(forwarded["request_id"], "no-ct");
    assert_eq!(forwarded["mode"], "direct");
}
