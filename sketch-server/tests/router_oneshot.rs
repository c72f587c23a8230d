//! In-process router tests driven with `tower::ServiceExt::oneshot`.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sketch_core::{ServiceMode, SharedServiceMode};
use sketch_server::validation::MAX_BODY_BYTES;
use sketch_server::{build_router, AppState, FallbackLatency, GuessConfig, GuessOrchestrator};
use tower::ServiceExt;

fn app(mode: ServiceMode) -> Router {
    let config = GuessConfig {
        fallback_latency: FallbackLatency::none(),
        ..GuessConfig::default()
    };
    let orchestrator = GuessOrchestrator::new(config)
        .expect("orchestrator")
        .with_mode(SharedServiceMode::new(mode));
    build_router(AppState::new(orchestrator, 50), None, 9474)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

fn json_post(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .expect("request")
}

#[tokio::test]
async fn test_oversized_body_is_rejected_with_envelope() {
    let image = "A".repeat(MAX_BODY_BYTES + 1);
    let body = json!({ "image": image }).to_string();

    let response = app(ServiceMode::Offline)
        .oneshot(json_post("/api/guess", body))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn test_missing_content_type() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/guess")
        .body(Body::from(r#"{"image":"x"}"#))
        .expect("request");

    let response = app(ServiceMode::Offline)
        .oneshot(request)
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "UNSUPPORTED_MEDIA_TYPE");
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let request = Request::builder()
        .uri("/health/live")
        .header("x-request-id", "trace-me-123")
        .body(Body::empty())
        .expect("request");

    let response = app(ServiceMode::Online)
        .oneshot(request)
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("trace-me-123")
    );
}

#[tokio::test]
async fn test_metrics_route_absent_without_recorder() {
    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .expect("request");

    let response = app(ServiceMode::Online)
        .oneshot(request)
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_allows_localhost_origin_only() {
    let preflight = |origin: &'static str| {
        Request::builder()
            .method("OPTIONS")
            .uri("/api/guess")
            .header("origin", origin)
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .expect("request")
    };

    let allowed = app(ServiceMode::Online)
        .oneshot(preflight("http://localhost:9474"))
        .await
        .expect("response");
    assert_eq!(
        allowed
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:9474")
    );

    let denied = app(ServiceMode::Online)
        .oneshot(preflight("https://evil.example"))
        .await
        .expect("response");
    assert!(denied.headers().get("access-control-allow-origin").is_none());
}
