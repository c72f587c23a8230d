//! # Saorsa Sketch Server Library
//!
//! Guess orchestration and the HTTP surface for the draw-and-guess game.
//! This library is used by both the binary and integration tests.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method},
    routing::get,
    routing::post,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

pub mod config;
pub mod fallback;
pub mod feedback;
pub mod health;
pub mod metrics;
pub mod orchestrator;
pub mod routes;
pub mod suggest;
pub mod validation;
pub mod vision;

pub use config::{AppConfig, CliArgs, ConfigError, FallbackLatency, GuessConfig, ServerConfig};
pub use fallback::{FallbackGenerator, FallbackPool, FallbackReason};
pub use feedback::{FeedbackDeliveryError, FeedbackSink, TracingFeedbackSink};
pub use orchestrator::GuessOrchestrator;
pub use vision::{OpenAiVisionClient, RemoteError, VisionBackend};

/// Shared application state.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Guess orchestrator shared by every request.
    pub orchestrator: Arc<GuessOrchestrator>,
    /// Undo history capacity advertised to the browser canvas.
    pub history_capacity: usize,
}

impl AppState {
    /// State around an orchestrator.
    #[must_use]
    pub fn new(orchestrator: GuessOrchestrator, history_capacity: usize) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            history_capacity,
        }
    }
}

/// Build a CORS layer that only allows localhost origins.
#[must_use]
pub fn build_cors_layer(port: u16) -> CorsLayer {
    let localhost_origins = [
        format!("http://localhost:{port}"),
        format!("http://127.0.0.1:{port}"),
        // Common dev server ports
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(), // Vite
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:5173".to_string(),
    ];

    let origins: Vec<HeaderValue> = localhost_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

/// Assemble the full application router.
///
/// `/metrics` is only mounted when a Prometheus handle is supplied.
#[must_use]
pub fn build_router(state: AppState, metrics_handle: Option<PrometheusHandle>, port: u16) -> Router {
    let mut app = Router::new()
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/api/guess", post(routes::guess_handler))
        .route("/api/feedback", post(routes::feedback_handler))
        .route(
            "/api/mode",
            get(routes::get_mode_handler).put(routes::set_mode_handler),
        )
        .route("/api/models", get(routes::models_handler))
        .route("/api/config", get(routes::config_handler))
        .with_state(state);

    if let Some(handle) = metrics_handle {
        let metrics_router = Router::new()
            .route("/metrics", get(metrics_handler))
            .with_state(handle);
        app = app.merge(metrics_router);
    }

    app.layer(DefaultBodyLimit::max(validation::MAX_BODY_BYTES))
        // Request ID for distributed tracing correlation
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(build_cors_layer(port))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Prometheus metrics endpoint.
#[tracing::instrument(name = "metrics", skip(handle))]
async fn metrics_handler(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}
