//! # Saorsa Sketch Server
//!
//! Local server for the draw-and-guess game.
//! Binds to localhost only for security.

use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use sketch_core::SharedServiceMode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sketch_server::metrics;
use sketch_server::{build_router, AppConfig, AppState, CliArgs, GuessOrchestrator};

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,sketch_server=debug,tower_http=debug).
/// Set `RUST_LOG_FORMAT=json` for JSON output (recommended for production).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sketch_server=debug,tower_http=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    init_tracing();

    let config = AppConfig::try_from(args).context("invalid configuration")?;
    tracing::debug!(?config, "Loaded configuration");

    let metrics_handle =
        metrics::init_metrics().context("Failed to initialize Prometheus metrics")?;
    tracing::info!("Prometheus metrics initialized");

    if !config.guess.has_credentials() {
        tracing::warn!("VISION_API_KEY not set; every guess will use the offline fallback");
    }

    let mode = SharedServiceMode::new(config.server.initial_mode);
    let orchestrator = GuessOrchestrator::new(config.guess.clone())
        .context("failed to build vision client")?
        .with_mode(mode);
    metrics::set_service_mode(config.server.initial_mode);

    let port = config.server.port;
    let state = AppState::new(orchestrator, config.server.history_capacity);
    let app = build_router(state, Some(metrics_handle), port);

    // Bind to localhost ONLY (security requirement)
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        mode = %config.server.initial_mode,
        model = %config.guess.model,
        "Saorsa Sketch server starting on http://{}",
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
