//! Test server harness for integration tests.
//!
//! Spins up the real application router on a random port so tests can
//! talk to it over HTTP.

use std::net::SocketAddr;
use std::time::Duration;

use sketch_core::{ServiceMode, SharedServiceMode, Snapshot};
use sketch_renderer::{to_data_uri, CanvasEngine, RasterFormat};
use sketch_server::{build_router, AppState, FallbackLatency, GuessConfig, GuessOrchestrator};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A test server instance with control handles.
pub struct TestServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server with no API key and no artificial fallback latency.
    pub async fn start() -> Self {
        Self::start_with(quiet_config(), ServiceMode::Online).await
    }

    /// Start a server with explicit guess settings.
    ///
    /// # Panics
    ///
    /// Panics if no port is available or server fails to bind.
    pub async fn start_with(config: GuessConfig, mode: ServiceMode) -> Self {
        let port = portpicker::pick_unused_port().expect("no available port");
        let addr = SocketAddr::from(([127, 0, 0, 1], port));

        let orchestrator = GuessOrchestrator::new(config)
            .expect("orchestrator")
            .with_mode(SharedServiceMode::new(mode));
        let app = build_router(AppState::new(orchestrator, 50), None, port);

        let listener = TcpListener::bind(addr).await.expect("failed to bind");
        let actual_addr = listener.local_addr().expect("failed to get local addr");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("server error");
        });

        // Give the server a moment to start
        tokio::time::sleep(Duration::from_millis(10)).await;

        Self {
            addr: actual_addr,
            shutdown_tx: Some(shutdown_tx),
            handle,
        }
    }

    /// Absolute URL for `path` on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Gracefully shut down the server.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = tokio::time::timeout(Duration::from_secs(5), self.handle).await;
    }
}

/// Guess settings with no credentials and no fallback delay.
pub fn quiet_config() -> GuessConfig {
    GuessConfig {
        fallback_latency: FallbackLatency::none(),
        ..GuessConfig::default()
    }
}

/// A small drawing exported the way the browser canvas sends it.
pub fn sketch_data_uri() -> String {
    let mut engine = CanvasEngine::new(64, 64);
    let mut pixels = Snapshot::blank(64, 64).pixels().to_vec();
    // A black diagonal stroke
    for i in 0..64usize {
        let offset = (i * 64 + i) * 4;
        pixels[offset..offset + 3].copy_from_slice(&[0, 0, 0]);
    }
    engine.commit(Snapshot::new(64, 64, pixels).expect("snapshot"));

    let png = engine
        .export_raster(RasterFormat::Png, 1.0)
        .expect("png export");
    to_data_uri(&png, RasterFormat::Png)
}
