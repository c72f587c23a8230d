//! Health check endpoints for Kubernetes probes.
//!
//! - `/health/live` - Liveness probe (restart if fails)
//! - `/health/ready` - Readiness probe
//!
//! Guessing works without the remote endpoint, so remote reachability is
//! reported but never makes the server unready.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use sketch_core::ServiceMode;

use crate::AppState;

/// Health status response.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// Overall status: always "healthy" once the server answers
    pub status: &'static str,
    /// Server version
    pub version: &'static str,
    /// Current service mode
    pub mode: ServiceMode,
    /// Whether the vision endpoint answered the probe (not probed offline)
    pub remote_reachable: bool,
}

/// Liveness probe - is the server running?
///
/// Returns 200 OK if the process is alive.
#[tracing::instrument(name = "liveness_probe")]
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe - is the server ready to accept traffic?
#[tracing::instrument(name = "readiness_probe", skip(state))]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let mode = state.orchestrator.mode();
    let remote_reachable = match mode {
        ServiceMode::Online => state.orchestrator.check_health().await,
        ServiceMode::Offline => false,
    };

    let status = HealthStatus {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        mode,
        remote_reachable,
    };

    (StatusCode::OK, Json(status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_serialization() {
        let status = HealthStatus {
            status: "healthy",
            version: "0.2.0",
            mode: ServiceMode::Online,
            remote_reachable: false,
        };

        let json = serde_json::to_string(&status).expect("should serialize");
        assert!(json.contains("healthy"));
        assert!(json.contains("0.2.0"));
        assert!(json.contains("\"mode\":\"online\""));
        assert!(json.contains("\"remote_reachable\":false"));
    }
}
