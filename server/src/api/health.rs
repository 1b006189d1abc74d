//! Health check endpoints.
//!
//! `GET /health` is pure liveness and checks nothing. `GET /ready` runs the
//! configured readiness probe (a database ping in production) and is what
//! the load balancer should poll.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode};

/// Liveness check.
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Readiness check, including dependencies.
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, &'static str) {
    match state.readiness.ready().await {
        Ok(()) => (StatusCode::OK, "ready"),
        Err(err) => {
            tracing::warn!(error = %err, "readiness probe failed");
            (StatusCode::SERVICE_UNAVAILABLE, "not ready")
        }
    }
}
