//! Health and status endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use super::ApiState;

/// Build the status router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .with_state(state)
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Liveness probe - is the service running?
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Service status response
#[derive(Serialize)]
pub struct StatusResponse {
    /// Number of live session buffers
    pub active_sessions: usize,
    /// Seconds since the process started
    pub uptime_seconds: f64,
    /// Process start time (RFC 3339)
    pub started_at: String,
}

/// Session count and uptime
async fn status(State(state): State<Arc<ApiState>>) -> Json<StatusResponse> {
    let uptime = state.clock.now().duration_since(state.started);

    Json(StatusResponse {
        active_sessions: state.engine.active_sessions(),
        uptime_seconds: uptime.as_secs_f64(),
        started_at: state.started_at.to_rfc3339(),
    })
}
