//! Transcript ingest webhook

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::engine::{Outcome, Segment};
use crate::error::Error;

use super::ApiState;

/// Build the webhook router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/webhook", post(handle))
        .route("/webhook/setup-status", get(setup_status))
        .route("/instructions", get(instructions))
        .with_state(state)
}

/// Incoming segment batch
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    /// Session the batch belongs to
    #[serde(default)]
    pub session_id: Option<String>,
    /// Transcript segments in arrival order
    #[serde(default)]
    pub segments: Vec<Segment>,
}

/// Webhook response body
#[derive(Debug, Serialize)]
pub struct WebhookReply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl WebhookReply {
    const fn success() -> Self {
        Self {
            status: Some("success"),
            message: None,
            answer: None,
        }
    }

    fn error(message: String) -> Self {
        Self {
            status: Some("error"),
            message: Some(message),
            answer: None,
        }
    }

    fn answered(answer: String) -> Self {
        Self {
            status: None,
            message: None,
            answer: Some(answer),
        }
    }
}

/// Ingest one batch of transcript segments
///
/// Feeds the batch through the engine; when a question finalizes, the
/// answer collaborators are invoked here, after the engine call has
/// returned and outside any of its locks.
pub async fn handle(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<WebhookPayload>,
) -> (StatusCode, Json<WebhookReply>) {
    let now = state.clock.now();
    let session_id = payload.session_id.unwrap_or_default();

    match state.engine.process(&session_id, &payload.segments, now) {
        Ok(Outcome::Finalized(question)) => {
            tracing::info!(session_id, question, "dispatching finalized question");
            let reply = state.respond(&question).await;
            (StatusCode::OK, Json(WebhookReply::answered(reply)))
        }
        Ok(outcome) => {
            tracing::debug!(session_id, ?outcome, "batch processed");
            (StatusCode::OK, Json(WebhookReply::success()))
        }
        Err(error @ Error::MissingSessionId) => {
            tracing::warn!("webhook request without session id");
            (
                StatusCode::BAD_REQUEST,
                Json(WebhookReply::error(error.to_string())),
            )
        }
        Err(error) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(WebhookReply::error(error.to_string())),
        ),
    }
}

/// Setup-status response
#[derive(Debug, Serialize)]
pub struct SetupStatus {
    pub is_setup_completed: bool,
    pub message: &'static str,
}

/// Confirm the webhook is ready to receive requests
pub async fn setup_status() -> Json<SetupStatus> {
    Json(SetupStatus {
        is_setup_completed: true,
        message: "Webhook setup is complete and ready to receive requests.",
    })
}

/// Usage instructions response
#[derive(Debug, Serialize)]
pub struct Instructions {
    pub status: &'static str,
    pub message: &'static str,
}

/// Human-readable usage instructions
pub async fn instructions() -> Json<Instructions> {
    Json(Instructions {
        status: "OK",
        message: "Enable and enjoy! Just ask your questions and I'll do my best to answer them.",
    })
}
