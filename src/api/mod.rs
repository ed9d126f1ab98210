//! HTTP API server for the wakeline gateway

pub mod status;
pub mod webhook;

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use chrono::{DateTime, Utc};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::engine::{Clock, IngestPipeline};
use crate::services::{AnswerService, IntentService};
use crate::Result;

/// Canned reply when answer generation is unavailable or fails
pub const FALLBACK_REPLY: &str = "I'm sorry, I encountered an error processing your request.";

/// Shared state for API handlers
pub struct ApiState {
    /// The synchronous ingest engine
    pub engine: IngestPipeline,
    /// Time source for `process` calls and uptime
    pub clock: Arc<dyn Clock>,
    /// Answer collaborator; `None` when no API key is configured
    pub answer: Option<Arc<dyn AnswerService>>,
    /// Intent routing; `None` when no API key is configured
    pub intent: Option<IntentService>,
    /// Process start instant, for uptime
    pub started: Instant,
    /// Process start time, for display
    pub started_at: DateTime<Utc>,
}

impl ApiState {
    /// Create handler state around an engine and its collaborators
    #[must_use]
    pub fn new(
        engine: IngestPipeline,
        clock: Arc<dyn Clock>,
        answer: Option<Arc<dyn AnswerService>>,
        intent: Option<IntentService>,
    ) -> Self {
        let started = clock.now();
        Self {
            engine,
            clock,
            answer,
            intent,
            started,
            started_at: Utc::now(),
        }
    }

    /// Produce a spoken reply for a finalized question
    ///
    /// Consults the intent service first when configured; anything it
    /// declines falls through to the plain answer service. Failures
    /// degrade to [`FALLBACK_REPLY`] rather than surfacing to the caller.
    pub async fn respond(&self, question: &str) -> String {
        if let Some(intent) = &self.intent {
            match intent.analyze(question).await {
                Ok(analysis) => {
                    if let Some(reply) = intent.respond(&analysis).await {
                        return reply;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "intent analysis failed, falling back");
                }
            }
        }

        match &self.answer {
            Some(answer) => answer.answer(question).await.unwrap_or_else(|e| {
                tracing::error!(error = %e, "answer generation failed");
                FALLBACK_REPLY.to_string()
            }),
            None => {
                tracing::warn!("no answer service configured");
                FALLBACK_REPLY.to_string()
            }
        }
    }
}

/// Build the full application router
#[must_use]
pub fn router(state: Arc<ApiState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(webhook::router(state.clone()))
        .merge(status::router(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    /// Create a server for the given state and port
    #[must_use]
    pub fn new(state: Arc<ApiState>, port: u16) -> Self {
        Self { state, port }
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or run.
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, router(self.state))
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}
