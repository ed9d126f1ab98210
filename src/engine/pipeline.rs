//! Batch ingest orchestration
//!
//! [`IngestPipeline`] is the only entry point external callers use: one
//! synchronous call per incoming segment batch, no I/O and no waiting
//! inside. Collaborator calls (answer generation and friends) happen
//! strictly after an [`Outcome::Finalized`] is returned, outside any lock
//! held here.

use std::sync::PoisonError;
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::error::{Error, Result};

use super::aggregator::QuestionAggregator;
use super::cooldown::CooldownGate;
use super::store::SessionStore;
use super::trigger::{TriggerConfig, TriggerStateMachine};

/// One transcribed speech segment from a streamed batch
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Segment {
    /// Transcript text; blank segments are skipped
    #[serde(default)]
    pub text: String,
    /// Speaker label assigned by the transcription service
    #[serde(default)]
    pub speaker: Option<String>,
    /// Whether the device wearer spoke this segment
    #[serde(default)]
    pub is_user: Option<bool>,
    /// Segment start offset in seconds within the stream
    #[serde(default)]
    pub start: Option<f64>,
    /// Segment end offset in seconds within the stream
    #[serde(default)]
    pub end: Option<f64>,
}

impl Segment {
    /// Text-only segment, as most tests and simple callers need
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Result of processing one segment batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Batch contained no non-blank text; a successful no-op
    Empty,
    /// Session is suppressing re-triggers; the batch was not processed
    CooldownActive,
    /// Segments processed, no question finalized yet
    Pending,
    /// A complete question, ready for the answer collaborator
    Finalized(String),
}

/// Tunable windows for the ingest engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Wake-phrase configuration
    pub trigger: TriggerConfig,
    /// Span after a trigger during which fragments join the question
    pub aggregation_window: Duration,
    /// Minimum interval between trigger activations per session
    pub cooldown: Duration,
    /// How often the idle-expiry sweep may run
    pub sweep_interval: Duration,
    /// Idle time after which a session is dropped
    pub session_expiry: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trigger: TriggerConfig::default(),
            aggregation_window: Duration::from_secs(5),
            cooldown: Duration::from_secs(10),
            sweep_interval: Duration::from_secs(300),
            session_expiry: Duration::from_secs(3600),
        }
    }
}

/// Orchestrates the session store, trigger machine, aggregator, and
/// cooldown gate for each incoming batch
#[derive(Debug)]
pub struct IngestPipeline {
    store: SessionStore,
    cooldown: CooldownGate,
    trigger: TriggerStateMachine,
    aggregator: QuestionAggregator,
    cooldown_window: Duration,
}

impl IngestPipeline {
    /// Build a pipeline from engine configuration
    ///
    /// `now` seeds the store's sweep schedule.
    #[must_use]
    pub fn new(config: EngineConfig, now: Instant) -> Self {
        Self {
            store: SessionStore::new(config.sweep_interval, config.session_expiry, now),
            cooldown: CooldownGate::new(),
            trigger: TriggerStateMachine::new(config.trigger),
            aggregator: QuestionAggregator::new(config.aggregation_window),
            cooldown_window: config.cooldown,
        }
    }

    /// Number of live sessions
    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.store.len()
    }

    /// The underlying session store, for explicit resets and sweeps
    #[must_use]
    pub const fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Process one batch of segments for `session_id`
    ///
    /// Segments are evaluated in arrival order. A trigger fired by an
    /// earlier segment lets later segments in the same batch seed and grow
    /// the question; iteration stops at the first finalized question, so
    /// trailing segments are never replayed against the reset buffer.
    ///
    /// Re-trigger suppression is evaluated once per batch against the
    /// buffer state on entry: a session that was already triggered and is
    /// still inside the cooldown window skips the whole batch with
    /// [`Outcome::CooldownActive`], leaving the collected question
    /// untouched. A trigger fired by this same batch does not gate its own
    /// trailing segments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingSessionId`] when `session_id` is blank; no
    /// session entry is created in that case.
    pub fn process(&self, session_id: &str, segments: &[Segment], now: Instant) -> Result<Outcome> {
        if session_id.trim().is_empty() {
            return Err(Error::MissingSessionId);
        }

        let shared = self.store.get_or_create(session_id, now);
        let mut buffer = shared.lock().unwrap_or_else(PoisonError::into_inner);

        if buffer.trigger_detected
            && self
                .cooldown
                .is_on_cooldown(session_id, now, self.cooldown_window)
        {
            tracing::debug!(session_id, "session on cooldown, batch skipped");
            return Ok(Outcome::CooldownActive);
        }

        let mut saw_text = false;
        for segment in segments {
            let text = normalize(&segment.text);
            if text.is_empty() {
                continue;
            }
            saw_text = true;

            if self.trigger.observe(&mut buffer, &text, now) {
                self.cooldown.mark_triggered(session_id, now);
                continue;
            }

            if buffer.trigger_detected {
                if let Some(question) = self.aggregator.observe(&mut buffer, &text, now) {
                    tracing::info!(session_id, question = %question, "question finalized");
                    return Ok(Outcome::Finalized(question));
                }
            }
        }

        if saw_text {
            Ok(Outcome::Pending)
        } else {
            Ok(Outcome::Empty)
        }
    }
}

/// Lowercase and trim a transcript segment for matching
#[must_use]
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}
