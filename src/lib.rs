//! Wakeline - wake-phrase gateway for streamed voice transcripts
//!
//! Ingests batches of transcribed speech segments tagged with a session id,
//! detects a spoken wake phrase (whole, or split across two segments),
//! aggregates the utterance that follows into a single question, and hands
//! the finalized question to an answer collaborator.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  HTTP transport                      │
//! │        POST /webhook  │  GET /status  │  ...        │
//! └────────────────────┬────────────────────────────────┘
//!                      │ process(session, segments, now)
//! ┌────────────────────▼────────────────────────────────┐
//! │                  Ingest engine                       │
//! │  SessionStore │ Trigger │ Aggregator │ Cooldown     │
//! └────────────────────┬────────────────────────────────┘
//!                      │ Finalized(question)
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Collaborators                        │
//! │     Answer (LLM)  │  Intent  │  Weather             │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! The engine is purely synchronous state computation: all time comparisons
//! run against the `now` supplied by the caller, and collaborator calls
//! happen only after the engine has returned.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod services;

pub use config::Config;
pub use engine::{
    Clock, EngineConfig, IngestPipeline, Outcome, Segment, SessionBuffer, SessionStore,
    SystemClock, TriggerConfig, TriggerState, TriggerStateMachine,
};
pub use error::{Error, Result};
