//! Shared test utilities

use std::sync::Arc;
use std::time::Instant;

use wakeline::api::{self, ApiState};
use wakeline::engine::{EngineConfig, IngestPipeline, Segment, SystemClock};

/// Batch of text-only segments
#[must_use]
pub fn segs(texts: &[&str]) -> Vec<Segment> {
    texts.iter().map(|text| Segment::new(*text)).collect()
}

/// Build a test router with no collaborators configured
#[must_use]
pub fn build_test_router() -> axum::Router {
    let engine = IngestPipeline::new(EngineConfig::default(), Instant::now());
    let state = Arc::new(ApiState::new(engine, Arc::new(SystemClock), None, None));
    api::router(state)
}
