//! Per-session transcript buffer

use std::time::Instant;

/// Mutable per-session state for trigger detection and question aggregation
///
/// One buffer exists per session id, owned by the
/// [`SessionStore`](super::SessionStore). The trigger, question, and
/// response fields are always restored together through [`reset`], never
/// piecemeal at call sites, so a buffer can never end up straddling two
/// aggregation cycles.
///
/// [`reset`]: SessionBuffer::reset
#[derive(Debug, Clone)]
pub struct SessionBuffer {
    /// Opaque session identifier this buffer belongs to
    pub session_id: String,
    /// True once a full wake phrase was recognized for the current cycle
    pub trigger_detected: bool,
    /// Set when `trigger_detected` becomes true
    pub trigger_time: Option<Instant>,
    /// Text fragments collected since the trigger
    pub collected_question: Vec<String>,
    /// True once a question was finalized and handed off this cycle
    pub response_sent: bool,
    /// First half of a split wake phrase was seen, second half pending
    pub partial_trigger: bool,
    /// Set when `partial_trigger` becomes true
    pub partial_trigger_time: Option<Instant>,
    /// Updated on every access; drives idle expiry
    pub last_activity: Instant,
}

impl SessionBuffer {
    /// Create a fresh buffer for `session_id`
    #[must_use]
    pub fn new(session_id: impl Into<String>, now: Instant) -> Self {
        Self {
            session_id: session_id.into(),
            trigger_detected: false,
            trigger_time: None,
            collected_question: Vec::new(),
            response_sent: false,
            partial_trigger: false,
            partial_trigger_time: None,
            last_activity: now,
        }
    }

    /// Restore trigger, question, and response fields to their defaults
    ///
    /// `last_activity` is preserved: a reset ends an aggregation cycle, it
    /// does not make the session idle.
    pub fn reset(&mut self) {
        self.trigger_detected = false;
        self.trigger_time = None;
        self.collected_question.clear();
        self.response_sent = false;
        self.partial_trigger = false;
        self.partial_trigger_time = None;
    }
}
