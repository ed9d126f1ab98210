//! Per-session re-trigger suppression
//!
//! Tracks the instant of each session's last trigger activation. The marks
//! live outside the session buffers so a cooldown survives a buffer reset
//! or re-creation within the window.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Maximum tracked sessions before the oldest mark is evicted
const MAX_TRACKED_SESSIONS: usize = 4096;

/// Records trigger activations and answers cooldown queries
#[derive(Debug, Default)]
pub struct CooldownGate {
    marks: Mutex<HashMap<String, Instant>>,
}

impl CooldownGate {
    /// Create an empty gate
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `session_id` last triggered less than `window` ago
    #[must_use]
    pub fn is_on_cooldown(&self, session_id: &str, now: Instant, window: Duration) -> bool {
        let marks = self.marks.lock().unwrap_or_else(PoisonError::into_inner);
        marks
            .get(session_id)
            .is_some_and(|mark| now.duration_since(*mark) < window)
    }

    /// Record a trigger activation for `session_id`
    pub fn mark_triggered(&self, session_id: &str, now: Instant) {
        let mut marks = self.marks.lock().unwrap_or_else(PoisonError::into_inner);

        // Hard cap on tracked sessions; evict the stalest mark first
        if marks.len() >= MAX_TRACKED_SESSIONS && !marks.contains_key(session_id) {
            if let Some(oldest) = marks
                .iter()
                .min_by_key(|(_, mark)| *mark)
                .map(|(key, _)| key.clone())
            {
                marks.remove(&oldest);
            }
        }

        marks.insert(session_id.to_string(), now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmarked_session_is_not_on_cooldown() {
        let gate = CooldownGate::new();
        assert!(!gate.is_on_cooldown("s1", Instant::now(), Duration::from_secs(10)));
    }

    #[test]
    fn cooldown_covers_the_window_then_lapses() {
        let gate = CooldownGate::new();
        let t0 = Instant::now();
        let window = Duration::from_secs(10);

        gate.mark_triggered("s1", t0);

        assert!(gate.is_on_cooldown("s1", t0 + Duration::from_secs(9), window));
        assert!(!gate.is_on_cooldown("s1", t0 + Duration::from_secs(10), window));
    }

    #[test]
    fn sessions_cool_down_independently() {
        let gate = CooldownGate::new();
        let t0 = Instant::now();
        let window = Duration::from_secs(10);

        gate.mark_triggered("s1", t0);

        assert!(gate.is_on_cooldown("s1", t0 + Duration::from_secs(1), window));
        assert!(!gate.is_on_cooldown("s2", t0 + Duration::from_secs(1), window));
    }

    #[test]
    fn remarking_extends_the_cooldown() {
        let gate = CooldownGate::new();
        let t0 = Instant::now();
        let window = Duration::from_secs(10);

        gate.mark_triggered("s1", t0);
        gate.mark_triggered("s1", t0 + Duration::from_secs(8));

        assert!(gate.is_on_cooldown("s1", t0 + Duration::from_secs(15), window));
    }
}
