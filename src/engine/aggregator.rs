//! Post-trigger question aggregation
//!
//! Once a session is triggered, follow-up segments are treated as parts of
//! one spoken question until the utterance is judged complete. Completion
//! is decided from the supplied `now` and the configured window, never from
//! waiting.

use std::time::{Duration, Instant};

use super::buffer::SessionBuffer;

/// Accumulates post-trigger segments and decides when a question is complete
#[derive(Debug, Clone)]
pub struct QuestionAggregator {
    window: Duration,
}

impl QuestionAggregator {
    /// Create an aggregator with the given aggregation window
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self { window }
    }

    /// Feed one normalized post-trigger segment to a triggered buffer
    ///
    /// The segment is appended to the collected question only while the
    /// aggregation window is open; later segments are dropped but may still
    /// finalize what was already collected.
    ///
    /// Returns the finalized question once the utterance is complete:
    /// fragments joined with single spaces, trimmed, with a trailing `?`
    /// ensured. Finalizing resets the buffer's cycle state and marks the
    /// question as handed off via `response_sent`.
    pub fn observe(
        &self,
        buffer: &mut SessionBuffer,
        text: &str,
        now: Instant,
    ) -> Option<String> {
        let trigger_time = buffer.trigger_time?;
        let elapsed = now.duration_since(trigger_time);

        if elapsed <= self.window {
            buffer.collected_question.push(text.to_string());
        }

        if buffer.collected_question.is_empty() {
            // Idle trigger: nothing collected yet, keep waiting. Only the
            // expiry sweep clears a session stuck in this state.
            return None;
        }

        let window_elapsed = elapsed > self.window;
        let has_question_mark = text.contains('?');
        let hard_timeout = elapsed > self.window.mul_f64(1.5);

        if !(window_elapsed || has_question_mark || hard_timeout) {
            return None;
        }

        let mut question = buffer.collected_question.join(" ").trim().to_string();
        if !question.ends_with('?') {
            question.push('?');
        }

        buffer.reset();
        buffer.response_sent = true;

        Some(question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(5);

    fn triggered_buffer(now: Instant) -> SessionBuffer {
        let mut buffer = SessionBuffer::new("s1", now);
        buffer.trigger_detected = true;
        buffer.trigger_time = Some(now);
        buffer
    }

    #[test]
    fn appends_within_window() {
        let aggregator = QuestionAggregator::new(WINDOW);
        let t0 = Instant::now();
        let mut buffer = triggered_buffer(t0);

        let result = aggregator.observe(&mut buffer, "what is the weather", t0 + Duration::from_millis(4900));
        assert!(result.is_none());
        assert_eq!(buffer.collected_question, vec!["what is the weather"]);
    }

    #[test]
    fn late_segment_not_appended_but_finalizes_existing() {
        let aggregator = QuestionAggregator::new(WINDOW);
        let t0 = Instant::now();
        let mut buffer = triggered_buffer(t0);
        buffer.collected_question.push("what is the weather".to_string());

        let result = aggregator.observe(&mut buffer, "unrelated words", t0 + Duration::from_millis(5100));
        assert_eq!(result.as_deref(), Some("what is the weather?"));
    }

    #[test]
    fn question_mark_finalizes_immediately() {
        let aggregator = QuestionAggregator::new(WINDOW);
        let t0 = Instant::now();
        let mut buffer = triggered_buffer(t0);

        assert!(aggregator
            .observe(&mut buffer, "what is the weather", t0 + Duration::from_secs(1))
            .is_none());

        let result = aggregator.observe(&mut buffer, "today?", t0 + Duration::from_secs(2));
        assert_eq!(result.as_deref(), Some("what is the weather today?"));
    }

    #[test]
    fn finalize_adds_trailing_question_mark() {
        let aggregator = QuestionAggregator::new(WINDOW);
        let t0 = Instant::now();
        let mut buffer = triggered_buffer(t0);
        buffer.collected_question.push("tell me a joke".to_string());

        let result = aggregator.observe(&mut buffer, "filler", t0 + Duration::from_secs(6));
        assert_eq!(result.as_deref(), Some("tell me a joke?"));
    }

    #[test]
    fn finalize_resets_cycle_and_marks_response_sent() {
        let aggregator = QuestionAggregator::new(WINDOW);
        let t0 = Instant::now();
        let mut buffer = triggered_buffer(t0);

        aggregator.observe(&mut buffer, "what day is it?", t0 + Duration::from_secs(1));

        assert!(!buffer.trigger_detected);
        assert!(buffer.trigger_time.is_none());
        assert!(buffer.collected_question.is_empty());
        assert!(buffer.response_sent);
    }

    #[test]
    fn empty_collection_never_finalizes() {
        let aggregator = QuestionAggregator::new(WINDOW);
        let t0 = Instant::now();
        let mut buffer = triggered_buffer(t0);

        // Past every timeout, but nothing was ever collected: the buffer
        // stays triggered, waiting for content.
        let result = aggregator.observe(&mut buffer, "", t0 + Duration::from_secs(60));
        assert!(result.is_none());
        assert!(buffer.trigger_detected);
    }

    #[test]
    fn question_mark_alone_does_not_finalize_empty_buffer() {
        let aggregator = QuestionAggregator::new(WINDOW);
        let t0 = Instant::now();
        let mut buffer = triggered_buffer(t0);

        // Late arrival with a question mark but nothing collected: content
        // is dropped and there is nothing to finalize.
        let result = aggregator.observe(&mut buffer, "really?", t0 + Duration::from_secs(6));
        assert!(result.is_none());
        assert!(buffer.collected_question.is_empty());
    }
}
