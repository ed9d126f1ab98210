//! Wake-phrase trigger state machine
//!
//! A wake phrase may arrive whole in one transcript segment or split across
//! two segments near a sentence boundary ("...hey" / "omi ..."). The machine
//! bridges the split with a short-lived partial state instead of buffering
//! raw audio. All matching runs on normalized (lowercased, trimmed) text.

use std::time::{Duration, Instant};

use super::buffer::SessionBuffer;

/// Detection state, derived from buffer fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    /// No wake phrase seen
    Idle,
    /// First half of a split wake phrase seen, second half pending
    PartialPending,
    /// Wake phrase recognized, question aggregation in progress
    Triggered,
}

/// Wake-phrase configuration
#[derive(Debug, Clone)]
pub struct TriggerConfig {
    /// Complete wake phrases, matched anywhere in a segment
    pub phrases: Vec<String>,
    /// First halves of a split wake phrase, matched at segment end
    pub partial_first: Vec<String>,
    /// Second halves of a split wake phrase, matched anywhere in a segment
    pub partial_second: Vec<String>,
    /// Window within which a split phrase must complete
    pub partial_window: Duration,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            phrases: vec!["hey omi".to_string(), "hey, omi".to_string()],
            partial_first: vec!["hey".to_string(), "hey,".to_string()],
            partial_second: vec!["omi".to_string()],
            partial_window: Duration::from_secs(2),
        }
    }
}

/// Detects full and split wake phrases in normalized transcript text
#[derive(Debug, Clone)]
pub struct TriggerStateMachine {
    config: TriggerConfig,
}

impl TriggerStateMachine {
    /// Create a machine for the given phrase configuration
    ///
    /// Phrases are normalized to lowercase and trimmed so matching is
    /// case-insensitive regardless of how the config was written.
    #[must_use]
    pub fn new(config: TriggerConfig) -> Self {
        let normalize_all =
            |phrases: Vec<String>| -> Vec<String> {
                phrases
                    .into_iter()
                    .map(|p| p.trim().to_lowercase())
                    .filter(|p| !p.is_empty())
                    .collect()
            };

        let config = TriggerConfig {
            phrases: normalize_all(config.phrases),
            partial_first: normalize_all(config.partial_first),
            partial_second: normalize_all(config.partial_second),
            partial_window: config.partial_window,
        };

        tracing::debug!(phrases = ?config.phrases, "trigger machine initialized");
        Self { config }
    }

    /// Current detection state for `buffer`
    #[must_use]
    pub const fn state(buffer: &SessionBuffer) -> TriggerState {
        if buffer.trigger_detected {
            TriggerState::Triggered
        } else if buffer.partial_trigger {
            TriggerState::PartialPending
        } else {
            TriggerState::Idle
        }
    }

    /// Evaluate one normalized segment against the trigger rules
    ///
    /// Returns `true` when a trigger fired (full phrase, or a split phrase
    /// completed within the partial window). On fire the buffer starts a
    /// fresh aggregation cycle: `collected_question` is cleared and seeded
    /// with any text following the matched phrase.
    pub fn observe(&self, buffer: &mut SessionBuffer, text: &str, now: Instant) -> bool {
        // Full phrase anywhere in the segment wins regardless of state
        for phrase in &self.config.phrases {
            if let Some(idx) = text.find(phrase.as_str()) {
                let remainder = &text[idx + phrase.len()..];
                fire(buffer, remainder, now);
                tracing::info!(
                    session_id = %buffer.session_id,
                    phrase = %phrase,
                    "wake phrase detected"
                );
                return true;
            }
        }

        // Snapshot the partial state before this segment can refresh it, so
        // one segment cannot both start and complete a split phrase.
        let pending = buffer.partial_trigger
            && buffer
                .partial_trigger_time
                .is_some_and(|t| now.duration_since(t) <= self.config.partial_window);

        // A stale partial expires on the next inspection
        if buffer.partial_trigger && !pending {
            buffer.partial_trigger = false;
            buffer.partial_trigger_time = None;
            tracing::trace!(session_id = %buffer.session_id, "partial wake phrase expired");
        }

        if pending {
            for second in &self.config.partial_second {
                if let Some(idx) = text.find(second.as_str()) {
                    let remainder = &text[idx + second.len()..];
                    fire(buffer, remainder, now);
                    tracing::info!(
                        session_id = %buffer.session_id,
                        "split wake phrase completed"
                    );
                    return true;
                }
            }
        }

        // A segment ending with a first half arms the partial state
        if !buffer.trigger_detected
            && self
                .config
                .partial_first
                .iter()
                .any(|first| text.ends_with(first.as_str()))
        {
            buffer.partial_trigger = true;
            buffer.partial_trigger_time = Some(now);
            tracing::debug!(session_id = %buffer.session_id, "partial wake phrase pending");
        }

        false
    }
}

/// Start a fresh aggregation cycle on `buffer`
///
/// `seed` is the segment text following the matched phrase; when non-blank
/// it becomes the first collected fragment.
fn fire(buffer: &mut SessionBuffer, seed: &str, now: Instant) {
    buffer.trigger_detected = true;
    buffer.trigger_time = Some(now);
    buffer.collected_question.clear();
    buffer.response_sent = false;
    buffer.partial_trigger = false;
    buffer.partial_trigger_time = None;

    let seed = seed.trim();
    if !seed.is_empty() {
        buffer.collected_question.push(seed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> TriggerStateMachine {
        TriggerStateMachine::new(TriggerConfig::default())
    }

    fn buffer(now: Instant) -> SessionBuffer {
        SessionBuffer::new("s1", now)
    }

    #[test]
    fn phrases_are_normalized() {
        let machine = TriggerStateMachine::new(TriggerConfig {
            phrases: vec!["  Hey OMI  ".to_string()],
            ..TriggerConfig::default()
        });

        let now = Instant::now();
        let mut buffer = buffer(now);
        assert!(machine.observe(&mut buffer, "hey omi", now));
    }

    #[test]
    fn full_phrase_triggers_from_idle() {
        let now = Instant::now();
        let mut buffer = buffer(now);

        assert!(machine().observe(&mut buffer, "hey omi what time is it", now));
        assert_eq!(TriggerStateMachine::state(&buffer), TriggerState::Triggered);
        assert_eq!(buffer.trigger_time, Some(now));
        assert_eq!(buffer.collected_question, vec!["what time is it"]);
    }

    #[test]
    fn full_phrase_with_comma_variant_triggers() {
        let now = Instant::now();
        let mut buffer = buffer(now);

        assert!(machine().observe(&mut buffer, "hey, omi how far is the moon", now));
        assert_eq!(buffer.collected_question, vec!["how far is the moon"]);
    }

    #[test]
    fn bare_phrase_leaves_question_empty() {
        let now = Instant::now();
        let mut buffer = buffer(now);

        assert!(machine().observe(&mut buffer, "hey omi", now));
        assert!(buffer.collected_question.is_empty());
    }

    #[test]
    fn retrigger_clears_previously_collected_question() {
        let machine = machine();
        let now = Instant::now();
        let mut buffer = buffer(now);

        machine.observe(&mut buffer, "hey omi first question", now);
        assert_eq!(buffer.collected_question, vec!["first question"]);

        let later = now + Duration::from_secs(1);
        assert!(machine.observe(&mut buffer, "hey omi second question", later));
        assert_eq!(buffer.collected_question, vec!["second question"]);
        assert_eq!(buffer.trigger_time, Some(later));
    }

    #[test]
    fn split_phrase_completes_within_window() {
        let machine = machine();
        let now = Instant::now();
        let mut buffer = buffer(now);

        assert!(!machine.observe(&mut buffer, "so anyway hey", now));
        assert_eq!(
            TriggerStateMachine::state(&buffer),
            TriggerState::PartialPending
        );

        let later = now + Duration::from_millis(1500);
        assert!(machine.observe(&mut buffer, "omi what is the capital of france", later));
        assert_eq!(TriggerStateMachine::state(&buffer), TriggerState::Triggered);
        assert_eq!(
            buffer.collected_question,
            vec!["what is the capital of france"]
        );
    }

    #[test]
    fn split_phrase_expires_after_window() {
        let machine = machine();
        let now = Instant::now();
        let mut buffer = buffer(now);

        machine.observe(&mut buffer, "so anyway hey", now);

        let late = now + Duration::from_millis(2100);
        assert!(!machine.observe(&mut buffer, "omi what is the capital of france", late));
        assert_eq!(TriggerStateMachine::state(&buffer), TriggerState::Idle);
        assert!(!buffer.partial_trigger);
    }

    #[test]
    fn single_segment_cannot_start_and_complete_a_split() {
        let machine = machine();
        let now = Instant::now();
        let mut buffer = buffer(now);

        // Contains a second half and ends with a first half; without a
        // prior partial this only arms the partial state.
        assert!(!machine.observe(&mut buffer, "omi is great hey", now));
        assert_eq!(
            TriggerStateMachine::state(&buffer),
            TriggerState::PartialPending
        );
    }

    #[test]
    fn partial_not_armed_while_triggered() {
        let machine = machine();
        let now = Instant::now();
        let mut buffer = buffer(now);

        machine.observe(&mut buffer, "hey omi", now);
        let later = now + Duration::from_secs(1);
        assert!(!machine.observe(&mut buffer, "i said hey", later));
        assert!(!buffer.partial_trigger);
        assert_eq!(TriggerStateMachine::state(&buffer), TriggerState::Triggered);
    }
}
