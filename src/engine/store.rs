//! Concurrent session store with opportunistic idle expiry

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use super::buffer::SessionBuffer;

/// Shared handle to a single session's buffer
pub type SharedBuffer = Arc<Mutex<SessionBuffer>>;

/// Concurrent mapping from session id to its transcript buffer
///
/// The map lock is held only long enough to clone out an entry handle;
/// buffer mutation happens under the per-entry lock, so batches for
/// unrelated sessions never serialize on each other.
///
/// Expiry is opportunistic: every [`get_or_create`] checks whether the
/// sweep interval has elapsed and, if so, drops buffers idle past the
/// expiry threshold. There is no background timer. A sweep racing with a
/// concurrent access is harmless — the loser simply re-creates a fresh
/// buffer on its next call.
///
/// [`get_or_create`]: SessionStore::get_or_create
#[derive(Debug)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SharedBuffer>>,
    sweep_interval: Duration,
    session_expiry: Duration,
    last_sweep: Mutex<Instant>,
}

impl SessionStore {
    /// Create an empty store
    ///
    /// `sweep_interval` bounds how often the expiry sweep may run;
    /// `session_expiry` is the idle time after which a buffer is dropped.
    #[must_use]
    pub fn new(sweep_interval: Duration, session_expiry: Duration, now: Instant) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            sweep_interval,
            session_expiry,
            last_sweep: Mutex::new(now),
        }
    }

    /// Fetch the buffer for `session_id`, creating it if absent
    ///
    /// Bumps the buffer's `last_activity` to `now`. Absence is not an
    /// error, it is the creation trigger.
    #[must_use]
    pub fn get_or_create(&self, session_id: &str, now: Instant) -> SharedBuffer {
        self.maybe_sweep(now);

        let shared = {
            let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
            let entry = sessions.entry(session_id.to_string()).or_insert_with(|| {
                tracing::debug!(session_id, "created session buffer");
                Arc::new(Mutex::new(SessionBuffer::new(session_id, now)))
            });
            Arc::clone(entry)
        };

        shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last_activity = now;

        shared
    }

    /// Restore the session's trigger, question, and response fields
    ///
    /// `last_activity` is preserved. A no-op for unknown session ids.
    pub fn reset(&self, session_id: &str) {
        let shared = {
            let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
            sessions.get(session_id).map(Arc::clone)
        };

        if let Some(shared) = shared {
            shared
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .reset();
        }
    }

    /// Remove every buffer whose `last_activity` is older than `expiry`
    pub fn sweep_expired(&self, now: Instant, expiry: Duration) {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();

        sessions.retain(|_, shared| {
            let buffer = shared.lock().unwrap_or_else(PoisonError::into_inner);
            now.duration_since(buffer.last_activity) <= expiry
        });

        let removed = before - sessions.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = sessions.len(), "expired idle sessions");
        }
    }

    /// Number of live sessions
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True when no sessions are live
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run the expiry sweep when the configured interval has elapsed
    fn maybe_sweep(&self, now: Instant) {
        let due = {
            let mut last = self.last_sweep.lock().unwrap_or_else(PoisonError::into_inner);
            if now.duration_since(*last) > self.sweep_interval {
                *last = now;
                true
            } else {
                false
            }
        };

        if due {
            self.sweep_expired(now, self.session_expiry);
        }
    }
}
