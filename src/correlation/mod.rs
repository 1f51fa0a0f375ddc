//! Correlates device-scoped key presses with global hook events.
//!
//! The device observer knows which keyboard a key came from but cannot block
//! it; the global hook can block but does not know the keyboard. The observer
//! records every macro-keyboard key-down here, and the hook asks whether a
//! matching record exists before deciding to consume its event.
//!
//! Records are consumed at most once. A hook event for a mapped key with no
//! record yet waits once, for a bounded time, for a late observer event.

use crate::config::Tunables;
use crate::keymap::normalize_key;
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// How a hook event was matched to a device press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correlation {
    /// A record was already present
    Immediate,
    /// A record arrived during the bounded wait
    Delayed,
    /// No record; the key must pass through
    Miss,
}

impl Correlation {
    pub fn is_match(self) -> bool {
        !matches!(self, Correlation::Miss)
    }
}

#[derive(Default)]
struct CorrelationState {
    /// Normalized key -> last press seen from the macro keyboard
    entries: HashMap<String, Instant>,
    /// Normalized keys with an enabled mapping
    mapped_keys: HashSet<String>,
}

pub struct CorrelationEngine {
    state: Mutex<CorrelationState>,
    recorded: Condvar,
    window: Duration,
    delayed_wait: Duration,
    cleanup_threshold: usize,
}

impl CorrelationEngine {
    pub fn new(tunables: &Tunables) -> Self {
        Self::with_windows(
            tunables.correlation_window(),
            tunables.delayed_wait(),
            tunables.correlation_cleanup_threshold,
        )
    }

    pub fn with_windows(window: Duration, delayed_wait: Duration, cleanup_threshold: usize) -> Self {
        Self {
            state: Mutex::new(CorrelationState::default()),
            recorded: Condvar::new(),
            window,
            delayed_wait,
            cleanup_threshold,
        }
    }

    /// Record a key-down from the macro keyboard, overwriting any earlier record.
    pub fn record_device_press(&self, key: &str, at: Instant) {
        let key = normalize_key(key);
        {
            let mut state = self.state.lock();
            state.entries.insert(key, at);

            if state.entries.len() > self.cleanup_threshold {
                let window = self.window;
                let before = state.entries.len();
                state
                    .entries
                    .retain(|_, seen| at.saturating_duration_since(*seen) <= window);
                crate::trace!(
                    "Purged {} stale correlation entries",
                    before - state.entries.len()
                );
            }
        }
        self.recorded.notify_all();
    }

    /// Consume a record for `key` seen within the window of `now`, without waiting.
    pub fn try_consume(&self, key: &str, now: Instant) -> bool {
        let key = normalize_key(key);
        let mut state = self.state.lock();
        self.take_match(&mut state, &key, now)
    }

    /// Full hook-side check: immediate match, else one bounded wait when the key
    /// is mapped.
    pub fn correlate(&self, key: &str, now: Instant) -> Correlation {
        let key = normalize_key(key);
        let mut state = self.state.lock();

        if self.take_match(&mut state, &key, now) {
            return Correlation::Immediate;
        }
        if !state.mapped_keys.contains(&key) {
            return Correlation::Miss;
        }

        let deadline = Instant::now() + self.delayed_wait;
        loop {
            let timed_out = self.recorded.wait_until(&mut state, deadline).timed_out();
            if self.take_match(&mut state, &key, now) {
                return Correlation::Delayed;
            }
            if timed_out {
                return Correlation::Miss;
            }
        }
    }

    fn take_match(&self, state: &mut CorrelationState, key: &str, now: Instant) -> bool {
        // A record newer than `now` arrived late and still counts
        let fresh = state
            .entries
            .get(key)
            .is_some_and(|seen| now.saturating_duration_since(*seen) <= self.window);
        if fresh {
            state.entries.remove(key);
        }
        fresh
    }

    /// Replace the set of keys worth waiting for
    pub fn set_mapped_keys(&self, keys: HashSet<String>) {
        let mut state = self.state.lock();
        crate::debug!("Correlation tracks {} mapped keys", keys.len());
        state.mapped_keys = keys;
    }

    pub fn is_mapped(&self, key: &str) -> bool {
        self.state.lock().mapped_keys.contains(&normalize_key(key))
    }

    /// Drop all records, e.g. after the target keyboard changes
    pub fn clear(&self) {
        self.state.lock().entries.clear();
    }

    pub fn pending_entries(&self) -> usize {
        self.state.lock().entries.len()
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
