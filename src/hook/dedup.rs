// Duplicate suppression for the global hook
//
// The OS can invoke the hook more than once for a single physical key event
// (menu mode, fast typing). Repeats of the same key and direction inside the
// window reuse the first invocation's decision and never reach listeners.

use super::HookDecision;
use crate::events::KeyDirection;
use crate::keymap::normalize_key;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Accepted {
    at: Instant,
    decision: HookDecision,
}

pub struct DuplicateFilter {
    window: Duration,
    cleanup_threshold: usize,
    last: HashMap<(String, KeyDirection), Accepted>,
}

impl DuplicateFilter {
    pub fn new(window: Duration, cleanup_threshold: usize) -> Self {
        Self {
            window,
            cleanup_threshold,
            last: HashMap::new(),
        }
    }

    /// Decision of the accepted event this one duplicates, if any
    pub fn duplicate_of(&self, key: &str, direction: KeyDirection, now: Instant) -> Option<HookDecision> {
        let accepted = self.last.get(&(normalize_key(key), direction))?;
        (now.saturating_duration_since(accepted.at) < self.window).then_some(accepted.decision)
    }

    /// Remember an accepted event and the decision taken for it
    pub fn accept(&mut self, key: &str, direction: KeyDirection, now: Instant, decision: HookDecision) {
        self.last
            .insert((normalize_key(key), direction), Accepted { at: now, decision });

        if self.last.len() > self.cleanup_threshold {
            let window = self.window;
            self.last
                .retain(|_, accepted| now.saturating_duration_since(accepted.at) < window);
        }
    }

    pub fn len(&self) -> usize {
        self.last.len()
    }
}
