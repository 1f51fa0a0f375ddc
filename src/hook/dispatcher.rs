//! Platform-independent half of the global hook callback.
//!
//! The OS procedure converts its raw structure to a `HookKeyEvent` and hands it
//! here; everything that decides whether to swallow the event lives in this
//! file so it can be exercised without installing a real hook.

use super::dedup::DuplicateFilter;
use super::{HookDecision, HookListener};
use crate::config::Tunables;
use crate::events::{HookKeyEvent, KeyDirection};
use parking_lot::{Mutex, RwLock};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct HookDispatcher {
    listeners: RwLock<Vec<Arc<dyn HookListener>>>,
    dedup: Mutex<DuplicateFilter>,
    budget: Duration,
}

impl HookDispatcher {
    pub fn new(tunables: &Tunables) -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
            dedup: Mutex::new(DuplicateFilter::new(
                tunables.hook_dedup_window(),
                tunables.dedup_cleanup_threshold,
            )),
            budget: tunables.hook_budget(),
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn HookListener>) {
        self.listeners.write().push(listener);
    }

    /// Run one hook invocation to a decision.
    ///
    /// Never panics: a panicking listener is logged and the remaining
    /// listeners still run.
    pub fn dispatch(&self, mut event: HookKeyEvent) -> HookDecision {
        let start = Instant::now();

        if event.injected {
            crate::trace!("Injected {} passes through", event.key);
            return HookDecision::PassThrough;
        }

        if let Some(decision) =
            self.dedup
                .lock()
                .duplicate_of(&event.key, event.direction, event.timestamp)
        {
            crate::debug!(
                "Duplicate {:?} for {} ignored, repeating {:?}",
                event.direction,
                event.key,
                decision
            );
            return decision;
        }

        let listeners = self.listeners.read().clone();
        for listener in &listeners {
            let result = catch_unwind(AssertUnwindSafe(|| match event.direction {
                KeyDirection::Down => listener.on_key_down(&mut event),
                KeyDirection::Up => listener.on_key_up(&mut event),
            }));
            if let Err(e) = result {
                crate::error!("Hook listener panicked on {}: {:?}", event.key, e);
            }
        }

        let decision = if event.consume {
            HookDecision::Consume
        } else {
            HookDecision::PassThrough
        };
        self.dedup
            .lock()
            .accept(&event.key, event.direction, event.timestamp, decision);

        let elapsed = start.elapsed();
        if elapsed > self.budget {
            crate::warn!(
                "Keyboard hook took {:?} for {} - SLOW! The OS may remove a hook that stalls",
                elapsed,
                event.key
            );
        }

        decision
    }
}

#[cfg(test)]
#[path = "dispatcher_test.rs"]
mod tests;
