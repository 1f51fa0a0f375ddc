//! Macro engine: decides, per keystroke, whether the macro keyboard pressed a
//! mapped key, swallows it, and hands the action to the worker.
//!
//! The engine listens to both input streams. Device-scoped key-downs from the
//! macro keyboard are recorded in the correlation table; global hook key-downs
//! are consumed only when they correlate with such a record and resolve to an
//! enabled mapping with an existing action. Anything that cannot be proven to
//! come from the macro keyboard passes through.

mod detection;
mod feedback;

pub use detection::DetectionHandler;
pub use feedback::FeedbackDisplay;

use crate::config::Configuration;
use crate::correlation::CorrelationEngine;
use crate::events::{DeviceKeyEvent, HookKeyEvent, KeyFeedback};
use crate::executor::ActionSink;
use crate::hook::HookListener;
use crate::keymap::normalize_key;
use crate::observer::DeviceKeyListener;
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct MacroEngine {
    /// Snapshot replaced wholesale on every configuration change
    config: RwLock<Arc<Configuration>>,
    correlation: CorrelationEngine,
    sink: Arc<dyn ActionSink>,
    feedback: Option<FeedbackDisplay>,
    hook_active: AtomicBool,
    /// Keys whose key-down was swallowed; their key-up is swallowed too
    consumed: Mutex<HashSet<String>>,
}

impl MacroEngine {
    pub fn new(config: &Configuration, sink: Arc<dyn ActionSink>) -> Self {
        let engine = Self {
            config: RwLock::new(Arc::new(config.clone())),
            correlation: CorrelationEngine::new(&config.tunables),
            sink,
            feedback: None,
            hook_active: AtomicBool::new(false),
            consumed: Mutex::new(HashSet::new()),
        };
        engine
            .correlation
            .set_mapped_keys(config.enabled_trigger_keys());
        engine
    }

    pub fn with_feedback(mut self, feedback: FeedbackDisplay) -> Self {
        self.feedback = Some(feedback);
        self
    }

    /// Take a new configuration snapshot and refresh the mapped-key set
    pub fn refresh(&self, config: &Configuration) {
        let device_changed = {
            let mut current = self.config.write();
            let changed = current.macro_keyboard_device_id != config.macro_keyboard_device_id;
            *current = Arc::new(config.clone());
            changed
        };
        if device_changed {
            self.correlation.clear();
        }
        self.correlation
            .set_mapped_keys(config.enabled_trigger_keys());
        crate::debug!(
            "Engine refreshed: {} mappings, enabled={}",
            config.mappings.len(),
            config.is_enabled
        );
    }

    pub fn snapshot(&self) -> Arc<Configuration> {
        self.config.read().clone()
    }

    /// Whether the global hook is installed; without it the observer path
    /// runs actions itself
    pub fn set_hook_active(&self, active: bool) {
        self.hook_active.store(active, Ordering::SeqCst);
    }

    pub fn correlation(&self) -> &CorrelationEngine {
        &self.correlation
    }
}

impl HookListener for MacroEngine {
    fn on_key_down(&self, event: &mut HookKeyEvent) {
        let config = self.snapshot();
        if !config.is_enabled {
            return;
        }

        let correlation = self.correlation.correlate(&event.key, event.timestamp);
        if !correlation.is_match() {
            return;
        }

        match config.resolve(&event.key) {
            Some((_, action)) => {
                event.consume = true;
                self.consumed.lock().insert(normalize_key(&event.key));
                crate::debug!(
                    "{} (VK {:#04x}, scan {:#04x}) from macro keyboard ({:?}) -> '{}'",
                    event.key,
                    event.virtual_key,
                    event.scan_code,
                    correlation,
                    action.name
                );
                self.sink.dispatch(action.clone());
            }
            None => crate::trace!("{} from macro keyboard has no mapping", event.key),
        }
    }

    fn on_key_up(&self, event: &mut HookKeyEvent) {
        if self.consumed.lock().remove(&normalize_key(&event.key)) {
            event.consume = true;
        }
    }
}

impl DeviceKeyListener for MacroEngine {
    fn on_key_down(&self, event: &DeviceKeyEvent) {
        if !event.is_from_target_device {
            return;
        }
        let config = self.snapshot();
        if !config.is_enabled {
            return;
        }

        self.correlation.record_device_press(&event.key, event.timestamp);

        let resolved = config.resolve(&event.key);
        if let Some(feedback) = &self.feedback {
            feedback.show(KeyFeedback::Detected {
                key: event.key.clone(),
                virtual_key: event.virtual_key,
                action_name: resolved.map(|(_, action)| action.name.clone()),
            });
        }

        if !self.hook_active.load(Ordering::SeqCst) {
            if let Some((_, action)) = resolved {
                crate::debug!("Hook inactive, running '{}' without blocking {}", action.name, event.key);
                self.sink.dispatch(action.clone());
            }
        }
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
