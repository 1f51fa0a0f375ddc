// Key event types shared by the device observer, the global hook and the engine
// Also defines the feedback emission trait for testability

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Opaque, stable token identifying one physical keyboard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Key direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyDirection {
    Down,
    Up,
}

/// `KeyDown` notification emitted by the device observer
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceKeyEvent {
    pub key: String,
    pub virtual_key: u16,
    pub device: DeviceId,
    pub is_from_target_device: bool,
    pub timestamp: Instant,
}

/// Notification passed to global hook listeners.
///
/// Listeners set `consume` to drop the event before any application sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct HookKeyEvent {
    pub key: String,
    pub virtual_key: u16,
    pub scan_code: u16,
    pub direction: KeyDirection,
    pub timestamp: Instant,
    /// Synthesized by some process (including this one)
    pub injected: bool,
    pub consume: bool,
}

impl HookKeyEvent {
    pub fn new(key: impl Into<String>, virtual_key: u16, direction: KeyDirection) -> Self {
        Self {
            key: key.into(),
            virtual_key,
            scan_code: 0,
            direction,
            timestamp: Instant::now(),
            injected: false,
            consume: false,
        }
    }

    pub fn at(mut self, timestamp: Instant) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Live feedback for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum KeyFeedback {
    /// A key from the macro keyboard was seen
    #[serde(rename_all = "camelCase")]
    Detected {
        key: String,
        virtual_key: u16,
        /// Name of the mapped action, if any
        action_name: Option<String>,
    },
    /// Detection mode captured a keyboard
    #[serde(rename_all = "camelCase")]
    KeyboardDetected { device_id: DeviceId },
    /// Nothing happened for a while; show the waiting state
    Idle,
}

/// Trait for emitting feedback events
/// Allows mocking in tests while a window or log sink is used in production
pub trait FeedbackEmitter: Send + Sync {
    fn emit_feedback(&self, feedback: KeyFeedback);
}

/// Emitter that writes feedback to the log. Used by the headless host.
pub struct LogFeedbackEmitter;

impl FeedbackEmitter for LogFeedbackEmitter {
    fn emit_feedback(&self, feedback: KeyFeedback) {
        match feedback {
            KeyFeedback::Detected {
                key,
                virtual_key,
                action_name: Some(name),
            } => crate::info!("Key {} (VK: {}) -> {}", key, virtual_key, name),
            KeyFeedback::Detected {
                key, virtual_key, ..
            } => crate::info!("Key {} (VK: {}) has no mapping", key, virtual_key),
            KeyFeedback::KeyboardDetected { device_id } => {
                crate::info!("Macro keyboard detected: {}", device_id)
            }
            KeyFeedback::Idle => crate::debug!("Waiting for key press from macro keyboard"),
        }
    }
}

#[cfg(test)]
#[path = "events_test.rs"]
mod tests;
