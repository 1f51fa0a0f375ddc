// Timing constants for correlation, deduplication and synthesis
// Empirically tuned against OS input latency; exposed through the config file

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// All values are milliseconds (counts for the cleanup thresholds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tunables {
    /// Max delta between a device-scoped and a global event for the same keystroke
    pub correlation_window: u64,
    /// Window in which a repeated hook invocation for the same key and direction is dropped
    pub hook_dedup_window: u64,
    /// Single bounded wait inside the hook for a late device-scoped event
    pub delayed_wait: u64,
    /// Correlation table size above which stale entries are purged
    pub correlation_cleanup_threshold: usize,
    /// Dedup cache size above which stale entries are purged
    pub dedup_cleanup_threshold: usize,
    /// Hook callback duration above which a warning is logged
    pub hook_budget: u64,
    pub key_press_delay: u64,
    pub key_hold_delay: u64,
    pub text_char_delay: u64,
    pub command_timeout: u64,
    /// Delay before live feedback returns to idle
    pub feedback_reset: u64,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            correlation_window: 100,
            hook_dedup_window: 20,
            delayed_wait: 15,
            correlation_cleanup_threshold: 16,
            dedup_cleanup_threshold: 20,
            hook_budget: 50,
            key_press_delay: 10,
            key_hold_delay: 50,
            text_char_delay: 10,
            command_timeout: 5000,
            feedback_reset: 3000,
        }
    }
}

impl Tunables {
    pub fn correlation_window(&self) -> Duration {
        Duration::from_millis(self.correlation_window)
    }

    pub fn hook_dedup_window(&self) -> Duration {
        Duration::from_millis(self.hook_dedup_window)
    }

    pub fn delayed_wait(&self) -> Duration {
        Duration::from_millis(self.delayed_wait)
    }

    pub fn hook_budget(&self) -> Duration {
        Duration::from_millis(self.hook_budget)
    }

    pub fn key_press_delay(&self) -> Duration {
        Duration::from_millis(self.key_press_delay)
    }

    pub fn key_hold_delay(&self) -> Duration {
        Duration::from_millis(self.key_hold_delay)
    }

    pub fn text_char_delay(&self) -> Duration {
        Duration::from_millis(self.text_char_delay)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout)
    }

    pub fn feedback_reset(&self) -> Duration {
        Duration::from_millis(self.feedback_reset)
    }

    /// Check the constraints the hook relies on.
    ///
    /// The delayed wait must stay below the hook budget so a waiting callback
    /// cannot be mistaken for a stalled one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.correlation_window == 0 {
            return Err(ConfigError::InvalidTunables(
                "correlation_window must be greater than zero".to_string(),
            ));
        }
        if self.delayed_wait >= self.hook_budget {
            return Err(ConfigError::InvalidTunables(format!(
                "delayed_wait ({}ms) must be shorter than hook_budget ({}ms)",
                self.delayed_wait, self.hook_budget
            )));
        }
        if self.command_timeout == 0 {
            return Err(ConfigError::InvalidTunables(
                "command_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
