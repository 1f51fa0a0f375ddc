// Action executor - turns a mapped action into synthesized input or a process

mod command;
mod dispatcher;
mod injector;
mod synth;

pub use command::run_command;
pub use dispatcher::{ActionDispatcher, ActionSink};
pub use injector::{platform_injector, KeyInjector, UnsupportedInjector};
#[cfg(target_os = "windows")]
pub use injector::SendInputInjector;
pub use synth::SynthTiming;

use crate::config::{Action, ActionKind, Tunables};
use crate::keymap::{is_secure_attention_sequence, vk_from_name};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Typed error codes for action execution failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionErrorCode {
    /// Payload is empty or malformed
    InvalidPayload,
    /// The OS refused synthesized input
    InjectionFailed,
    /// Command could not be started
    LaunchFailed,
    /// Command exited unsuccessfully
    CommandFailed,
    /// Command did not exit in time
    Timeout,
    /// Blocking worker panicked
    TaskPanic,
}

impl std::fmt::Display for ActionErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ActionErrorCode::InvalidPayload => "INVALID_PAYLOAD",
            ActionErrorCode::InjectionFailed => "INJECTION_FAILED",
            ActionErrorCode::LaunchFailed => "LAUNCH_FAILED",
            ActionErrorCode::CommandFailed => "COMMAND_FAILED",
            ActionErrorCode::Timeout => "TIMEOUT",
            ActionErrorCode::TaskPanic => "TASK_PANIC",
        };
        write!(f, "{}", s)
    }
}

/// Error during action execution
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ActionError {
    pub code: ActionErrorCode,
    pub message: String,
}

impl ActionError {
    pub fn new(code: ActionErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// What happened when an action was executed
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Executed,
    /// Nothing to do (disabled, or nothing resolvable in the payload)
    Skipped { reason: String },
    Failed(ActionError),
}

/// Executes actions; best effort, never panics or returns an error to the caller
pub struct ActionExecutor {
    injector: Arc<dyn KeyInjector>,
    timing: SynthTiming,
    command_timeout: Duration,
}

impl ActionExecutor {
    pub fn new(injector: Arc<dyn KeyInjector>, tunables: &Tunables) -> Self {
        Self {
            injector,
            timing: SynthTiming {
                key_press_delay: tunables.key_press_delay(),
                key_hold_delay: tunables.key_hold_delay(),
                text_char_delay: tunables.text_char_delay(),
            },
            command_timeout: tunables.command_timeout(),
        }
    }

    pub async fn execute(&self, action: &Action) -> ActionOutcome {
        if !action.is_enabled {
            crate::debug!("Action '{}' is disabled, skipping", action.name);
            return ActionOutcome::Skipped {
                reason: "action is disabled".to_string(),
            };
        }

        crate::info!("Executing {} action '{}'", action.kind.label(), action.name);

        let outcome = match &action.kind {
            ActionKind::KeyCombination { keys } => self.key_combination(keys).await,
            ActionKind::SendText { text } => self.send_text(text).await,
            ActionKind::RunCommand { command } => {
                match run_command(command, self.command_timeout).await {
                    Ok(()) => ActionOutcome::Executed,
                    Err(e) => ActionOutcome::Failed(e),
                }
            }
        };

        match &outcome {
            ActionOutcome::Executed => crate::debug!("Action '{}' completed", action.name),
            ActionOutcome::Skipped { reason } => {
                crate::warn!("Action '{}' skipped: {}", action.name, reason)
            }
            ActionOutcome::Failed(e) => crate::error!("Action '{}' failed: {}", action.name, e),
        }
        outcome
    }

    async fn key_combination(&self, names: &[String]) -> ActionOutcome {
        let mut keys = Vec::with_capacity(names.len());
        for name in names {
            match vk_from_name(name) {
                Some(vk) => keys.push(vk),
                None => crate::warn!("Unknown key '{}' in combination, skipping", name),
            }
        }

        if keys.is_empty() {
            return ActionOutcome::Skipped {
                reason: "no recognized keys in combination".to_string(),
            };
        }
        if is_secure_attention_sequence(&keys) {
            crate::warn!("Ctrl+Alt+Delete is reserved by Windows and will likely be ignored");
        }

        let injector = self.injector.clone();
        let timing = self.timing;
        self.blocking(move || synth::press_combination(injector.as_ref(), &keys, &timing))
            .await
    }

    async fn send_text(&self, text: &str) -> ActionOutcome {
        if text.is_empty() {
            return ActionOutcome::Skipped {
                reason: "text is empty".to_string(),
            };
        }

        let injector = self.injector.clone();
        let timing = self.timing;
        let text = text.to_string();
        self.blocking(move || {
            let typed = synth::type_text(injector.as_ref(), &text, &timing)?;
            crate::debug!("Typed {} of {} characters", typed, text.chars().count());
            Ok(())
        })
        .await
    }

    async fn blocking<F>(&self, work: F) -> ActionOutcome
    where
        F: FnOnce() -> Result<(), ActionError> + Send + 'static,
    {
        match tokio::task::spawn_blocking(work).await {
            Ok(Ok(())) => ActionOutcome::Executed,
            Ok(Err(e)) => ActionOutcome::Failed(e),
            Err(e) => ActionOutcome::Failed(ActionError::new(
                ActionErrorCode::TaskPanic,
                format!("synthesis task failed: {}", e),
            )),
        }
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
