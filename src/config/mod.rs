// Configuration model - actions, mappings and the macro keyboard selection

mod store;
mod tunables;

pub use store::{ConfigError, ConfigStore};
pub use tunables::Tunables;

use crate::events::DeviceId;
use crate::keymap::normalize_key;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// What an action does when its mapping fires
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    /// Press keys in order, release in reverse (e.g. `["Ctrl", "Shift", "F3"]`)
    KeyCombination { keys: Vec<String> },
    /// Type literal text
    SendText { text: String },
    /// Run a shell command
    RunCommand { command: String },
}

impl ActionKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::KeyCombination { .. } => "key_combination",
            ActionKind::SendText { .. } => "send_text",
            ActionKind::RunCommand { .. } => "run_command",
        }
    }
}

/// A user-defined action
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Action {
    pub id: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub kind: ActionKind,
    #[serde(default = "default_true")]
    pub is_enabled: bool,
}

impl Action {
    pub fn new(name: impl Into<String>, kind: ActionKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            is_enabled: true,
        }
    }

    pub fn key_combination(name: impl Into<String>, keys: &[&str]) -> Self {
        Self::new(
            name,
            ActionKind::KeyCombination {
                keys: keys.iter().map(|k| k.to_string()).collect(),
            },
        )
    }

    pub fn send_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, ActionKind::SendText { text: text.into() })
    }

    pub fn run_command(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self::new(
            name,
            ActionKind::RunCommand {
                command: command.into(),
            },
        )
    }
}

/// Binds a key on a specific keyboard to an action
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Mapping {
    pub id: Uuid,
    /// Logical key name (e.g. "F1", "D1", "NumPad1")
    pub trigger_key: String,
    pub action_id: Uuid,
    pub keyboard_device_id: DeviceId,
    #[serde(default = "default_true")]
    pub is_enabled: bool,
}

impl Mapping {
    pub fn new(trigger_key: impl Into<String>, action_id: Uuid, device: DeviceId) -> Self {
        Self {
            id: Uuid::new_v4(),
            trigger_key: trigger_key.into(),
            action_id,
            keyboard_device_id: device,
            is_enabled: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// The persisted document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Configuration {
    pub macro_keyboard_device_id: Option<DeviceId>,
    /// Master switch; when off every key passes through
    pub is_enabled: bool,
    pub actions: Vec<Action>,
    pub mappings: Vec<Mapping>,
    pub tunables: Tunables,
    pub last_modified: Option<DateTime<Utc>>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            macro_keyboard_device_id: None,
            is_enabled: true,
            actions: Vec::new(),
            mappings: Vec::new(),
            tunables: Tunables::default(),
            last_modified: None,
        }
    }
}

impl Configuration {
    pub fn action(&self, id: Uuid) -> Option<&Action> {
        self.actions.iter().find(|a| a.id == id)
    }

    /// The first enabled mapping for `key` on the configured macro keyboard.
    ///
    /// Key comparison is case-insensitive. Returns nothing while no macro
    /// keyboard is configured.
    pub fn get_mapping_for_key(&self, key: &str) -> Option<&Mapping> {
        let device = self.macro_keyboard_device_id.as_ref()?;
        let key = normalize_key(key);
        self.mappings.iter().find(|m| {
            m.is_enabled && normalize_key(&m.trigger_key) == key && &m.keyboard_device_id == device
        })
    }

    /// Mapping plus its action, when both exist
    pub fn resolve(&self, key: &str) -> Option<(&Mapping, &Action)> {
        let mapping = self.get_mapping_for_key(key)?;
        let action = self.action(mapping.action_id)?;
        Some((mapping, action))
    }

    /// Normalized trigger keys of every mapping that can currently fire
    pub fn enabled_trigger_keys(&self) -> HashSet<String> {
        let Some(device) = self.macro_keyboard_device_id.as_ref() else {
            return HashSet::new();
        };
        self.mappings
            .iter()
            .filter(|m| m.is_enabled && &m.keyboard_device_id == device)
            .map(|m| normalize_key(&m.trigger_key))
            .collect()
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
