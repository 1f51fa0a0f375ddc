// Configuration store - owns the configuration document and persists every change

use super::{Action, Configuration, Mapping};
use crate::events::DeviceId;
use chrono::Utc;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Error types for configuration operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Trigger key is empty
    #[error("Trigger key cannot be empty")]
    EmptyTriggerKey,
    /// Action name is empty
    #[error("Action name cannot be empty")]
    EmptyActionName,
    /// Tunables are inconsistent
    #[error("Invalid tunables: {0}")]
    InvalidTunables(String),
    /// Entry not found
    #[error("No entry with ID {0}")]
    NotFound(Uuid),
    /// Could not determine where the config file lives
    #[error("Could not determine config directory")]
    NoConfigDir,
    /// Failed to persist the configuration
    #[error("Failed to persist configuration: {0}")]
    PersistenceError(String),
    /// Failed to load the configuration
    #[error("Failed to load configuration: {0}")]
    LoadError(String),
}

/// Loads, mutates and atomically saves the configuration file
#[derive(Debug)]
pub struct ConfigStore {
    config: Configuration,
    config_path: PathBuf,
}

impl ConfigStore {
    pub fn new(config_path: PathBuf) -> Self {
        Self {
            config: Configuration::default(),
            config_path,
        }
    }

    /// Store at `<config dir>/macroboard/config.json`
    pub fn with_default_path() -> Result<Self, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::new(dir.join("macroboard").join("config.json")))
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Load the configuration file. A missing file yields the defaults.
    pub fn load(&mut self) -> Result<(), ConfigError> {
        crate::debug!("Loading configuration from {:?}", self.config_path);

        if !self.config_path.exists() {
            crate::info!("No configuration file found, using defaults");
            self.config = Configuration::default();
            return Ok(());
        }

        let content = fs::read_to_string(&self.config_path)
            .map_err(|e| ConfigError::LoadError(e.to_string()))?;
        let config: Configuration =
            serde_json::from_str(&content).map_err(|e| ConfigError::LoadError(e.to_string()))?;
        config.tunables.validate()?;

        for mapping in &config.mappings {
            if config.action(mapping.action_id).is_none() {
                crate::warn!(
                    "Mapping for key {} references missing action {}",
                    mapping.trigger_key,
                    mapping.action_id
                );
            }
        }

        crate::info!(
            "Loaded configuration: {} actions, {} mappings",
            config.actions.len(),
            config.mappings.len()
        );
        self.config = config;
        Ok(())
    }

    /// Persist using atomic write (temp file + rename)
    pub fn save(&mut self) -> Result<(), ConfigError> {
        self.config.last_modified = Some(Utc::now());

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::PersistenceError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(&self.config)
            .map_err(|e| ConfigError::PersistenceError(e.to_string()))?;

        let temp_path = self.config_path.with_extension("tmp");
        {
            let mut file = File::create(&temp_path).map_err(|e| {
                ConfigError::PersistenceError(format!("Failed to create temp file: {}", e))
            })?;
            file.write_all(content.as_bytes())
                .map_err(|e| ConfigError::PersistenceError(format!("Failed to write: {}", e)))?;
            file.sync_all()
                .map_err(|e| ConfigError::PersistenceError(format!("Failed to sync: {}", e)))?;
        }

        fs::rename(&temp_path, &self.config_path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            ConfigError::PersistenceError(format!("Failed to rename: {}", e))
        })?;

        crate::debug!("Configuration saved to {:?}", self.config_path);
        Ok(())
    }

    /// Insert an action, or replace the one with the same ID
    pub fn add_or_update_action(&mut self, action: Action) -> Result<(), ConfigError> {
        if action.name.trim().is_empty() {
            return Err(ConfigError::EmptyActionName);
        }

        match self.config.actions.iter_mut().find(|a| a.id == action.id) {
            Some(existing) => {
                crate::debug!("Updating action '{}' ({})", action.name, action.id);
                *existing = action;
            }
            None => {
                crate::debug!("Adding action '{}' ({})", action.name, action.id);
                self.config.actions.push(action);
            }
        }
        self.save()
    }

    /// Remove an action and every mapping that references it
    pub fn remove_action(&mut self, id: Uuid) -> Result<(), ConfigError> {
        let before = self.config.actions.len();
        self.config.actions.retain(|a| a.id != id);
        if self.config.actions.len() == before {
            return Err(ConfigError::NotFound(id));
        }

        let mappings_before = self.config.mappings.len();
        self.config.mappings.retain(|m| m.action_id != id);
        let removed = mappings_before - self.config.mappings.len();
        if removed > 0 {
            crate::info!("Removed {} mappings that used action {}", removed, id);
        }
        self.save()
    }

    /// Insert a mapping, or replace the one with the same ID
    pub fn add_or_update_mapping(&mut self, mapping: Mapping) -> Result<(), ConfigError> {
        if mapping.trigger_key.trim().is_empty() {
            return Err(ConfigError::EmptyTriggerKey);
        }

        match self.config.action(mapping.action_id) {
            Some(action) => crate::debug!(
                "Mapping key {} to action '{}'",
                mapping.trigger_key,
                action.name
            ),
            None => crate::warn!(
                "Mapping for key {} references missing action {}",
                mapping.trigger_key,
                mapping.action_id
            ),
        }

        match self.config.mappings.iter_mut().find(|m| m.id == mapping.id) {
            Some(existing) => *existing = mapping,
            None => self.config.mappings.push(mapping),
        }
        self.save()
    }

    pub fn remove_mapping(&mut self, id: Uuid) -> Result<(), ConfigError> {
        let before = self.config.mappings.len();
        self.config.mappings.retain(|m| m.id != id);
        if self.config.mappings.len() == before {
            return Err(ConfigError::NotFound(id));
        }
        self.save()
    }

    pub fn set_macro_keyboard(&mut self, device_id: DeviceId) -> Result<(), ConfigError> {
        crate::info!("Macro keyboard set to {}", device_id);
        self.config.macro_keyboard_device_id = Some(device_id);
        self.save()
    }

    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), ConfigError> {
        crate::info!("Macro keyboard {}", if enabled { "enabled" } else { "disabled" });
        self.config.is_enabled = enabled;
        self.save()
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
