//! Configuration management for the plugin host.
//!
//! Settings are read from a TOML file. A missing file is created with the
//! defaults so a first run leaves an editable config behind.

use crate::error::HostError;
use plugin_events::RegistryConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// What the host does when a plugin's registration is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationPolicy {
    /// Fail the plugin load and roll back its registrations
    #[default]
    Abort,
    /// Log the refused registration and keep loading
    SkipAndLog,
}

/// Top-level host configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Registry behaviour
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Plugin loading settings
    #[serde(default)]
    pub plugins: PluginSettings,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Plugin loading configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginSettings {
    /// If non-empty, only these plugins will be loaded
    #[serde(default)]
    pub enabled: Vec<String>,
    /// Reaction to a refused registration during plugin load
    #[serde(default)]
    pub registration_policy: RegistrationPolicy,
}

impl PluginSettings {
    pub fn is_enabled(&self, plugin_name: &str) -> bool {
        self.enabled.is_empty() || self.enabled.iter().any(|name| name == plugin_name)
    }
}

/// Logging system configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file, writing the defaults to `path`
    /// first if it does not exist.
    pub async fn load_from_file(path: &Path) -> Result<Self, HostError> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Checks values serde cannot: the log level and plugin names.
    pub fn validate(&self) -> Result<(), HostError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(HostError::Config(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            )));
        }

        if self.plugins.enabled.iter().any(String::is_empty) {
            return Err(HostError::Config(
                "Enabled plugin names cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
