//! Configuration module for pictag
//!
//! Manages the database location and output defaults.
//! Configuration is stored in the user's config directory.

use config::{Config, ConfigError, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PictagConfig {
    /// Database directory; `<data_dir>/pictag/db` when unset
    #[serde(default)]
    pub database: Option<PathBuf>,

    /// Suppress informational output by default
    #[serde(default)]
    pub quiet: bool,

    /// Tracing filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Ask before rebuilding after a rule import
    #[serde(default = "default_true")]
    pub confirm_rebuild: bool,
}

fn default_log_level() -> String {
    "warn".to_string()
}

const fn default_true() -> bool {
    true
}

impl Default for PictagConfig {
    fn default() -> Self {
        Self {
            database: None,
            quiet: false,
            log_level: default_log_level(),
            confirm_rebuild: true,
        }
    }
}

impl PictagConfig {
    /// Get the path to the config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the system config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::Message("Could not determine config directory".to_string()))?;
        Ok(config_dir.join("pictag").join("config.toml"))
    }

    /// Load configuration from the default location, creating it if missing
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config file cannot be read, parsed, or created.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`; a missing file is created with defaults
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config file cannot be read, parsed, or created.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let default_config = Self::default();
            default_config.save_to(path)?;
            return Ok(default_config);
        }

        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .build()?;

        settings.try_deserialize()
    }

    /// Save configuration to `path`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config directory cannot be created, the configuration
    /// cannot be serialized to TOML, or the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::Message(format!("Failed to create config directory: {e}")))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Message(format!("Failed to serialize config: {e}")))?;

        fs::write(path, toml_string)
            .map_err(|e| ConfigError::Message(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Resolve the database directory, preferring an explicit override
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if no path is configured and the system data
    /// directory cannot be determined.
    pub fn database_path(&self, overridden: Option<&Path>) -> Result<PathBuf, ConfigError> {
        if let Some(path) = overridden.or(self.database.as_deref()) {
            return Ok(path.to_path_buf());
        }
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| ConfigError::Message("Could not determine data directory".to_string()))?;
        Ok(data_dir.join("pictag").join("db"))
    }
}
