//! Host settings file.
//!
//! ```toml
//! log_level = "debug"
//!
//! [engine]
//! sample_rate = 48000
//! block_size = 128
//! ramp_ms = 10.0
//! ```
//!
//! Every key is optional; missing keys take the engine defaults.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tonechain_engine::EngineConfig;

use crate::error::{ConfigError, ensure_parent};
use crate::validation::ValidationError;

/// Engine configuration plus logging verbosity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Log level name (`trace`, `debug`, `info`, `warn`, `error`).
    pub log_level: String,
    /// Engine configuration.
    pub engine: EngineConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            engine: EngineConfig::default(),
        }
    }
}

impl Settings {
    /// Parsed log level.
    pub fn level(&self) -> Result<tracing::Level, ConfigError> {
        tracing::Level::from_str(self.log_level.trim()).map_err(|_| {
            ValidationError::InvalidFormat {
                param: "log_level".to_string(),
                reason: format!("'{}' is not a log level", self.log_level),
            }
            .into()
        })
    }

    /// Check the log level and the engine configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.level()?;
        self.engine.validate()?;
        Ok(())
    }

    /// Load and validate settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let settings = Self::from_toml(&content)?;
        settings.validate()?;
        tracing::info!(
            path = %path.display(),
            sample_rate = settings.engine.sample_rate,
            block_size = settings.engine.block_size,
            "loaded settings"
        );
        Ok(settings)
    }

    /// Save settings to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        ensure_parent(path)?;
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        tracing::info!(path = %path.display(), "saved settings");
        Ok(())
    }

    /// Parse settings from a TOML string. Does not validate.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Convert settings to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
