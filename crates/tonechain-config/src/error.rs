//! Error types for preset and settings files.

use std::path::PathBuf;

use thiserror::Error;
use tonechain_engine::ControlError;

use crate::validation::ValidationError;

/// Errors raised while reading, writing or applying presets and settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create the parent directory of a file
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON interchange failed in either direction
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No factory preset with that name
    #[error("preset not found: {0}")]
    PresetNotFound(String),

    /// A library already holds a preset with that name, or its file
    #[error("preset already exists: {0}")]
    DuplicatePreset(String),

    /// Preset content broke a rule
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The engine refused the chain or configuration
    #[error("engine rejected configuration: {0}")]
    Engine(#[from] ControlError),
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Create a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }
}

/// Create the parent directory of `path` if it does not exist yet.
pub(crate) fn ensure_parent(path: &std::path::Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
    }
    Ok(())
}
