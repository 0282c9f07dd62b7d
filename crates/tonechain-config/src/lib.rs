//! Presets and settings files for the tonechain engine.
//!
//! # Features
//!
//! - **Presets**: named, tagged effect chains stored as TOML (or JSON)
//! - **Validation**: effect types and parameter ranges checked against the
//!   effect tables, plus preset metadata rules
//! - **Factory Presets**: a small built-in catalogue
//! - **Library**: a directory of user presets with search and bulk JSON
//!   import/export
//! - **Settings**: engine configuration and log level from one TOML file
//!
//! # Example
//!
//! ```rust
//! use tonechain_config::{EffectConfig, Preset, get_factory_preset};
//! use tonechain_engine::{Engine, EngineConfig};
//!
//! let (_engine, controller) = Engine::new(EngineConfig::default()).unwrap();
//!
//! let crunch = get_factory_preset("crunch").unwrap();
//! assert!(crunch.apply(&controller).unwrap());
//! assert_eq!(controller.len(), 3);
//!
//! let mine = Preset::capture("My Crunch", &controller)
//!     .with_tag("rhythm")
//!     .with_effect(EffectConfig::new("delay").with_param("delay_seconds", "110ms"));
//! assert!(mine.validate().is_ok());
//! ```

mod effect_config;
mod error;
mod library;
mod preset;
mod settings;

/// Preset validation.
pub mod validation;

/// Factory presets bundled with the library.
pub mod factory_presets;

pub use effect_config::{EffectConfig, parse_param_value};
pub use error::ConfigError;
pub use factory_presets::{
    FACTORY_PRESET_NAMES, factory_presets, get_factory_preset, is_factory_preset,
};
pub use library::{ImportPolicy, ImportReport, PresetLibrary, preset_slug};
pub use preset::Preset;
pub use settings::Settings;
pub use validation::{
    MAX_DESCRIPTION_LEN, MAX_NAME_LEN, ValidationError, ValidationResult, validate_description,
    validate_effect, validate_name, validate_param, validate_tag, validate_tags,
};
