//! Preset file format and operations.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tonechain_engine::{ChainController, ChainDescription, MAX_CHAIN_LEN};

use crate::effect_config::EffectConfig;
use crate::error::{ConfigError, ensure_parent};
use crate::validation::{
    ValidationError, ValidationResult, validate_description, validate_name, validate_tags,
};

/// A named, tagged effect chain.
///
/// Presets are stored as TOML files (or JSON for interchange) holding the
/// chain in order plus some metadata.
///
/// # TOML Format
///
/// ```toml
/// name = "Crunch"
/// description = "Edge-of-breakup rhythm tone"
/// version = "1.0.0"
/// tags = ["rhythm", "drive"]
///
/// [[effects]]
/// type = "distortion"
/// [effects.params]
/// drive_db = "14dB"
/// tone = "0.55"
///
/// [[effects]]
/// type = "!reverb"
/// [effects.params]
/// wet_level = "20%"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Preset {
    /// Name of the preset, 1 to 100 characters.
    pub name: String,

    /// Optional description, at most 500 characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Optional author credit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Preset format version.
    #[serde(default = "default_version")]
    pub version: String,

    /// Free-form search tags matching `[A-Za-z0-9_-]+`.
    #[serde(default)]
    pub tags: Vec<String>,

    /// When the preset was first created.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    /// When the preset was last changed.
    #[serde(default = "Utc::now")]
    pub modified_at: DateTime<Utc>,

    /// Effects in chain order.
    #[serde(default)]
    pub effects: Vec<EffectConfig>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

impl Preset {
    /// Create a new empty preset stamped with the current time.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            description: None,
            author: None,
            version: default_version(),
            tags: Vec::new(),
            created_at: now,
            modified_at: now,
            effects: Vec::new(),
        }
    }

    /// Snapshot an engine chain description as a preset.
    pub fn from_chain(name: impl Into<String>, chain: &ChainDescription) -> Self {
        Self::new(name).with_effects(chain.nodes.iter().map(EffectConfig::from_description))
    }

    /// Snapshot the chain a controller currently holds.
    pub fn capture(name: impl Into<String>, controller: &ChainController) -> Self {
        Self::from_chain(name, &controller.export_state())
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Add a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Add an effect to the end of the chain.
    pub fn with_effect(mut self, effect: EffectConfig) -> Self {
        self.effects.push(effect);
        self
    }

    /// Add multiple effects to the end of the chain.
    pub fn with_effects(mut self, effects: impl IntoIterator<Item = EffectConfig>) -> Self {
        self.effects.extend(effects);
        self
    }

    /// Check metadata and every effect entry, reporting all problems at once.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();
        if let Err(e) = validate_name(&self.name) {
            errors.push(e);
        }
        if let Some(description) = &self.description
            && let Err(e) = validate_description(description)
        {
            errors.push(e);
        }
        errors.extend(validate_tags(&self.tags));
        if self.effects.len() > MAX_CHAIN_LEN {
            errors.push(ValidationError::TooManyEffects {
                len: self.effects.len(),
                max: MAX_CHAIN_LEN,
            });
        }
        for effect in &self.effects {
            effect.check(&mut errors);
        }
        ValidationError::from_list(errors)
    }

    /// Validate and convert to a chain description the engine can import.
    pub fn to_chain(&self) -> Result<ChainDescription, ConfigError> {
        self.validate()?;
        let mut chain = ChainDescription::new();
        for effect in &self.effects {
            chain = chain.with_node(effect.to_description()?);
        }
        Ok(chain)
    }

    /// Publish this preset's chain through `controller`.
    ///
    /// Returns `Ok(false)` when the update queue was full and nothing changed.
    pub fn apply(&self, controller: &ChainController) -> Result<bool, ConfigError> {
        let chain = self.to_chain()?;
        let published = controller.load_state(&chain)?;
        tracing::info!(
            preset = %self.name,
            effects = chain.len(),
            published,
            "applied preset"
        );
        Ok(published)
    }

    /// Load and validate a preset from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let preset = Self::from_toml(&content)?;
        preset.validate()?;
        tracing::info!(
            path = %path.display(),
            preset = %preset.name,
            effects = preset.len(),
            "loaded preset"
        );
        Ok(preset)
    }

    /// Validate and save the preset to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        self.validate()?;
        ensure_parent(path)?;
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        tracing::info!(path = %path.display(), preset = %self.name, "saved preset");
        Ok(())
    }

    /// Parse a preset from a TOML string. Does not validate.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Convert the preset to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Parse a preset from JSON. Does not validate.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Convert the preset to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Mark the preset as modified now.
    pub fn touch(&mut self) {
        self.modified_at = Utc::now();
    }

    /// Whether the preset carries `tag`, ignoring ASCII case.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Case-insensitive substring search over name, description and tags.
    ///
    /// An empty query matches everything.
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&query)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&query))
            || self.tags.iter().any(|t| t.to_lowercase().contains(&query))
    }

    /// Number of effects in the preset.
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Whether the preset holds no effects.
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Iterate over the effects in chain order.
    pub fn iter(&self) -> impl Iterator<Item = &EffectConfig> {
        self.effects.iter()
    }

    /// Effect types for display, `!`-prefixed when bypassed.
    pub fn effect_types(&self) -> Vec<String> {
        self.effects.iter().map(EffectConfig::display_type).collect()
    }
}

impl Default for Preset {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonechain_effects::EffectType;
    use tonechain_engine::NodeDescription;

    fn crunch() -> Preset {
        Preset::new("Crunch")
            .with_description("Edge-of-breakup rhythm tone")
            .with_tag("rhythm")
            .with_effect(EffectConfig::new("boost").with_param("gain_db", "6dB"))
            .with_effect(EffectConfig::new("distortion").with_param("drive_db", "14"))
            .with_effect(EffectConfig::new("!reverb").with_param("wet_level", "20%"))
    }

    #[test]
    fn new_preset_defaults() {
        let preset = Preset::new("Empty");
        assert_eq!(preset.version, "1.0.0");
        assert_eq!(preset.created_at, preset.modified_at);
        assert!(preset.is_empty());
        assert!(preset.validate().is_ok());
    }

    #[test]
    fn minimal_toml_fills_defaults() {
        let preset = Preset::from_toml("name = \"Bare\"").unwrap();
        assert_eq!(preset.version, "1.0.0");
        assert!(preset.tags.is_empty());
        assert!(preset.effects.is_empty());
    }

    #[test]
    fn from_toml_reads_effects() {
        let toml = r#"
name = "Test"
author = "someone"
tags = ["lead"]

[[effects]]
type = "delay"
[effects.params]
delay_seconds = "350ms"
tempo_sync = "on"

[[effects]]
type = "reverb"
bypassed = true
"#;
        let preset = Preset::from_toml(toml).unwrap();
        assert_eq!(preset.author.as_deref(), Some("someone"));
        assert_eq!(preset.effect_types(), ["delay", "!reverb"]);

        let chain = preset.to_chain().unwrap();
        assert_eq!(chain.effect_types(), [EffectType::Delay, EffectType::Reverb]);
        assert_eq!(chain.nodes[0].param("delay_seconds"), Some(0.35));
        assert_eq!(chain.nodes[0].param("tempo_sync"), Some(1.0));
        assert!(chain.nodes[1].bypassed);
    }

    #[test]
    fn toml_and_json_round_trip() {
        let preset = crunch().with_author("tester");
        let toml = preset.to_toml().unwrap();
        assert!(toml.contains("type = \"distortion\""));
        assert!(toml.contains("gain_db = \"6dB\""));
        assert_eq!(Preset::from_toml(&toml).unwrap(), preset);

        let json = preset.to_json().unwrap();
        assert!(json.contains("\"created_at\""));
        assert_eq!(Preset::from_json(&json).unwrap(), preset);
    }

    #[test]
    fn validate_reports_every_problem() {
        let preset = Preset::new("")
            .with_description("x".repeat(501))
            .with_tag("bad tag")
            .with_tag("ok")
            .with_tag("ok")
            .with_effect(EffectConfig::new("wah"));
        let errors = preset.validate().unwrap_err().flatten();
        assert_eq!(errors.len(), 5, "{errors:?}");
    }

    #[test]
    fn too_many_effects_rejected() {
        let preset = Preset::new("Long")
            .with_effects((0..9).map(|_| EffectConfig::new("boost")));
        assert_eq!(
            preset.validate(),
            Err(ValidationError::TooManyEffects { len: 9, max: 8 })
        );
        assert!(matches!(
            preset.to_chain(),
            Err(ConfigError::Validation(ValidationError::TooManyEffects { .. }))
        ));
    }

    #[test]
    fn chain_round_trip() {
        let chain = ChainDescription::new()
            .with_node(NodeDescription::new(EffectType::Boost).with_param("gain_db", 4.5))
            .with_node(NodeDescription::new(EffectType::Reverb).with_bypassed(true));
        let preset = Preset::from_chain("Captured", &chain);
        assert_eq!(preset.effect_types(), ["boost", "!reverb"]);
        assert_eq!(preset.to_chain().unwrap(), chain);
    }

    #[test]
    fn touch_moves_modified_only() {
        let mut preset = crunch();
        let created = preset.created_at;
        preset.touch();
        assert_eq!(preset.created_at, created);
        assert!(preset.modified_at >= created);
    }

    #[test]
    fn tags_and_search() {
        let preset = crunch();
        assert!(preset.has_tag("RHYTHM"));
        assert!(!preset.has_tag("lead"));
        assert!(preset.matches_search("crun"));
        assert!(preset.matches_search("BREAKUP"));
        assert!(preset.matches_search("rhy"));
        assert!(preset.matches_search("  "));
        assert!(!preset.matches_search("ambient"));
    }
}
