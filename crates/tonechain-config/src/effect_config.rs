//! One effect entry of a preset.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tonechain_engine::NodeDescription;

use crate::validation::{ValidationError, ValidationResult, validate_effect, validate_param};

/// Configuration for a single effect in a preset.
///
/// Parameter values are strings so preset files can carry units
/// (`"6dB"`, `"120ms"`, `"35%"`); see [`parse_param_value`]. An effect can be
/// bypassed by prefixing its type with `!` (`"!reverb"`).
///
/// # Example
///
/// ```rust
/// use tonechain_config::EffectConfig;
///
/// let config = EffectConfig::new("!delay")
///     .with_param("delay_seconds", "120ms")
///     .with_param("mix", "25%");
///
/// assert_eq!(config.effect_type, "delay");
/// assert!(config.bypassed);
/// assert_eq!(config.parse_param("delay_seconds"), Some(0.12));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EffectConfig {
    /// Effect key (`"boost"`, `"distortion"`, `"delay"`, `"reverb"`).
    #[serde(rename = "type")]
    pub effect_type: String,

    /// Whether the effect is bypassed.
    #[serde(default)]
    pub bypassed: bool,

    /// Parameter values by name. Missing names take their defaults.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl EffectConfig {
    /// Create a new effect configuration.
    ///
    /// If the type starts with `!`, the effect will be marked as bypassed.
    pub fn new(effect_type: impl Into<String>) -> Self {
        let type_str = effect_type.into();
        let (effect_type, bypassed) = match type_str.strip_prefix('!') {
            Some(stripped) => (stripped.to_string(), true),
            None => (type_str, false),
        };
        Self {
            effect_type,
            bypassed,
            params: BTreeMap::new(),
        }
    }

    /// Describe an engine node, with every value written as a plain number.
    pub fn from_description(node: &NodeDescription) -> Self {
        Self {
            effect_type: node.effect_type.name().to_string(),
            bypassed: node.bypassed,
            params: node
                .parameters
                .iter()
                .map(|(name, value)| (name.clone(), value.to_string()))
                .collect(),
        }
    }

    /// Add a parameter to the configuration.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Set whether the effect is bypassed.
    pub fn with_bypass(mut self, bypassed: bool) -> Self {
        self.bypassed = bypassed;
        self
    }

    /// Raw parameter string.
    pub fn get_param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Parameter parsed with [`parse_param_value`].
    pub fn parse_param(&self, key: &str) -> Option<f32> {
        parse_param_value(self.params.get(key)?)
    }

    /// Effect key without a bypass prefix.
    pub fn canonical_type(&self) -> &str {
        self.effect_type.trim_start_matches('!')
    }

    /// Effect key for display, `!`-prefixed when bypassed.
    pub fn display_type(&self) -> String {
        if self.is_bypassed() {
            format!("!{}", self.canonical_type())
        } else {
            self.canonical_type().to_string()
        }
    }

    /// Bypassed either by flag or by `!` prefix.
    pub fn is_bypassed(&self) -> bool {
        self.bypassed || self.effect_type.starts_with('!')
    }

    /// Convert to an engine node description, reporting every problem found.
    pub fn to_description(&self) -> ValidationResult<NodeDescription> {
        let mut errors = Vec::new();
        let node = self.check(&mut errors);
        ValidationError::from_list(errors)?;
        node.ok_or_else(|| ValidationError::UnknownEffect(self.effect_type.clone()))
    }

    /// Resolve the entry, pushing each problem onto `errors`.
    pub(crate) fn check(&self, errors: &mut Vec<ValidationError>) -> Option<NodeDescription> {
        let effect = match validate_effect(self.canonical_type()) {
            Ok(effect) => effect,
            Err(e) => {
                errors.push(e);
                return None;
            }
        };
        let before = errors.len();
        let mut node = NodeDescription::new(effect).with_bypassed(self.is_bypassed());
        for (name, raw) in &self.params {
            let Some(value) = parse_param_value(raw) else {
                errors.push(ValidationError::InvalidFormat {
                    param: name.clone(),
                    reason: format!("cannot parse '{raw}' as a number"),
                });
                continue;
            };
            match validate_param(effect, name, value) {
                Ok(()) => node = node.with_param(name.clone(), value),
                Err(e) => errors.push(e),
            }
        }
        (errors.len() == before).then_some(node)
    }
}

/// Parse a parameter value string into an f32.
///
/// Supports:
/// - Plain numbers: `"0.5"`, `"-6"`
/// - Percentages: `"35%"` (divided by 100)
/// - Decibels: `"6dB"` (kept in dB; gain parameters are declared in dB)
/// - Time in ms: `"120ms"` (converted to seconds)
/// - Time in s: `"0.25s"`
/// - Switches: `"on"` / `"off"`, `"true"` / `"false"`
pub fn parse_param_value(value: &str) -> Option<f32> {
    let value = value.trim();

    match value.to_ascii_lowercase().as_str() {
        "on" | "true" => return Some(1.0),
        "off" | "false" => return Some(0.0),
        _ => {}
    }

    if let Some(pct) = value.strip_suffix('%') {
        return pct.trim().parse::<f32>().ok().map(|v| v / 100.0);
    }

    if let Some(db) = value
        .strip_suffix("dB")
        .or_else(|| value.strip_suffix("db"))
    {
        return db.trim().parse::<f32>().ok();
    }

    if let Some(ms) = value.strip_suffix("ms") {
        return ms.trim().parse::<f32>().ok().map(|v| v / 1000.0);
    }

    if let Some(s) = value.strip_suffix('s') {
        return s.trim().parse::<f32>().ok();
    }

    value.parse::<f32>().ok().filter(|v| v.is_finite())
}
