//! Preset validation.
//!
//! Parameter names and ranges come from the effect tables in
//! `tonechain-effects`, through the same check the engine applies before an
//! update is enqueued. Preset metadata (name, description, tags) has its own
//! rules here.
//!
//! # Example
//!
//! ```rust
//! use tonechain_config::{validate_effect, validate_tag};
//!
//! assert!(validate_effect("reverb").is_ok());
//! assert!(validate_effect("chorus").is_err());
//! assert!(validate_tag("high-gain").is_ok());
//! assert!(validate_tag("high gain").is_err());
//! ```

use thiserror::Error;
use tonechain_effects::EffectType;
use tonechain_engine::{ControlError, validate_parameter};

/// Longest accepted preset name, in characters.
pub const MAX_NAME_LEN: usize = 100;

/// Longest accepted preset description, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Unknown effect type.
    #[error("unknown effect type: {0}")]
    UnknownEffect(String),

    /// Unknown parameter name.
    #[error("unknown parameter '{param}' for effect '{effect}'")]
    UnknownParameter {
        /// Name of the effect.
        effect: String,
        /// Name of the unrecognized parameter.
        param: String,
    },

    /// Parameter value out of range.
    #[error("parameter '{param}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Name of the parameter.
        param: String,
        /// The value that was out of range.
        value: f32,
        /// Minimum allowed value.
        min: f32,
        /// Maximum allowed value.
        max: f32,
    },

    /// Parameter string could not be read as a number.
    #[error("invalid format for parameter '{param}': {reason}")]
    InvalidFormat {
        /// Name of the parameter.
        param: String,
        /// Description of the format error.
        reason: String,
    },

    /// Name empty or too long.
    #[error("preset name must be 1 to {max} characters, got {len}")]
    InvalidName {
        /// Length of the rejected name in characters.
        len: usize,
        /// Upper bound.
        max: usize,
    },

    /// Description too long.
    #[error("description is {len} characters, maximum is {max}")]
    DescriptionTooLong {
        /// Length of the rejected description in characters.
        len: usize,
        /// Upper bound.
        max: usize,
    },

    /// Tag contains characters outside `[A-Za-z0-9_-]`, or is empty.
    #[error("invalid tag '{0}': use letters, digits, '_' or '-'")]
    InvalidTag(String),

    /// Same tag listed twice.
    #[error("duplicate tag '{0}'")]
    DuplicateTag(String),

    /// More effects than a chain can hold.
    #[error("preset has {len} effects, a chain holds at most {max}")]
    TooManyEffects {
        /// Number of effects in the preset.
        len: usize,
        /// Upper bound.
        max: usize,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

impl ValidationError {
    /// Fold a list of errors into one: `Ok` when empty, the error itself when
    /// single, [`ValidationError::Multiple`] otherwise.
    pub fn from_list(mut errors: Vec<ValidationError>) -> ValidationResult<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ValidationError::Multiple(errors)),
        }
    }

    /// The individual errors, with nested lists flattened.
    pub fn flatten(self) -> Vec<ValidationError> {
        match self {
            ValidationError::Multiple(errors) => {
                errors.into_iter().flat_map(ValidationError::flatten).collect()
            }
            other => vec![other],
        }
    }
}

/// Resolve an effect key, ignoring ASCII case.
pub fn validate_effect(effect_type: &str) -> ValidationResult<EffectType> {
    EffectType::from_name(effect_type.trim())
        .ok_or_else(|| ValidationError::UnknownEffect(effect_type.to_string()))
}

/// Check a parameter name and value against the effect's table.
pub fn validate_param(effect: EffectType, param: &str, value: f32) -> ValidationResult<()> {
    validate_parameter(effect, param, value)
        .map(|_| ())
        .map_err(|e| match e {
            ControlError::UnknownParameter { effect, name } => ValidationError::UnknownParameter {
                effect: effect.name().to_string(),
                param: name,
            },
            ControlError::ParameterOutOfRange {
                name,
                value,
                min,
                max,
            } => ValidationError::OutOfRange {
                param: name,
                value,
                min,
                max,
            },
            other => ValidationError::InvalidFormat {
                param: param.to_string(),
                reason: other.to_string(),
            },
        })
}

/// Preset names are 1 to [`MAX_NAME_LEN`] characters after trimming.
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let len = name.trim().chars().count();
    if (1..=MAX_NAME_LEN).contains(&len) {
        Ok(())
    } else {
        Err(ValidationError::InvalidName {
            len,
            max: MAX_NAME_LEN,
        })
    }
}

/// Descriptions hold at most [`MAX_DESCRIPTION_LEN`] characters.
pub fn validate_description(description: &str) -> ValidationResult<()> {
    let len = description.chars().count();
    if len <= MAX_DESCRIPTION_LEN {
        Ok(())
    } else {
        Err(ValidationError::DescriptionTooLong {
            len,
            max: MAX_DESCRIPTION_LEN,
        })
    }
}

/// Tags match `[A-Za-z0-9_-]+`.
pub fn validate_tag(tag: &str) -> ValidationResult<()> {
    let valid = !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidTag(tag.to_string()))
    }
}

/// Every tag valid, none repeated. Reports each problem once.
pub fn validate_tags(tags: &[String]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (i, tag) in tags.iter().enumerate() {
        if let Err(e) = validate_tag(tag) {
            errors.push(e);
        } else if tags[..i].iter().filter(|t| *t == tag).count() == 1 {
            errors.push(ValidationError::DuplicateTag(tag.clone()));
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effects_resolve_case_insensitively() {
        assert_eq!(validate_effect("Delay"), Ok(EffectType::Delay));
        assert_eq!(
            validate_effect("flanger"),
            Err(ValidationError::UnknownEffect("flanger".into()))
        );
    }

    #[test]
    fn params_checked_against_effect_table() {
        assert!(validate_param(EffectType::Boost, "gain_db", 6.0).is_ok());
        assert!(matches!(
            validate_param(EffectType::Boost, "drive_db", 6.0),
            Err(ValidationError::UnknownParameter { ref effect, .. }) if effect == "boost"
        ));
        assert!(matches!(
            validate_param(EffectType::Delay, "feedback", 0.99),
            Err(ValidationError::OutOfRange { max, .. }) if max == 0.95
        ));
        assert!(matches!(
            validate_param(EffectType::Delay, "mix", f32::NAN),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(validate_param(EffectType::Delay, "tempo_sync", 1.0).is_ok());
        assert!(matches!(
            validate_param(EffectType::Delay, "tempo_sync", 0.5),
            Err(ValidationError::InvalidFormat { ref param, ref reason })
                if param == "tempo_sync" && reason.contains("takes 0 or 1")
        ));
    }

    #[test]
    fn name_length_bounds() {
        assert!(validate_name("Crunch").is_ok());
        assert!(validate_name(&"x".repeat(100)).is_ok());
        assert_eq!(
            validate_name("   "),
            Err(ValidationError::InvalidName { len: 0, max: 100 })
        );
        assert!(validate_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn description_length_counts_characters() {
        assert!(validate_description(&"é".repeat(500)).is_ok());
        assert!(validate_description(&"é".repeat(501)).is_err());
    }

    #[test]
    fn tag_pattern() {
        for ok in ["rock", "high-gain", "lead_2"] {
            assert!(validate_tag(ok).is_ok(), "{ok}");
        }
        for bad in ["", "two words", "amp!", "clé"] {
            assert!(validate_tag(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn duplicate_tags_reported_once() {
        let tags: Vec<String> = ["rock", "lead", "rock", "rock"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(
            validate_tags(&tags),
            vec![ValidationError::DuplicateTag("rock".into())]
        );
    }

    #[test]
    fn from_list_folds() {
        assert_eq!(ValidationError::from_list(vec![]), Ok(()));
        let one = ValidationError::InvalidTag("a b".into());
        assert_eq!(ValidationError::from_list(vec![one.clone()]), Err(one.clone()));
        let many = ValidationError::from_list(vec![one.clone(), one.clone()]).unwrap_err();
        assert!(many.to_string().starts_with("multiple validation errors"));
        assert_eq!(many.flatten().len(), 2);
    }
}
