//! Serializable chain descriptions for export and import.
//!
//! A [`ChainDescription`] is the engine's half of a preset: the ordered list
//! of effect types, parameter targets and bypass flags needed to rebuild a
//! chain. It carries no node ids and no DSP state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tonechain_core::ParamDescriptor;
use tonechain_effects::EffectType;

use crate::error::ControlError;
use crate::snapshot::MAX_CHAIN_LEN;

/// Check one parameter assignment against its effect's table.
///
/// Returns the parameter's index and descriptor. This is the validation every
/// value passes before it can reach the audio context. Stepped parameters
/// accept only their two settings, so the control-side record never holds a
/// value the audio side would snap.
pub fn validate_parameter(
    effect_type: EffectType,
    name: &str,
    value: f32,
) -> Result<(usize, &'static ParamDescriptor), ControlError> {
    let index = effect_type
        .param_index(name)
        .ok_or_else(|| ControlError::UnknownParameter {
            effect: effect_type,
            name: name.to_string(),
        })?;
    let descriptor = &effect_type.params()[index];
    if !value.is_finite() {
        return Err(ControlError::NonFiniteValue {
            name: name.to_string(),
        });
    }
    if !descriptor.contains(value) {
        return Err(ControlError::out_of_range(
            name,
            value,
            descriptor.min,
            descriptor.max,
        ));
    }
    if descriptor.is_stepped() && value != descriptor.min && value != descriptor.max {
        return Err(ControlError::SteppedValue {
            name: name.to_string(),
            value,
            min: descriptor.min,
            max: descriptor.max,
        });
    }
    Ok((index, descriptor))
}

/// One node of a chain description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescription {
    /// Effect hosted by the node.
    pub effect_type: EffectType,
    /// Parameter targets by name. Missing names take their defaults.
    #[serde(default)]
    pub parameters: BTreeMap<String, f32>,
    /// Whether the node is bypassed.
    #[serde(default)]
    pub bypassed: bool,
}

impl NodeDescription {
    /// A node with every parameter at its default.
    pub fn new(effect_type: EffectType) -> Self {
        let parameters = effect_type
            .params()
            .iter()
            .map(|d| (d.name.to_string(), d.default))
            .collect();
        Self {
            effect_type,
            parameters,
            bypassed: false,
        }
    }

    /// Set a parameter target.
    pub fn with_param(mut self, name: impl Into<String>, value: f32) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    /// Set the bypass flag.
    pub fn with_bypassed(mut self, bypassed: bool) -> Self {
        self.bypassed = bypassed;
        self
    }

    /// Parameter target by name, if present.
    pub fn param(&self, name: &str) -> Option<f32> {
        self.parameters.get(name).copied()
    }

    /// Check every parameter name and value.
    pub fn validate(&self) -> Result<(), ControlError> {
        for (name, &value) in &self.parameters {
            validate_parameter(self.effect_type, name, value)?;
        }
        Ok(())
    }

    /// Targets in parameter-table order, defaults filled in.
    pub fn targets(&self) -> Result<Vec<f32>, ControlError> {
        self.validate()?;
        Ok(self
            .effect_type
            .params()
            .iter()
            .map(|d| self.param(d.name).unwrap_or(d.default))
            .collect())
    }

    /// Same node with every parameter spelled out.
    pub(crate) fn completed(&self) -> Result<Self, ControlError> {
        let targets = self.targets()?;
        let parameters = self
            .effect_type
            .params()
            .iter()
            .zip(targets)
            .map(|(d, v)| (d.name.to_string(), v))
            .collect();
        Ok(Self {
            effect_type: self.effect_type,
            parameters,
            bypassed: self.bypassed,
        })
    }
}

/// Ordered description of a whole chain.
///
/// # Example
///
/// ```rust
/// use tonechain_effects::EffectType;
/// use tonechain_engine::{ChainDescription, NodeDescription};
///
/// let chain = ChainDescription::new()
///     .with_node(NodeDescription::new(EffectType::Boost).with_param("gain_db", 6.0))
///     .with_node(NodeDescription::new(EffectType::Reverb).with_bypassed(true));
///
/// assert_eq!(chain.len(), 2);
/// assert!(chain.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainDescription {
    /// Nodes in processing order.
    #[serde(default)]
    pub nodes: Vec<NodeDescription>,
}

impl ChainDescription {
    /// Empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node.
    pub fn with_node(mut self, node: NodeDescription) -> Self {
        self.nodes.push(node);
        self
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the chain has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Effect types in order.
    pub fn effect_types(&self) -> Vec<EffectType> {
        self.nodes.iter().map(|n| n.effect_type).collect()
    }

    /// Check the chain length and every node.
    pub fn validate(&self) -> Result<(), ControlError> {
        if self.nodes.len() > MAX_CHAIN_LEN {
            return Err(ControlError::ChainTooLong {
                len: self.nodes.len(),
                max: MAX_CHAIN_LEN,
            });
        }
        self.nodes.iter().try_for_each(NodeDescription::validate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_node_lists_every_default() {
        let node = NodeDescription::new(EffectType::Delay);
        assert_eq!(node.parameters.len(), 4);
        assert_eq!(node.param("delay_seconds"), Some(0.25));
        assert_eq!(node.param("tempo_sync"), Some(0.0));
        assert!(!node.bypassed);
    }

    #[test]
    fn validate_parameter_errors() {
        assert!(matches!(
            validate_parameter(EffectType::Boost, "Gain_DB", 1.0),
            Err(ControlError::UnknownParameter { .. })
        ));
        assert!(matches!(
            validate_parameter(EffectType::Boost, "gain_db", 31.0),
            Err(ControlError::ParameterOutOfRange { .. })
        ));
        assert!(matches!(
            validate_parameter(EffectType::Boost, "gain_db", f32::NAN),
            Err(ControlError::NonFiniteValue { .. })
        ));
        let (index, descriptor) = validate_parameter(EffectType::Boost, "tone", 0.2).unwrap();
        assert_eq!(index, 1);
        assert_eq!(descriptor.name, "tone");
    }

    #[test]
    fn stepped_parameter_takes_only_its_settings() {
        assert!(validate_parameter(EffectType::Delay, "tempo_sync", 0.0).is_ok());
        assert!(validate_parameter(EffectType::Delay, "tempo_sync", 1.0).is_ok());
        let err = validate_parameter(EffectType::Delay, "tempo_sync", 0.3).unwrap_err();
        assert!(matches!(err, ControlError::SteppedValue { value, .. } if value == 0.3));
        assert_eq!(err.to_string(), "parameter 'tempo_sync' takes 0 or 1, got 0.3");
        assert!(
            NodeDescription::new(EffectType::Delay)
                .with_param("tempo_sync", 0.5)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn targets_fill_defaults_in_table_order() {
        let node = NodeDescription {
            effect_type: EffectType::Distortion,
            parameters: BTreeMap::from([("level".to_string(), 0.2)]),
            bypassed: false,
        };
        assert_eq!(node.targets().unwrap(), vec![10.0, 0.5, 0.2]);
        assert_eq!(node.completed().unwrap().parameters.len(), 3);
    }

    #[test]
    fn chain_longer_than_limit_rejected() {
        let mut chain = ChainDescription::new();
        for _ in 0..=MAX_CHAIN_LEN {
            chain = chain.with_node(NodeDescription::new(EffectType::Boost));
        }
        assert!(matches!(
            chain.validate(),
            Err(ControlError::ChainTooLong { len: 9, max: 8 })
        ));
    }

    #[test]
    fn json_shape() {
        let chain = ChainDescription::new()
            .with_node(NodeDescription::new(EffectType::Boost).with_param("gain_db", 6.0));
        let json = serde_json::to_string(&chain).unwrap();
        assert!(json.contains(r#""effect_type":"boost""#), "got: {json}");

        let parsed: ChainDescription =
            serde_json::from_str(r#"{"nodes":[{"effect_type":"reverb"}]}"#).unwrap();
        assert_eq!(parsed.nodes[0].effect_type, EffectType::Reverb);
        assert!(parsed.nodes[0].parameters.is_empty());
        assert!(!parsed.nodes[0].bypassed);
    }
}
