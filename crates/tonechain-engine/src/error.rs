//! Error types for control-side operations.

use thiserror::Error;
use tonechain_effects::EffectType;

use crate::node::NodeId;
use crate::state::EngineState;

/// Errors returned synchronously to control contexts.
///
/// None of these ever reach the audio context: every request is validated
/// before it is enqueued. A full update queue is not an error; enqueue
/// operations report it as `Ok(false)`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// The node id is not part of the chain.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// The effect has no parameter with this name.
    #[error("unknown parameter '{name}' for effect '{effect}'")]
    UnknownParameter {
        /// Effect type that was addressed.
        effect: EffectType,
        /// Requested parameter name.
        name: String,
    },

    /// The value lies outside the parameter's declared range.
    #[error("parameter '{name}' value {value} out of range [{min}, {max}]")]
    ParameterOutOfRange {
        /// Parameter name.
        name: String,
        /// Rejected value.
        value: f32,
        /// Minimum allowed value.
        min: f32,
        /// Maximum allowed value.
        max: f32,
    },

    /// NaN or infinite parameter value.
    #[error("parameter '{name}' value is not finite")]
    NonFiniteValue {
        /// Parameter name.
        name: String,
    },

    /// A switch parameter was given a value other than its two settings.
    #[error("parameter '{name}' takes {min} or {max}, got {value}")]
    SteppedValue {
        /// Parameter name.
        name: String,
        /// Rejected value.
        value: f32,
        /// Off setting.
        min: f32,
        /// On setting.
        max: f32,
    },

    /// The chain would exceed the node limit.
    #[error("chain of {len} effects exceeds the limit of {max}")]
    ChainTooLong {
        /// Requested chain length.
        len: usize,
        /// Maximum chain length.
        max: usize,
    },

    /// A node appears twice in a chain.
    #[error("node {0} appears more than once in the chain")]
    DuplicateNode(NodeId),

    /// A reorder list is not a permutation of the current chain.
    #[error("reorder must list every node of the chain exactly once")]
    InvalidOrder,

    /// The chain changed since this edit was started.
    #[error("edit is based on generation {base} but the chain is at generation {current}")]
    StaleEdit {
        /// Generation the edit was built from.
        base: u64,
        /// Generation of the most recently published chain.
        current: u64,
    },

    /// Lifecycle request not allowed from the current state.
    #[error("cannot move engine from {from} to {requested}")]
    InvalidState {
        /// State the engine was in.
        from: EngineState,
        /// State that was requested.
        requested: EngineState,
    },

    /// Engine configuration rejected.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// The audio side has been dropped; nothing will consume updates.
    #[error("engine is gone")]
    EngineGone,
}

impl ControlError {
    /// Create an out-of-range error from a parameter descriptor.
    pub fn out_of_range(name: impl Into<String>, value: f32, min: f32, max: f32) -> Self {
        ControlError::ParameterOutOfRange {
            name: name.into(),
            value,
            min,
            max,
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        ControlError::InvalidConfig(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_node_display() {
        let err = ControlError::UnknownNode(NodeId::from_raw(7));
        assert_eq!(err.to_string(), "unknown node #7");
    }

    #[test]
    fn out_of_range_factory_and_display() {
        let err = ControlError::out_of_range("gain_db", 40.0, -20.0, 30.0);
        assert!(matches!(err, ControlError::ParameterOutOfRange { ref name, .. } if name == "gain_db"));
        let msg = err.to_string();
        assert!(msg.contains("gain_db"), "got: {msg}");
        assert!(msg.contains("[-20, 30]"), "got: {msg}");
    }

    #[test]
    fn unknown_parameter_display_names_effect() {
        let err = ControlError::UnknownParameter {
            effect: EffectType::Delay,
            name: "drive_db".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unknown parameter 'drive_db' for effect 'delay'"
        );
    }

    #[test]
    fn invalid_state_display() {
        let err = ControlError::InvalidState {
            from: EngineState::Running,
            requested: EngineState::Starting,
        };
        assert_eq!(err.to_string(), "cannot move engine from running to starting");
    }

    #[test]
    fn chain_too_long_display() {
        let err = ControlError::ChainTooLong { len: 9, max: 8 };
        assert_eq!(err.to_string(), "chain of 9 effects exceeds the limit of 8");
    }
}
