//! Update messages carried from control contexts to the audio context.

use std::sync::Arc;

use crate::node::NodeId;
use crate::snapshot::ChainSnapshot;

/// A validated change request.
///
/// Messages are built only by the controller after validation, so the audio
/// context can apply them without checking names or ranges again.
#[derive(Debug, Clone)]
pub enum UpdateMessage {
    /// Move a parameter's ramp target.
    ParameterChange {
        /// Target node.
        node_id: NodeId,
        /// Parameter name, for diagnostics.
        name: &'static str,
        /// Parameter index in the effect's table.
        index: usize,
        /// New target value.
        target: f32,
    },
    /// Enable or bypass a node.
    BypassToggle {
        /// Target node.
        node_id: NodeId,
        /// New bypass flag.
        bypassed: bool,
    },
    /// Replace the live chain.
    TopologySwap {
        /// Fully built replacement snapshot.
        snapshot: Arc<ChainSnapshot>,
    },
}

impl UpdateMessage {
    /// Node addressed by this message, if any.
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            Self::ParameterChange { node_id, .. } | Self::BypassToggle { node_id, .. } => {
                Some(*node_id)
            }
            Self::TopologySwap { .. } => None,
        }
    }

    /// Short name of the message kind, for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ParameterChange { .. } => "parameter_change",
            Self::BypassToggle { .. } => "bypass_toggle",
            Self::TopologySwap { .. } => "topology_swap",
        }
    }
}
