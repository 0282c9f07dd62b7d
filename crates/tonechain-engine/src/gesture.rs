//! Drag-to-reorder gesture.
//!
//! A UI drag produces a stream of pointer deltas. None of them should reach
//! the audio context: the gesture accumulates rows locally, shows a preview,
//! and publishes one topology swap when the node is dropped.

use crate::controller::ChainController;
use crate::error::ControlError;
use crate::node::NodeId;

/// Where a gesture stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GesturePhase {
    /// No drag in progress.
    #[default]
    Idle,
    /// A node is being dragged.
    Dragging {
        /// Dragged node.
        node: NodeId,
        /// Index the drag started from.
        origin: usize,
        /// Index the node would land on if dropped now.
        current: usize,
    },
}

/// Control-side state machine for reordering one node by dragging.
///
/// # Example
///
/// ```rust
/// use tonechain_effects::EffectType;
/// use tonechain_engine::{ChainDescription, Engine, EngineConfig, NodeDescription, ReorderGesture};
///
/// let chain = ChainDescription::new()
///     .with_node(NodeDescription::new(EffectType::Boost))
///     .with_node(NodeDescription::new(EffectType::Delay))
///     .with_node(NodeDescription::new(EffectType::Reverb));
/// let (_engine, controller) = Engine::with_chain(EngineConfig::default(), &chain).unwrap();
/// let ids = controller.node_ids();
///
/// let mut gesture = ReorderGesture::new();
/// gesture.begin(&controller, ids[0]).unwrap();
/// gesture.drag_by(1);
/// gesture.drag_by(5); // clamped to the last row
/// assert_eq!(gesture.preview(), vec![ids[1], ids[2], ids[0]]);
///
/// assert!(gesture.drop_gesture(&controller).unwrap());
/// assert_eq!(controller.node_ids(), vec![ids[1], ids[2], ids[0]]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReorderGesture {
    phase: GesturePhase,
    order: Vec<NodeId>,
}

impl ReorderGesture {
    /// Idle gesture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    /// Returns `true` while a node is being dragged.
    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, GesturePhase::Dragging { .. })
    }

    /// Pick up `node`. Any drag already in progress is discarded.
    pub fn begin(&mut self, controller: &ChainController, node: NodeId) -> Result<(), ControlError> {
        let order = controller.node_ids();
        let origin = order
            .iter()
            .position(|&id| id == node)
            .ok_or(ControlError::UnknownNode(node))?;
        self.order = order;
        self.phase = GesturePhase::Dragging {
            node,
            origin,
            current: origin,
        };
        Ok(())
    }

    /// Move the dragged node by `delta_rows`, clamped to the chain.
    ///
    /// Returns the new landing index, or `None` when idle.
    pub fn drag_by(&mut self, delta_rows: isize) -> Option<usize> {
        let last = self.order.len().saturating_sub(1);
        match &mut self.phase {
            GesturePhase::Idle => None,
            GesturePhase::Dragging { current, .. } => {
                *current = current.saturating_add_signed(delta_rows).min(last);
                Some(*current)
            }
        }
    }

    /// Candidate order with the dragged node at its landing index.
    pub fn preview(&self) -> Vec<NodeId> {
        let mut order = self.order.clone();
        if let GesturePhase::Dragging {
            origin, current, ..
        } = self.phase
        {
            let node = order.remove(origin);
            order.insert(current, node);
        }
        order
    }

    /// Drop the node, publishing one topology swap.
    ///
    /// Dropping where the drag started, or while idle, publishes nothing and
    /// returns `Ok(true)`. If the queue is full the gesture stays in progress
    /// and `Ok(false)` is returned so the drop can be retried.
    pub fn drop_gesture(&mut self, controller: &ChainController) -> Result<bool, ControlError> {
        let GesturePhase::Dragging {
            node,
            origin,
            current,
        } = self.phase
        else {
            return Ok(true);
        };
        if origin == current {
            self.cancel();
            return Ok(true);
        }
        match controller.move_effect(node, current) {
            Ok(false) => Ok(false),
            result => {
                self.cancel();
                result
            }
        }
    }

    /// Abandon the drag.
    pub fn cancel(&mut self) {
        self.phase = GesturePhase::Idle;
        self.order.clear();
    }
}
