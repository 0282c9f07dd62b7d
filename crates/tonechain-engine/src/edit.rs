//! Candidate chains built on control threads.
//!
//! A [`TopologyEdit`] starts as a copy of the controller's current chain.
//! Adding, removing and reordering only touches this copy; nothing reaches
//! the audio context until the edit is committed with
//! [`ChainController::enqueue_topology_swap`](crate::ChainController::enqueue_topology_swap),
//! which builds the new nodes and publishes the whole chain as one snapshot.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tonechain_effects::EffectType;

use crate::config::EngineConfig;
use crate::description::{ChainDescription, NodeDescription};
use crate::error::ControlError;
use crate::node::{EffectNode, NodeId};
use crate::snapshot::MAX_CHAIN_LEN;

/// A published node and the targets last sent to it.
#[derive(Debug, Clone)]
pub(crate) struct ChainEntry {
    pub(crate) node: Arc<EffectNode>,
    pub(crate) description: NodeDescription,
}

#[derive(Debug, Clone)]
enum EditEntry {
    /// A node already in the chain; keeps its DSP state.
    Existing(ChainEntry),
    /// A node built on commit.
    New {
        id: NodeId,
        description: NodeDescription,
    },
}

impl EditEntry {
    fn id(&self) -> NodeId {
        match self {
            Self::Existing(entry) => entry.node.id(),
            Self::New { id, .. } => *id,
        }
    }

    fn description(&self) -> &NodeDescription {
        match self {
            Self::Existing(entry) => &entry.description,
            Self::New { description, .. } => description,
        }
    }
}

/// Candidate chain topology.
#[derive(Debug, Clone)]
pub struct TopologyEdit {
    base_generation: u64,
    entries: Vec<EditEntry>,
}

impl TopologyEdit {
    pub(crate) fn from_chain(base_generation: u64, chain: &[ChainEntry]) -> Self {
        Self {
            base_generation,
            entries: chain.iter().cloned().map(EditEntry::Existing).collect(),
        }
    }

    /// Generation of the chain this edit was started from.
    pub fn base_generation(&self) -> u64 {
        self.base_generation
    }

    /// Number of nodes in the candidate.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the candidate is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Node ids in candidate order.
    pub fn ids(&self) -> Vec<NodeId> {
        self.entries.iter().map(EditEntry::id).collect()
    }

    /// Position of a node in the candidate.
    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.entries.iter().position(|e| e.id() == id)
    }

    /// Append a node at default parameters.
    pub fn add(&mut self, effect_type: EffectType) -> Result<NodeId, ControlError> {
        self.insert_description(self.len(), NodeDescription::new(effect_type))
    }

    /// Append a node with the given parameter targets and bypass flag.
    pub fn add_configured(
        &mut self,
        effect_type: EffectType,
        params: &BTreeMap<String, f32>,
        bypassed: bool,
    ) -> Result<NodeId, ControlError> {
        let mut description = NodeDescription::new(effect_type).with_bypassed(bypassed);
        description
            .parameters
            .extend(params.iter().map(|(k, &v)| (k.clone(), v)));
        self.insert_description(self.len(), description)
    }

    /// Append a described node. Missing parameters take their defaults.
    pub fn add_description(&mut self, description: NodeDescription) -> Result<NodeId, ControlError> {
        self.insert_description(self.len(), description)
    }

    /// Insert a default node at `index`, clamped to the end.
    pub fn insert(&mut self, index: usize, effect_type: EffectType) -> Result<NodeId, ControlError> {
        self.insert_description(index, NodeDescription::new(effect_type))
    }

    /// Insert a described node at `index`, clamped to the end.
    pub fn insert_description(
        &mut self,
        index: usize,
        description: NodeDescription,
    ) -> Result<NodeId, ControlError> {
        if self.len() >= MAX_CHAIN_LEN {
            return Err(ControlError::ChainTooLong {
                len: self.len() + 1,
                max: MAX_CHAIN_LEN,
            });
        }
        let description = description.completed()?;
        let id = NodeId::next();
        let index = index.min(self.len());
        self.entries.insert(index, EditEntry::New { id, description });
        Ok(id)
    }

    /// Remove a node. Returns `false` if it is not in the candidate.
    pub fn remove(&mut self, id: NodeId) -> bool {
        match self.position(id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Move a node to `new_index`, clamped to the end.
    pub fn move_node(&mut self, id: NodeId, new_index: usize) -> Result<(), ControlError> {
        let from = self.position(id).ok_or(ControlError::UnknownNode(id))?;
        let entry = self.entries.remove(from);
        let to = new_index.min(self.entries.len());
        self.entries.insert(to, entry);
        Ok(())
    }

    /// Put the nodes in exactly the given order.
    ///
    /// `order` must name every node of the candidate once.
    pub fn reorder(&mut self, order: &[NodeId]) -> Result<(), ControlError> {
        if order.len() != self.entries.len() {
            return Err(ControlError::InvalidOrder);
        }
        let mut seen = HashSet::with_capacity(order.len());
        if !order.iter().all(|id| seen.insert(*id) && self.position(*id).is_some()) {
            return Err(ControlError::InvalidOrder);
        }
        let mut remaining = std::mem::take(&mut self.entries);
        for id in order {
            if let Some(index) = remaining.iter().position(|e| e.id() == *id) {
                self.entries.push(remaining.swap_remove(index));
            }
        }
        Ok(())
    }

    /// Remove every node.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Description of the candidate as it stands.
    pub fn preview(&self) -> ChainDescription {
        ChainDescription {
            nodes: self
                .entries
                .iter()
                .map(|e| e.description().clone())
                .collect(),
        }
    }

    /// Build the entries to publish.
    ///
    /// Existing nodes take their descriptions from `current`, so parameter
    /// changes sent after the edit was started are kept. New nodes are
    /// constructed here and fade in. Removed nodes are faded out by the
    /// swap that publishes the result.
    pub(crate) fn build(
        self,
        current: &[ChainEntry],
        config: &EngineConfig,
    ) -> Result<Vec<ChainEntry>, ControlError> {
        self.entries
            .into_iter()
            .map(|entry| match entry {
                EditEntry::Existing(entry) => current
                    .iter()
                    .find(|c| c.node.id() == entry.node.id())
                    .cloned()
                    .ok_or(ControlError::UnknownNode(entry.node.id())),
                EditEntry::New { id, description } => {
                    let node = EffectNode::from_description(id, &description, config)?.with_fade_in();
                    Ok(ChainEntry {
                        node: Arc::new(node),
                        description,
                    })
                }
            })
            .collect()
    }
}
