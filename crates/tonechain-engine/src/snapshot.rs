//! Immutable chain snapshots.
//!
//! A [`ChainSnapshot`] is the chain topology at one point in time: an ordered
//! list of shared node references tagged with a generation number. Snapshots
//! are never mutated after construction. Topology changes build a new
//! snapshot on a control thread and hand it to the audio context, which
//! swaps it in with a single pointer replace.
//!
//! A swap that drops active nodes goes through a fading snapshot first. It
//! keeps the removed nodes at their old positions, listed as outgoing, and
//! carries the settled snapshot that replaces it once every outgoing node
//! has faded to dry. Both share one generation.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::ControlError;
use crate::node::{EffectNode, NodeId};

/// Maximum number of nodes in a chain.
pub const MAX_CHAIN_LEN: usize = 8;

/// Immutable, ordered chain of effect nodes.
#[derive(Debug)]
pub struct ChainSnapshot {
    generation: u64,
    nodes: Vec<Arc<EffectNode>>,
    outgoing: Vec<Arc<EffectNode>>,
    settled: Option<Arc<ChainSnapshot>>,
}

impl ChainSnapshot {
    /// Build a snapshot, rejecting chains that are too long or contain a node twice.
    pub fn new(generation: u64, nodes: Vec<Arc<EffectNode>>) -> Result<Self, ControlError> {
        if nodes.len() > MAX_CHAIN_LEN {
            return Err(ControlError::ChainTooLong {
                len: nodes.len(),
                max: MAX_CHAIN_LEN,
            });
        }
        let mut seen = HashSet::with_capacity(nodes.len());
        for node in &nodes {
            if !seen.insert(node.id()) {
                return Err(ControlError::DuplicateNode(node.id()));
            }
        }
        Ok(Self {
            generation,
            nodes,
            outgoing: Vec::new(),
            settled: None,
        })
    }

    /// Snapshot with no nodes.
    pub fn empty(generation: u64) -> Self {
        Self {
            generation,
            nodes: Vec::new(),
            outgoing: Vec::new(),
            settled: None,
        }
    }

    /// Run `settled` with the `removed` nodes of `previous` still in place.
    ///
    /// Each removed node follows the nearest node before it in `previous`
    /// that survives into `settled`, or leads the chain if there is none.
    pub(crate) fn fading_out(
        previous: &[Arc<EffectNode>],
        removed: Vec<Arc<EffectNode>>,
        settled: Arc<ChainSnapshot>,
    ) -> Self {
        let mut anchored = Vec::with_capacity(removed.len());
        let mut anchor = None;
        for node in previous {
            if settled.node(node.id()).is_some() {
                anchor = Some(node.id());
            } else if removed.iter().any(|r| r.id() == node.id()) {
                anchored.push((anchor, Arc::clone(node)));
            }
        }

        let mut nodes = Vec::with_capacity(settled.len() + anchored.len());
        let follow = |nodes: &mut Vec<Arc<EffectNode>>, at: Option<NodeId>| {
            nodes.extend(
                anchored
                    .iter()
                    .filter(|(a, _)| *a == at)
                    .map(|(_, n)| Arc::clone(n)),
            );
        };
        follow(&mut nodes, None);
        for node in settled.nodes() {
            nodes.push(Arc::clone(node));
            follow(&mut nodes, Some(node.id()));
        }

        Self {
            generation: settled.generation,
            nodes,
            outgoing: removed,
            settled: Some(settled),
        }
    }

    /// Generation number. Later snapshots have larger generations.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Nodes in processing order.
    pub fn nodes(&self) -> &[Arc<EffectNode>] {
        &self.nodes
    }

    /// Removed nodes still fading out. Empty for a settled snapshot.
    pub fn outgoing(&self) -> &[Arc<EffectNode>] {
        &self.outgoing
    }

    /// The snapshot that takes over once the outgoing nodes are silent.
    pub(crate) fn settled(&self) -> Option<&Arc<ChainSnapshot>> {
        self.settled.as_ref()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the chain has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by id.
    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Arc<EffectNode>> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    /// Position of a node, if present.
    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| n.id() == id)
    }

    /// Node ids in order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().map(|n| n.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use tonechain_effects::EffectType;

    fn node(effect_type: EffectType) -> Arc<EffectNode> {
        Arc::new(EffectNode::new(NodeId::next(), effect_type, &EngineConfig::default()))
    }

    #[test]
    fn keeps_order_and_lookup() {
        let a = node(EffectType::Boost);
        let b = node(EffectType::Reverb);
        let snapshot = ChainSnapshot::new(3, vec![Arc::clone(&a), Arc::clone(&b)]).unwrap();

        assert_eq!(snapshot.generation(), 3);
        assert_eq!(snapshot.ids().collect::<Vec<_>>(), vec![a.id(), b.id()]);
        assert_eq!(snapshot.position(b.id()), Some(1));
        assert!(snapshot.node(NodeId::from_raw(u64::MAX)).is_none());
    }

    #[test]
    fn rejects_more_than_eight() {
        let nodes = (0..9).map(|_| node(EffectType::Boost)).collect();
        assert!(matches!(
            ChainSnapshot::new(1, nodes),
            Err(ControlError::ChainTooLong { len: 9, max: 8 })
        ));
    }

    #[test]
    fn rejects_duplicate_node() {
        let a = node(EffectType::Delay);
        let err = ChainSnapshot::new(1, vec![Arc::clone(&a), Arc::clone(&a)]).unwrap_err();
        assert_eq!(err, ControlError::DuplicateNode(a.id()));
    }

    #[test]
    fn duplicate_effect_types_allowed() {
        let nodes = vec![node(EffectType::Boost), node(EffectType::Boost)];
        assert_eq!(ChainSnapshot::new(1, nodes).unwrap().len(), 2);
    }

    #[test]
    fn fading_snapshot_keeps_removed_nodes_in_place() {
        let (a, b, c, d) = (
            node(EffectType::Boost),
            node(EffectType::Delay),
            node(EffectType::Reverb),
            node(EffectType::Distortion),
        );
        let previous = vec![Arc::clone(&a), Arc::clone(&b), Arc::clone(&c), Arc::clone(&d)];
        let settled = Arc::new(ChainSnapshot::new(4, vec![Arc::clone(&d), Arc::clone(&b)]).unwrap());

        let fading = ChainSnapshot::fading_out(
            &previous,
            vec![Arc::clone(&a), Arc::clone(&c)],
            Arc::clone(&settled),
        );
        assert_eq!(fading.generation(), 4);
        assert_eq!(fading.ids().collect::<Vec<_>>(), vec![a.id(), d.id(), b.id(), c.id()]);
        assert_eq!(fading.outgoing().len(), 2);
        assert!(Arc::ptr_eq(fading.settled().unwrap(), &settled));
        assert!(settled.outgoing().is_empty());
        assert!(settled.settled().is_none());
    }

    #[test]
    fn shared_nodes_outlive_snapshot() {
        let a = node(EffectType::Boost);
        let first = ChainSnapshot::new(1, vec![Arc::clone(&a)]).unwrap();
        let second = ChainSnapshot::new(2, vec![Arc::clone(&a)]).unwrap();
        assert_eq!(Arc::strong_count(&a), 3);
        drop(first);
        assert_eq!(Arc::strong_count(&a), 2);
        assert_eq!(second.nodes()[0].id(), a.id());
    }
}
