//! Control-side handle to a running engine.
//!
//! [`ChainController`] is the only way control threads (UI, preset loader)
//! affect the engine. Every request is validated here and either rejected
//! synchronously or turned into an [`UpdateMessage`] on the bounded queue.
//!
//! The controller keeps a mirror of the chain as it will look once every
//! accepted message has been applied: node handles in order plus the
//! parameter targets and bypass flags last sent. Validation, export and new
//! edits all read the mirror; none of them touch audio-side state. The mirror
//! lock is held across each push, so the mirror and the queue always agree
//! on order even when the controller is cloned across threads.
//!
//! ## Reclamation
//!
//! Every published snapshot stays on the engine's retire list until
//! [`collect_garbage`](ChainController::collect_garbage) finds that nothing
//! else holds it: not the audio context, not the live pointer, not a message
//! still in the queue. The list lives in state the engine shares, so it
//! outlives every controller. Nodes and snapshots are therefore freed on a
//! control thread, or with the engine itself. Collection runs automatically
//! before each topology swap.

use std::sync::Arc;

use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use tonechain_effects::EffectType;

use crate::config::EngineConfig;
use crate::description::{ChainDescription, validate_parameter};
use crate::edit::{ChainEntry, TopologyEdit};
use crate::error::ControlError;
use crate::event::{self, EngineEvent, FaultReason};
use crate::message::UpdateMessage;
use crate::node::{EffectNode, NodeId};
use crate::queue::{PushError, UpdateSender};
use crate::shared::{EngineShared, EngineStatus};
use crate::snapshot::ChainSnapshot;
use crate::state::EngineState;

struct ControlChain {
    entries: Vec<ChainEntry>,
    /// Generation of the last snapshot accepted by the queue.
    generation: u64,
}

impl ControlChain {
    fn entry_mut(&mut self, id: NodeId) -> Result<&mut ChainEntry, ControlError> {
        self.entries
            .iter_mut()
            .find(|e| e.node.id() == id)
            .ok_or(ControlError::UnknownNode(id))
    }
}

struct Inner {
    shared: Arc<EngineShared>,
    updates: UpdateSender,
    events: Receiver<EngineEvent>,
    config: EngineConfig,
    chain: Mutex<ControlChain>,
}

/// Cloneable, thread-safe handle for control contexts.
#[derive(Clone)]
pub struct ChainController {
    inner: Arc<Inner>,
}

impl ChainController {
    pub(crate) fn new(
        shared: Arc<EngineShared>,
        updates: UpdateSender,
        events: Receiver<EngineEvent>,
        config: EngineConfig,
        entries: Vec<ChainEntry>,
        generation: u64,
    ) -> Self {
        let chain = ControlChain {
            entries,
            generation,
        };
        Self {
            inner: Arc::new(Inner {
                shared,
                updates,
                events,
                config,
                chain: Mutex::new(chain),
            }),
        }
    }

    /// Build the nodes of an engine's first chain, at generation 0.
    pub(crate) fn initial_chain(
        chain: &ChainDescription,
        config: &EngineConfig,
    ) -> Result<(Vec<ChainEntry>, ChainSnapshot), ControlError> {
        let entries = chain
            .nodes
            .iter()
            .map(|desc| {
                let description = desc.completed()?;
                let node = EffectNode::from_description(NodeId::next(), &description, config)?;
                Ok(ChainEntry {
                    node: Arc::new(node),
                    description,
                })
            })
            .collect::<Result<Vec<_>, ControlError>>()?;
        let snapshot = ChainSnapshot::new(0, entries.iter().map(|e| Arc::clone(&e.node)).collect())?;
        Ok((entries, snapshot))
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.inner.shared.state.load()
    }

    /// Counters and state.
    pub fn status(&self) -> EngineStatus {
        self.inner.shared.status()
    }

    /// Receiver for engine events. All clones share one channel.
    pub fn events(&self) -> Receiver<EngineEvent> {
        self.inner.events.clone()
    }

    /// Drain pending events into `tracing`. Returns how many were drained.
    pub fn log_events(&self) -> usize {
        event::log_events(&self.inner.events)
    }

    /// Generation of the last topology accepted by the queue.
    pub fn generation(&self) -> u64 {
        self.inner.chain.lock().generation
    }

    /// Generation the audio context is running.
    pub fn live_generation(&self) -> u64 {
        self.inner.shared.live_generation()
    }

    /// Messages waiting in the update queue.
    pub fn pending_updates(&self) -> usize {
        self.inner.updates.len()
    }

    /// Node ids in chain order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.inner.chain.lock().entries.iter().map(|e| e.node.id()).collect()
    }

    /// Number of nodes in the chain.
    pub fn len(&self) -> usize {
        self.inner.chain.lock().entries.len()
    }

    /// Returns `true` if the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // -- lifecycle --

    /// Request processing. The next callback moves the engine to `Running`.
    pub fn start(&self) -> Result<(), ControlError> {
        self.inner
            .shared
            .transition(EngineState::Stopped, EngineState::Starting)
            .map_err(|from| ControlError::InvalidState {
                from,
                requested: EngineState::Starting,
            })?;
        tracing::info!("engine start requested");
        Ok(())
    }

    /// Request a stop. The next callback outputs silence and stops.
    ///
    /// Stopping a stopped or draining engine does nothing. A faulted engine
    /// must be cleared with [`clear_fault`](Self::clear_fault) instead.
    pub fn stop(&self) -> Result<(), ControlError> {
        let shared = &self.inner.shared;
        loop {
            let (from, to) = match shared.state.load() {
                EngineState::Running => (EngineState::Running, EngineState::Draining),
                EngineState::Starting => (EngineState::Starting, EngineState::Stopped),
                EngineState::Stopped | EngineState::Draining => return Ok(()),
                EngineState::Faulted => {
                    return Err(ControlError::InvalidState {
                        from: EngineState::Faulted,
                        requested: EngineState::Stopped,
                    });
                }
            };
            if shared.transition(from, to).is_ok() {
                tracing::info!(from = %from, to = %to, "engine stop requested");
                return Ok(());
            }
        }
    }

    /// Report a device fault from the I/O driver.
    ///
    /// Safe to call from a driver callback: it only touches atomics and the
    /// event channel. Returns `false` if the engine was not active.
    pub fn report_device_fault(&self, reason: FaultReason) -> bool {
        self.inner.shared.fault(reason)
    }

    /// Leave `Faulted` for `Stopped` so the engine can be started again.
    pub fn clear_fault(&self) -> Result<(), ControlError> {
        self.inner
            .shared
            .transition(EngineState::Faulted, EngineState::Stopped)
            .map_err(|from| ControlError::InvalidState {
                from,
                requested: EngineState::Stopped,
            })?;
        tracing::info!("device fault cleared");
        Ok(())
    }

    // -- parameter and bypass updates --

    /// Send a new target for one parameter.
    ///
    /// Returns `Ok(false)` if the queue is full. Unknown nodes, unknown names
    /// and out-of-range or non-finite values are rejected.
    pub fn enqueue_parameter_change(
        &self,
        node_id: NodeId,
        name: &str,
        value: f32,
    ) -> Result<bool, ControlError> {
        let mut chain = self.inner.chain.lock();
        let entry = chain.entry_mut(node_id)?;
        let (index, descriptor) = validate_parameter(entry.node.effect_type(), name, value)
            .inspect_err(|e| tracing::warn!(node = %node_id, error = %e, "parameter change rejected"))?;

        let accepted = self.push(UpdateMessage::ParameterChange {
            node_id,
            name: descriptor.name,
            index,
            target: value,
        })?;
        if accepted {
            entry
                .description
                .parameters
                .insert(descriptor.name.to_string(), value);
        }
        Ok(accepted)
    }

    /// Enable or bypass a node. Returns `Ok(false)` if the queue is full.
    pub fn enqueue_bypass(&self, node_id: NodeId, bypassed: bool) -> Result<bool, ControlError> {
        let mut chain = self.inner.chain.lock();
        let entry = chain.entry_mut(node_id)?;
        let accepted = self.push(UpdateMessage::BypassToggle { node_id, bypassed })?;
        if accepted {
            entry.description.bypassed = bypassed;
        }
        Ok(accepted)
    }

    // -- topology --

    /// Start a topology edit from the current chain.
    pub fn edit(&self) -> TopologyEdit {
        let chain = self.inner.chain.lock();
        TopologyEdit::from_chain(chain.generation, &chain.entries)
    }

    /// Publish an edit as the next chain snapshot.
    ///
    /// Returns `Ok(false)` if the queue is full; the edit's new nodes are
    /// dropped and the chain is unchanged. Fails with
    /// [`ControlError::StaleEdit`] if another topology change was published
    /// after the edit was started.
    pub fn enqueue_topology_swap(&self, edit: TopologyEdit) -> Result<bool, ControlError> {
        let mut chain = self.inner.chain.lock();
        self.commit(&mut chain, edit)
    }

    /// Start an edit, apply `f` and publish the result, all under one lock.
    ///
    /// Returns `Ok(None)` if the queue is full.
    pub fn modify_chain<R>(
        &self,
        f: impl FnOnce(&mut TopologyEdit) -> Result<R, ControlError>,
    ) -> Result<Option<R>, ControlError> {
        let mut chain = self.inner.chain.lock();
        let mut edit = TopologyEdit::from_chain(chain.generation, &chain.entries);
        let result = f(&mut edit)?;
        Ok(self.commit(&mut chain, edit)?.then_some(result))
    }

    /// Append an effect at default parameters. Returns its id, or `None` if
    /// the queue is full.
    pub fn add_effect(&self, effect_type: EffectType) -> Result<Option<NodeId>, ControlError> {
        self.modify_chain(|edit| edit.add(effect_type))
    }

    /// Remove a node from the chain.
    pub fn remove_effect(&self, node_id: NodeId) -> Result<bool, ControlError> {
        self.modify_chain(|edit| {
            if edit.remove(node_id) {
                Ok(())
            } else {
                Err(ControlError::UnknownNode(node_id))
            }
        })
        .map(|r| r.is_some())
    }

    /// Move a node to `new_index`.
    pub fn move_effect(&self, node_id: NodeId, new_index: usize) -> Result<bool, ControlError> {
        self.modify_chain(|edit| edit.move_node(node_id, new_index))
            .map(|r| r.is_some())
    }

    /// Put the chain in exactly the given order.
    pub fn reorder_effects(&self, order: &[NodeId]) -> Result<bool, ControlError> {
        self.modify_chain(|edit| edit.reorder(order))
            .map(|r| r.is_some())
    }

    /// Remove every node.
    pub fn clear_chain(&self) -> Result<bool, ControlError> {
        self.modify_chain(|edit| {
            edit.clear();
            Ok(())
        })
        .map(|r| r.is_some())
    }

    // -- export / import --

    /// Describe the chain as it stands once every accepted update is applied.
    pub fn export_state(&self) -> ChainDescription {
        let chain = self.inner.chain.lock();
        ChainDescription {
            nodes: chain.entries.iter().map(|e| e.description.clone()).collect(),
        }
    }

    /// Validate `description` and build an edit replacing the whole chain
    /// with new nodes.
    pub fn import_state(&self, description: &ChainDescription) -> Result<TopologyEdit, ControlError> {
        let chain = self.inner.chain.lock();
        Self::import_edit(chain.generation, &chain.entries, description)
    }

    /// Import `description` and publish it.
    pub fn load_state(&self, description: &ChainDescription) -> Result<bool, ControlError> {
        let mut chain = self.inner.chain.lock();
        let edit = Self::import_edit(chain.generation, &chain.entries, description)?;
        self.commit(&mut chain, edit)
    }

    /// Free snapshots nothing else references. Returns how many were freed.
    pub fn collect_garbage(&self) -> usize {
        self.inner.shared.collect_retired()
    }

    /// Snapshots still held for reclamation.
    pub fn retained_snapshots(&self) -> usize {
        self.inner.shared.retired_len()
    }

    fn import_edit(
        generation: u64,
        entries: &[ChainEntry],
        description: &ChainDescription,
    ) -> Result<TopologyEdit, ControlError> {
        description.validate()?;
        let mut edit = TopologyEdit::from_chain(generation, entries);
        edit.clear();
        for node in &description.nodes {
            edit.add_description(node.clone())?;
        }
        Ok(edit)
    }

    fn commit(&self, chain: &mut ControlChain, edit: TopologyEdit) -> Result<bool, ControlError> {
        self.inner.shared.collect_retired();
        if edit.base_generation() != chain.generation {
            return Err(ControlError::StaleEdit {
                base: edit.base_generation(),
                current: chain.generation,
            });
        }

        let generation = chain.generation + 1;
        let entries = edit.build(&chain.entries, &self.inner.config)?;
        let nodes = entries.iter().map(|e| Arc::clone(&e.node)).collect();
        let settled = Arc::new(ChainSnapshot::new(generation, nodes)?);

        // Removed nodes that are still audible fade to dry before they leave.
        let removed: Vec<_> = chain
            .entries
            .iter()
            .filter(|old| !old.description.bypassed && settled.node(old.node.id()).is_none())
            .map(|old| Arc::clone(&old.node))
            .collect();
        let fading = removed.len();
        let snapshot = if removed.is_empty() {
            Arc::clone(&settled)
        } else {
            let previous: Vec<_> = chain.entries.iter().map(|e| Arc::clone(&e.node)).collect();
            Arc::new(ChainSnapshot::fading_out(&previous, removed, Arc::clone(&settled)))
        };

        if !self.push(UpdateMessage::TopologySwap {
            snapshot: Arc::clone(&snapshot),
        })? {
            return Ok(false);
        }

        tracing::info!(generation, nodes = entries.len(), fading, "topology swap published");
        chain.entries = entries;
        chain.generation = generation;
        if !Arc::ptr_eq(&snapshot, &settled) {
            self.inner.shared.retire(snapshot);
        }
        self.inner.shared.retire(settled);
        Ok(true)
    }

    fn push(&self, message: UpdateMessage) -> Result<bool, ControlError> {
        let kind = message.kind();
        match self.inner.updates.try_push(message) {
            Ok(()) => {
                tracing::debug!(kind, "update enqueued");
                Ok(true)
            }
            Err(PushError::Full(_)) => {
                tracing::warn!(kind, capacity = self.inner.updates.capacity(), "update queue full");
                Ok(false)
            }
            Err(PushError::Disconnected(_)) => Err(ControlError::EngineGone),
        }
    }
}

impl std::fmt::Debug for ChainController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainController")
            .field("state", &self.state())
            .field("generation", &self.generation())
            .field("pending_updates", &self.pending_updates())
            .finish_non_exhaustive()
    }
}
