//! Effect nodes.
//!
//! An [`EffectNode`] is one hosted effect: an immutable id and effect type,
//! plus mutable per-node state (parameter ramps, bypass crossfade, DSP
//! memory). Nodes are shared by reference between consecutive snapshots so an
//! unchanged node keeps its delay lines and filter history across topology
//! swaps.
//!
//! ## Ownership of mutable state
//!
//! Once a node is published in a snapshot, its state is touched only by the
//! audio context. The state sits behind a mutex purely to make the node
//! `Sync`; the audio context uses `try_lock`, which never waits, and control
//! contexts never lock it at all.
//!
//! ## Bypass
//!
//! Bypass is a linear crossfade between the dry input and the processed
//! signal. While the fade is moving the effect runs normally and its output is
//! mixed with the dry copy. Once the fade settles at zero the node is skipped:
//! its DSP memory is frozen and resumes where it left off when re-enabled.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tonechain_core::{LinearRamp, ParamSet, ProcessContext, wet_dry_mix};
use tonechain_effects::{EffectProcessor, EffectType};

use crate::config::EngineConfig;
use crate::description::NodeDescription;
use crate::error::ControlError;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier of an effect node.
///
/// Ids are unique for the lifetime of the process and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Rebuild an id from its raw value, e.g. one logged earlier.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw value.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outcome of one node call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeRun {
    /// The block passed through untouched.
    Skipped,
    /// The effect ran on the block.
    Processed,
}

struct NodeState {
    processor: EffectProcessor,
    params: ParamSet,
    bypassed: bool,
    /// 1.0 fully active, 0.0 fully bypassed.
    fade: LinearRamp,
    /// Copy of the input while a crossfade is in flight.
    dry: Vec<f32>,
}

impl NodeState {
    fn process(&mut self, block: &mut [f32], ctx: &ProcessContext) -> NodeRun {
        if self.fade.is_settled() {
            if self.fade.get() <= 0.0 {
                self.params.advance_by(block.len() as u32);
                return NodeRun::Skipped;
            }
            self.processor.process_block(block, &mut self.params, ctx);
            return NodeRun::Processed;
        }

        for chunk in block.chunks_mut(self.dry.len()) {
            let dry = &mut self.dry[..chunk.len()];
            dry.copy_from_slice(chunk);
            self.processor.process_block(chunk, &mut self.params, ctx);
            for (out, &input) in chunk.iter_mut().zip(dry.iter()) {
                *out = wet_dry_mix(input, *out, self.fade.advance());
            }
        }
        NodeRun::Processed
    }

    fn set_bypassed(&mut self, bypassed: bool) {
        if self.bypassed == bypassed {
            return;
        }
        self.bypassed = bypassed;
        self.fade.set_target(if bypassed { 0.0 } else { 1.0 });
    }
}

/// One effect instance in the chain.
pub struct EffectNode {
    id: NodeId,
    effect_type: EffectType,
    state: Mutex<NodeState>,
}

impl EffectNode {
    /// A node at default parameters, fully active.
    pub(crate) fn new(id: NodeId, effect_type: EffectType, config: &EngineConfig) -> Self {
        let state = NodeState {
            processor: EffectProcessor::new(effect_type, config.sample_rate_hz()),
            params: ParamSet::from_descriptors(effect_type.params(), config.ramp_samples()),
            bypassed: false,
            fade: LinearRamp::with_length(1.0, config.crossfade_samples()),
            dry: vec![0.0; config.block_size.max(1)],
        };
        Self {
            id,
            effect_type,
            state: Mutex::new(state),
        }
    }

    /// A node whose parameters and bypass flag start at `description`.
    pub(crate) fn from_description(
        id: NodeId,
        description: &NodeDescription,
        config: &EngineConfig,
    ) -> Result<Self, ControlError> {
        let targets = description.targets()?;
        let mut node = Self::new(id, description.effect_type, config);
        let state = node.state.get_mut();
        for (index, value) in targets.into_iter().enumerate() {
            if let Some(param) = state.params.get_mut(index) {
                param.set_immediate(value);
            }
        }
        if description.bypassed {
            state.bypassed = true;
            state.fade.set_immediate(0.0);
        }
        Ok(node)
    }

    /// Start an active node silent and fade it in over the crossfade window.
    pub(crate) fn with_fade_in(mut self) -> Self {
        let state = self.state.get_mut();
        if !state.bypassed {
            state.fade.set_immediate(0.0);
            state.fade.set_target(1.0);
        }
        self
    }

    /// Node id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Hosted effect type.
    pub fn effect_type(&self) -> EffectType {
        self.effect_type
    }

    /// Run the node on `block` in place.
    ///
    /// If the state is unexpectedly held elsewhere the block passes through.
    #[inline]
    pub(crate) fn process(&self, block: &mut [f32], ctx: &ProcessContext) -> NodeRun {
        match self.state.try_lock() {
            Some(mut state) => state.process(block, ctx),
            None => NodeRun::Skipped,
        }
    }

    /// Set a parameter's ramp target. Values are clamped to the parameter range.
    pub(crate) fn set_parameter_target(&self, index: usize, value: f32) -> bool {
        match self.state.try_lock() {
            Some(mut state) if index < state.params.len() => {
                state.params.set_target(index, value);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn set_bypassed(&self, bypassed: bool) -> bool {
        match self.state.try_lock() {
            Some(mut state) => {
                state.set_bypassed(bypassed);
                true
            }
            None => false,
        }
    }

    /// Returns `true` once a bypass fade has settled at dry.
    pub(crate) fn is_faded_out(&self) -> bool {
        self.state
            .try_lock()
            .is_some_and(|state| state.fade.is_settled() && state.fade.get() <= 0.0)
    }

    /// Clear DSP memory after the node produced non-finite output.
    pub(crate) fn reset_dsp(&self) {
        if let Some(mut state) = self.state.try_lock() {
            state.processor.reset();
        }
    }

    #[cfg(test)]
    pub(crate) fn param_current(&self, index: usize) -> f32 {
        self.state.lock().params.current(index)
    }

    #[cfg(test)]
    pub(crate) fn param_target(&self, index: usize) -> Option<f32> {
        self.state.lock().params.get(index).map(|p| p.target())
    }

    #[cfg(test)]
    pub(crate) fn fade_level(&self) -> f32 {
        self.state.lock().fade.get()
    }
}

impl fmt::Debug for EffectNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectNode")
            .field("id", &self.id)
            .field("effect_type", &self.effect_type)
            .finish_non_exhaustive()
    }
}
