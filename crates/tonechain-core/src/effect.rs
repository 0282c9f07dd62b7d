//! Core Effect trait and the per-block processing context.
//!
//! The [`Effect`] trait is the processing contract every hosted effect
//! fulfils: in-place, mono, driven by a [`ParamSet`] it does not own.
//!
//! ## Design Decisions
//!
//! - **Mono processing**: Single `f32` per sample, matching a guitar-pedal
//!   signal path.
//!
//! - **Parameters live outside the effect**: the engine owns each node's
//!   [`ParamSet`] and hands it in per block. The effect reads one
//!   [`ParamFrame`] per sample, so every ramp advances exactly once per sample
//!   regardless of which effect consumes it.
//!
//! - **No allocations**: All methods are called from the audio context and
//!   must not allocate, lock, or block.

use crate::param::{ParamFrame, ParamSet};

/// Block-invariant facts an effect may depend on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessContext {
    /// Agreed sample rate in Hz.
    pub sample_rate: f32,
    /// Host tempo in beats per minute, for tempo-synced parameters.
    pub tempo_bpm: f32,
}

impl ProcessContext {
    /// Context at `sample_rate` and 120 BPM.
    pub const fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            tempo_bpm: 120.0,
        }
    }

    /// Override the tempo.
    pub const fn with_tempo(mut self, tempo_bpm: f32) -> Self {
        self.tempo_bpm = tempo_bpm;
        self
    }
}

/// Core trait for all hosted effects.
///
/// # Example
///
/// ```rust
/// use tonechain_core::{Effect, ParamFrame, ProcessContext};
///
/// struct Invert;
///
/// impl Effect for Invert {
///     fn process_sample(&mut self, input: f32, _params: &ParamFrame, _ctx: &ProcessContext) -> f32 {
///         -input
///     }
///
///     fn reset(&mut self) {}
/// }
/// ```
pub trait Effect {
    /// Process a single sample with this sample's parameter values.
    fn process_sample(&mut self, input: f32, params: &ParamFrame, ctx: &ProcessContext) -> f32;

    /// Process a block in place.
    ///
    /// The default implementation advances `params` once per sample and calls
    /// [`process_sample`](Self::process_sample).
    fn process_block(&mut self, block: &mut [f32], params: &mut ParamSet, ctx: &ProcessContext) {
        for sample in block.iter_mut() {
            let frame = params.tick();
            *sample = self.process_sample(*sample, &frame, ctx);
        }
    }

    /// Clear all internal DSP memory (delay lines, filter history).
    fn reset(&mut self);

    /// Processing latency in samples.
    fn latency_samples(&self) -> usize {
        0
    }
}
