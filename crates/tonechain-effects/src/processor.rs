//! Tagged-variant dispatch over the hosted effects.

use tonechain_core::{Effect, ParamSet, ProcessContext};

use crate::{Boost, Delay, Distortion, EffectType, Reverb};

/// DSP state of one hosted effect.
///
/// A closed enum instead of `Box<dyn Effect>`: one `match` per block picks
/// the concrete type, and the per-sample loop inside each arm is fully
/// monomorphised.
#[derive(Debug, Clone)]
pub enum EffectProcessor {
    /// See [`Boost`].
    Boost(Boost),
    /// See [`Distortion`].
    Distortion(Distortion),
    /// See [`Delay`].
    Delay(Delay),
    /// See [`Reverb`].
    Reverb(Reverb),
}

impl EffectProcessor {
    /// Construct the processor for `effect_type` at `sample_rate`.
    ///
    /// Allocates (delay lines, comb buffers); call from a control context only.
    pub fn new(effect_type: EffectType, sample_rate: f32) -> Self {
        match effect_type {
            EffectType::Boost => Self::Boost(Boost::new(sample_rate)),
            EffectType::Distortion => Self::Distortion(Distortion::new(sample_rate)),
            EffectType::Delay => Self::Delay(Delay::new(sample_rate)),
            EffectType::Reverb => Self::Reverb(Reverb::new(sample_rate)),
        }
    }

    /// Which effect this is.
    pub fn effect_type(&self) -> EffectType {
        match self {
            Self::Boost(_) => EffectType::Boost,
            Self::Distortion(_) => EffectType::Distortion,
            Self::Delay(_) => EffectType::Delay,
            Self::Reverb(_) => EffectType::Reverb,
        }
    }

    /// Process `block` in place, advancing `params` once per sample.
    #[inline]
    pub fn process_block(&mut self, block: &mut [f32], params: &mut ParamSet, ctx: &ProcessContext) {
        match self {
            Self::Boost(fx) => fx.process_block(block, params, ctx),
            Self::Distortion(fx) => fx.process_block(block, params, ctx),
            Self::Delay(fx) => fx.process_block(block, params, ctx),
            Self::Reverb(fx) => fx.process_block(block, params, ctx),
        }
    }

    /// Clear all DSP memory.
    pub fn reset(&mut self) {
        match self {
            Self::Boost(fx) => fx.reset(),
            Self::Distortion(fx) => fx.reset(),
            Self::Delay(fx) => fx.reset(),
            Self::Reverb(fx) => fx.reset(),
        }
    }
}
