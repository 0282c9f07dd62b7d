//! Tonechain Effects - the effects hosted by the chain engine
//!
//! The engine hosts a closed set of effects, dispatched through one tagged
//! variant rather than trait objects:
//!
//! - [`Boost`] - Clean gain with a tilt tone control
//! - [`Distortion`] - `tanh` overdrive with lowpass tone and output level
//! - [`Delay`] - Feedback echo, optionally locked to the host tempo
//! - [`Reverb`] - Freeverb-style room (8 combs, 4 allpasses)
//!
//! [`EffectType`] names an effect and owns its static parameter table;
//! [`EffectProcessor`] is the variant carrying each effect's DSP state.
//!
//! ## Example
//!
//! ```rust
//! use tonechain_core::{ParamSet, ProcessContext};
//! use tonechain_effects::{EffectProcessor, EffectType};
//!
//! let ctx = ProcessContext::new(48000.0);
//! let mut params = ParamSet::from_descriptors(EffectType::Distortion.params(), 480);
//! let mut dist = EffectProcessor::new(EffectType::Distortion, ctx.sample_rate);
//!
//! let mut block = [0.25f32; 64];
//! dist.process_block(&mut block, &mut params, &ctx);
//! assert!(block.iter().all(|s| s.is_finite()));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod boost;
pub mod delay;
pub mod distortion;
pub mod effect_type;
pub mod processor;
pub mod reverb;

pub use boost::Boost;
pub use delay::Delay;
pub use distortion::Distortion;
pub use effect_type::{EffectType, UnknownEffectType};
pub use processor::EffectProcessor;
pub use reverb::Reverb;
