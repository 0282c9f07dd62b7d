//! Tonechain Core - DSP primitives for the real-time effects chain
//!
//! This crate provides the building blocks every hosted effect is made of,
//! designed for real-time audio processing with zero allocation in the audio path.
//!
//! # Effect System
//!
//! - [`Effect`] - In-place processing contract for hosted effects
//! - [`ProcessContext`] - Sample rate and tempo for one block
//!
//! # Parameters
//!
//! Zipper-free parameter changes:
//!
//! - [`LinearRamp`] - Constant-rate ramp towards a target (also used for bypass crossfades)
//! - [`ParamValue`] - A named, range-bounded parameter driven by a [`LinearRamp`]
//! - [`ParamSet`] - The ordered parameter set of one effect instance
//! - [`ParamDescriptor`] - Static metadata (range, default, unit, flags)
//!
//! ## Filters and delay lines
//!
//! - [`InterpolatedDelay`] - Variable-length delay with linear interpolation
//! - [`CombFilter`] - Damped feedback comb for reverb algorithms
//! - [`AllpassFilter`] - Schroeder allpass for diffusion
//! - [`OnePole`] - 6 dB/oct lowpass for tone controls
//!
//! ## Utilities
//!
//! - Math functions: [`db_to_linear`], [`soft_clip`], [`flush_denormal`], [`sanitize_block`]
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! tonechain-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use tonechain_core::{ParamDescriptor, ParamUnit, ParamValue};
//!
//! static GAIN: ParamDescriptor =
//!     ParamDescriptor::continuous("gain_db", "Gain", ParamUnit::Decibels, -20.0, 30.0, 0.0);
//!
//! // 10 ms ramp at 48 kHz
//! let mut gain = ParamValue::new(&GAIN, 480);
//! gain.set_target(6.0);
//! for _ in 0..480 {
//!     gain.advance();
//! }
//! assert_eq!(gain.current(), 6.0);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod allpass;
pub mod comb;
pub mod delay;
pub mod effect;
pub mod math;
pub mod one_pole;
pub mod param;
pub mod param_info;

pub use allpass::AllpassFilter;
pub use comb::CombFilter;
pub use delay::InterpolatedDelay;
pub use effect::{Effect, ProcessContext};
pub use math::{
    db_to_linear, flush_denormal, linear_to_db, ms_to_samples, sanitize, sanitize_block,
    soft_clip, wet_dry_mix,
};
pub use one_pole::OnePole;
pub use param::{LinearRamp, MAX_PARAMS, ParamFrame, ParamSet, ParamValue};
pub use param_info::{ParamDescriptor, ParamFlags, ParamUnit};
