//! Mathematical utility functions for DSP.
//!
//! All functions are allocation-free and suitable for `no_std`.
//!
//! # Level Conversions
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Convert between dB and linear gain
//!
//! # Waveshaping
//!
//! - [`soft_clip`] - Smooth `tanh` saturation, odd harmonics
//!
//! # Numeric hygiene
//!
//! Feedback paths (delay lines, comb filters, one-pole state) decay towards zero
//! and eventually enter the subnormal range, where some CPUs slow down by two
//! orders of magnitude. [`flush_denormal`] handles a single value inside a
//! feedback loop; [`sanitize`] / [`sanitize_block`] additionally replace NaN and
//! infinities and are applied at the engine boundary after every node.

use libm::{expf, logf, tanhf};

/// Smallest magnitude treated as non-zero by [`flush_denormal`].
pub const DENORMAL_THRESHOLD: f32 = 1e-20;

/// Convert decibels to linear gain.
///
/// # Example
///
/// ```rust
/// use tonechain_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 1e-6);
/// assert!((db_to_linear(-6.0) - 0.501).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels.
///
/// Returns -200 dB for silent (zero or negative) input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        return -200.0;
    }
    // 20 * log10(x) = 20 * ln(x) / ln(10)
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear) * FACTOR
}

/// Soft clipping using `tanh`.
///
/// Output is bounded to (-1, 1) for any finite input.
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    tanhf(x)
}

/// Convert milliseconds to samples at the given sample rate.
#[inline]
pub fn ms_to_samples(ms: f32, sample_rate: f32) -> f32 {
    ms * sample_rate / 1000.0
}

/// Flush values below [`DENORMAL_THRESHOLD`] to zero.
#[inline]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < DENORMAL_THRESHOLD { 0.0 } else { x }
}

/// Replace a non-finite sample with silence and flush subnormals.
#[inline]
pub fn sanitize(x: f32) -> f32 {
    if x.is_finite() { flush_denormal(x) } else { 0.0 }
}

/// Sanitize a block in place.
///
/// Returns the number of non-finite samples that were replaced with zero.
/// Subnormal flushing is not counted; it is routine, not a fault.
#[inline]
pub fn sanitize_block(block: &mut [f32]) -> usize {
    let mut replaced = 0;
    for sample in block.iter_mut() {
        if sample.is_finite() {
            *sample = flush_denormal(*sample);
        } else {
            *sample = 0.0;
            replaced += 1;
        }
    }
    replaced
}

/// Linear crossfade between `dry` and `wet`.
///
/// `mix = 0.0` returns `dry`, `mix = 1.0` returns `wet`.
#[inline]
pub fn wet_dry_mix(dry: f32, wet: f32, mix: f32) -> f32 {
    dry + (wet - dry) * mix
}
