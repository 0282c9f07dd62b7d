//! Parameter values with linear smoothing for zipper-free changes.
//!
//! Audio parameters (gain, mix, delay time) must not jump between blocks:
//! a step change is heard as a click, a series of small steps as "zipper
//! noise". Every continuously variable parameter therefore moves towards its
//! target along a [`LinearRamp`] of fixed duration. Stepped parameters
//! (on/off switches) apply immediately.
//!
//! ## Types
//!
//! - [`LinearRamp`] - Constant-rate transition to a target over N samples
//! - [`ParamValue`] - A [`LinearRamp`] bound to a [`ParamDescriptor`], always inside `[min, max]`
//! - [`ParamSet`] - The ordered parameters of one effect, advanced together
//! - [`ParamFrame`] - The per-sample snapshot of a [`ParamSet`] handed to DSP code
//!
//! ## Usage
//!
//! ```rust
//! use tonechain_core::LinearRamp;
//!
//! // 5 ms crossfade at 48 kHz
//! let mut fade = LinearRamp::with_length(0.0, 240);
//! fade.set_target(1.0);
//!
//! for _ in 0..240 {
//!     let _gain = fade.advance();
//! }
//! assert!(fade.is_settled());
//! assert_eq!(fade.get(), 1.0);
//! ```

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec::Vec;
use core::ops::Index;

use crate::param_info::ParamDescriptor;

/// Maximum number of parameters a single effect may declare.
pub const MAX_PARAMS: usize = 4;

/// Linear ramp towards a target over a fixed number of samples.
///
/// Unlike a one-pole smoother, a linear ramp reaches its target exactly after
/// `ramp_samples` steps, which makes the convergence window a hard bound.
///
/// The value never overshoots the target: rounding in the accumulated
/// increment is absorbed by clamping each step and snapping on the last one.
#[derive(Debug, Clone)]
pub struct LinearRamp {
    /// Current value
    current: f32,
    /// Target value
    target: f32,
    /// Increment per sample (can be positive or negative)
    increment: f32,
    /// Samples remaining until target reached
    samples_remaining: u32,
    /// Length of a full transition in samples
    ramp_samples: u32,
}

impl LinearRamp {
    /// Create a settled ramp with a zero-length transition.
    pub fn new(initial: f32) -> Self {
        Self::with_length(initial, 0)
    }

    /// Create a settled ramp whose transitions take `ramp_samples` samples.
    pub fn with_length(initial: f32, ramp_samples: u32) -> Self {
        Self {
            current: initial,
            target: initial,
            increment: 0.0,
            samples_remaining: 0,
            ramp_samples,
        }
    }

    /// Set the transition length used by subsequent [`set_target`](Self::set_target) calls.
    pub fn set_ramp_samples(&mut self, ramp_samples: u32) {
        self.ramp_samples = ramp_samples;
    }

    /// Transition length in samples.
    #[inline]
    pub fn ramp_samples(&self) -> u32 {
        self.ramp_samples
    }

    /// Set a new target, starting a fresh transition from the current value.
    pub fn set_target(&mut self, target: f32) {
        if (target - self.target).abs() < 1e-9 {
            return;
        }

        self.target = target;

        if self.ramp_samples == 0 {
            self.snap_to_target();
        } else {
            self.increment = (target - self.current) / self.ramp_samples as f32;
            self.samples_remaining = self.ramp_samples;
        }
    }

    /// Set value and target immediately, cancelling any transition.
    pub fn set_immediate(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.increment = 0.0;
        self.samples_remaining = 0;
    }

    /// Advance one sample and return the new value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        if self.samples_remaining > 0 {
            self.samples_remaining -= 1;
            if self.samples_remaining == 0 {
                self.current = self.target;
            } else {
                let next = self.current + self.increment;
                self.current = if self.increment > 0.0 {
                    next.min(self.target)
                } else {
                    next.max(self.target)
                };
            }
        }
        self.current
    }

    /// Advance `samples` steps at once and return the new value.
    ///
    /// Equivalent to calling [`advance`](Self::advance) `samples` times.
    #[inline]
    pub fn advance_by(&mut self, samples: u32) -> f32 {
        if samples >= self.samples_remaining {
            if self.samples_remaining > 0 {
                self.snap_to_target();
            }
        } else {
            self.samples_remaining -= samples;
            let next = self.current + self.increment * samples as f32;
            self.current = if self.increment > 0.0 {
                next.min(self.target)
            } else {
                next.max(self.target)
            };
        }
        self.current
    }

    /// Get current value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Get target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Samples left in the current transition.
    #[inline]
    pub fn samples_remaining(&self) -> u32 {
        self.samples_remaining
    }

    /// Check if the transition is complete.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.samples_remaining == 0
    }

    /// Snap to target immediately.
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
        self.increment = 0.0;
        self.samples_remaining = 0;
    }
}

/// A single smoothed parameter bound to its static descriptor.
///
/// Invariant: [`current`](Self::current) and [`target`](Self::target) always lie
/// within the descriptor's `[min, max]`.
#[derive(Debug, Clone)]
pub struct ParamValue {
    descriptor: &'static ParamDescriptor,
    ramp: LinearRamp,
}

impl ParamValue {
    /// Create a parameter at its default value.
    pub fn new(descriptor: &'static ParamDescriptor, ramp_samples: u32) -> Self {
        Self::with_value(descriptor, descriptor.default, ramp_samples)
    }

    /// Create a parameter at `value` (clamped), already settled.
    pub fn with_value(descriptor: &'static ParamDescriptor, value: f32, ramp_samples: u32) -> Self {
        let ramp_samples = if descriptor.is_stepped() { 0 } else { ramp_samples };
        Self {
            descriptor,
            ramp: LinearRamp::with_length(descriptor.clamp(value), ramp_samples),
        }
    }

    /// The parameter's static metadata.
    #[inline]
    pub fn descriptor(&self) -> &'static ParamDescriptor {
        self.descriptor
    }

    /// Stable parameter key.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    /// Lower bound.
    #[inline]
    pub fn min(&self) -> f32 {
        self.descriptor.min
    }

    /// Upper bound.
    #[inline]
    pub fn max(&self) -> f32 {
        self.descriptor.max
    }

    /// Default value.
    #[inline]
    pub fn default_value(&self) -> f32 {
        self.descriptor.default
    }

    /// Value used for processing right now.
    #[inline]
    pub fn current(&self) -> f32 {
        self.ramp.get()
    }

    /// Value the parameter is converging towards.
    #[inline]
    pub fn target(&self) -> f32 {
        self.ramp.target()
    }

    /// Samples left before `current` reaches `target`.
    #[inline]
    pub fn ramp_samples_remaining(&self) -> u32 {
        self.ramp.samples_remaining()
    }

    /// Set a new target.
    ///
    /// The value is clamped into `[min, max]`, never rejected. Stepped
    /// parameters jump immediately; continuous ones start a linear ramp.
    pub fn set_target(&mut self, value: f32) {
        let value = self.descriptor.clamp(value);
        if self.descriptor.is_stepped() {
            self.ramp.set_immediate(value);
        } else {
            self.ramp.set_target(value);
        }
    }

    /// Jump to `value` (clamped) without ramping.
    pub fn set_immediate(&mut self, value: f32) {
        self.ramp.set_immediate(self.descriptor.clamp(value));
    }

    /// Change the ramp length for future transitions. Ignored for stepped parameters.
    pub fn set_ramp_samples(&mut self, ramp_samples: u32) {
        if !self.descriptor.is_stepped() {
            self.ramp.set_ramp_samples(ramp_samples);
        }
    }

    /// Advance one sample.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        self.ramp.advance()
    }

    /// Advance a whole block at once.
    #[inline]
    pub fn advance_by(&mut self, samples: u32) -> f32 {
        self.ramp.advance_by(samples)
    }

    /// Returns `true` once `current == target`.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.ramp.is_settled()
    }
}

/// Per-sample parameter values, indexed like the owning [`ParamSet`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParamFrame([f32; MAX_PARAMS]);

impl ParamFrame {
    /// Value at `index`, or `0.0` past the declared parameters.
    #[inline]
    pub fn get(&self, index: usize) -> f32 {
        self.0.get(index).copied().unwrap_or(0.0)
    }

    /// Interpret the value at `index` as a switch.
    #[inline]
    pub fn is_on(&self, index: usize) -> bool {
        self.get(index) >= 0.5
    }
}

impl Index<usize> for ParamFrame {
    type Output = f32;

    #[inline]
    fn index(&self, index: usize) -> &f32 {
        &self.0[index]
    }
}

/// The ordered parameter set of one effect instance.
///
/// Built once on the control side from a static descriptor table; the audio
/// side only mutates values in place, never resizes.
#[derive(Debug, Clone)]
pub struct ParamSet {
    values: Vec<ParamValue>,
}

impl ParamSet {
    /// Build a set at default values.
    ///
    /// Descriptors beyond [`MAX_PARAMS`] are ignored.
    pub fn from_descriptors(descriptors: &'static [ParamDescriptor], ramp_samples: u32) -> Self {
        #[cfg(feature = "tracing")]
        {
            if descriptors.len() > MAX_PARAMS {
                tracing::warn!(
                    declared = descriptors.len(),
                    max = MAX_PARAMS,
                    "parameter table truncated"
                );
            }
        }

        let values = descriptors
            .iter()
            .take(MAX_PARAMS)
            .map(|d| ParamValue::new(d, ramp_samples))
            .collect();
        Self { values }
    }

    /// Number of parameters.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the effect declares no parameters.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parameter at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&ParamValue> {
        self.values.get(index)
    }

    /// Mutable parameter at `index`.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut ParamValue> {
        self.values.get_mut(index)
    }

    /// Index of the parameter called `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.values.iter().position(|p| p.name() == name)
    }

    /// Iterate in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ParamValue> {
        self.values.iter()
    }

    /// Current value of the parameter at `index`, or `0.0` if out of range.
    #[inline]
    pub fn current(&self, index: usize) -> f32 {
        self.values.get(index).map_or(0.0, ParamValue::current)
    }

    /// Set the target of the parameter at `index`. Out-of-range indices are ignored.
    #[inline]
    pub fn set_target(&mut self, index: usize, value: f32) {
        if let Some(param) = self.values.get_mut(index) {
            param.set_target(value);
        }
    }

    /// Change the ramp length of every continuous parameter.
    pub fn set_ramp_samples(&mut self, ramp_samples: u32) {
        for param in &mut self.values {
            param.set_ramp_samples(ramp_samples);
        }
    }

    /// Advance every parameter one sample and return the new values.
    #[inline]
    pub fn tick(&mut self) -> ParamFrame {
        let mut frame = ParamFrame::default();
        for (slot, param) in frame.0.iter_mut().zip(self.values.iter_mut()) {
            *slot = param.advance();
        }
        frame
    }

    /// Current values without advancing.
    #[inline]
    pub fn frame(&self) -> ParamFrame {
        let mut frame = ParamFrame::default();
        for (slot, param) in frame.0.iter_mut().zip(self.values.iter()) {
            *slot = param.current();
        }
        frame
    }

    /// Advance every parameter by a whole block.
    #[inline]
    pub fn advance_by(&mut self, samples: u32) {
        for param in &mut self.values {
            param.advance_by(samples);
        }
    }

    /// Returns `true` when no parameter is mid-ramp.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.values.iter().all(ParamValue::is_settled)
    }
}
