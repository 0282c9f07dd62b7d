//! Static parameter metadata.
//!
//! Every hosted effect declares its parameters as a `static` table of
//! [`ParamDescriptor`]s. The table is the single source of truth for a
//! parameter's name, range, default and smoothing policy: the control side
//! validates against it before anything is enqueued, and the audio side clamps
//! against it when a new target arrives.
//!
//! # Example
//!
//! ```rust
//! use tonechain_core::{ParamDescriptor, ParamUnit};
//!
//! static FEEDBACK: ParamDescriptor =
//!     ParamDescriptor::continuous("feedback", "Feedback", ParamUnit::Ratio, 0.0, 0.95, 0.3);
//!
//! assert_eq!(FEEDBACK.clamp(1.5), 0.95);
//! assert!(FEEDBACK.contains(0.5));
//! assert!(!FEEDBACK.is_stepped());
//! ```

/// Bit flags describing how a parameter behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamFlags(u8);

impl ParamFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Parameter can be automated from the control side.
    pub const AUTOMATABLE: Self = Self(1 << 0);
    /// Parameter takes discrete values and is applied without ramping.
    pub const STEPPED: Self = Self(1 << 1);

    /// Returns `true` if all bits of `other` are set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of two flag sets.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl Default for ParamFlags {
    fn default() -> Self {
        Self::AUTOMATABLE
    }
}

/// Unit of a parameter value, used for display formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamUnit {
    /// Decibels (gain, drive).
    Decibels,
    /// Seconds (delay time).
    Seconds,
    /// Unitless 0..1 style ratio (tone, mix, feedback).
    Ratio,
    /// On/off switch stored as 0.0 / 1.0.
    Toggle,
}

impl ParamUnit {
    /// Suffix appended when formatting a value of this unit.
    pub const fn suffix(&self) -> &'static str {
        match self {
            Self::Decibels => " dB",
            Self::Seconds => " s",
            Self::Ratio | Self::Toggle => "",
        }
    }
}

/// Describes a single parameter's identity, range and smoothing policy.
///
/// `name` is the stable key used in update messages and presets
/// (`"gain_db"`, `"delay_seconds"`). `label` is for display only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Stable key, matched exactly (case-sensitive).
    pub name: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    /// Display unit.
    pub unit: ParamUnit,
    /// Minimum allowed value.
    pub min: f32,
    /// Maximum allowed value.
    pub max: f32,
    /// Value a freshly constructed effect starts at.
    pub default: f32,
    /// Recommended increment for encoder-style control.
    pub step: f32,
    /// Behaviour flags.
    pub flags: ParamFlags,
}

impl ParamDescriptor {
    /// A continuously variable parameter, linearly ramped on change.
    pub const fn continuous(
        name: &'static str,
        label: &'static str,
        unit: ParamUnit,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            name,
            label,
            unit,
            min,
            max,
            default,
            step: 0.01,
            flags: ParamFlags::AUTOMATABLE,
        }
    }

    /// An on/off parameter. Changes apply immediately, without ramping.
    pub const fn toggle(name: &'static str, label: &'static str, default_on: bool) -> Self {
        Self {
            name,
            label,
            unit: ParamUnit::Toggle,
            min: 0.0,
            max: 1.0,
            default: if default_on { 1.0 } else { 0.0 },
            step: 1.0,
            flags: ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED),
        }
    }

    /// Overrides the encoder step.
    pub const fn with_step(mut self, step: f32) -> Self {
        self.step = step;
        self
    }

    /// Returns `true` if changes bypass the ramp.
    #[inline]
    pub const fn is_stepped(&self) -> bool {
        self.flags.contains(ParamFlags::STEPPED)
    }

    /// Returns `true` if `value` is finite and inside `[min, max]`.
    #[inline]
    pub fn contains(&self, value: f32) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }

    /// Clamp a value into `[min, max]`.
    ///
    /// Stepped parameters are additionally snapped to the nearer of 0 and 1.
    /// A NaN input yields the default.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.default;
        }
        let clamped = value.clamp(self.min, self.max);
        if self.is_stepped() {
            if clamped >= 0.5 { self.max } else { self.min }
        } else {
            clamped
        }
    }
}
