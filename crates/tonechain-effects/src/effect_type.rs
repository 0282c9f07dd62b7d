//! Effect identity and parameter tables.

use core::fmt;
use core::str::FromStr;

use tonechain_core::ParamDescriptor;

use crate::{boost, delay, distortion, reverb};

/// The closed set of effects the engine can host.
///
/// Serialises as a lowercase string (`"boost"`, `"distortion"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EffectType {
    /// Clean gain stage.
    Boost,
    /// Overdrive / waveshaper.
    Distortion,
    /// Feedback echo.
    Delay,
    /// Room reverb.
    Reverb,
}

impl EffectType {
    /// Every effect type, in catalogue order.
    pub const ALL: [EffectType; 4] = [
        EffectType::Boost,
        EffectType::Distortion,
        EffectType::Delay,
        EffectType::Reverb,
    ];

    /// Stable lowercase key used in presets and logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Boost => "boost",
            Self::Distortion => "distortion",
            Self::Delay => "delay",
            Self::Reverb => "reverb",
        }
    }

    /// Human-readable name.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Boost => "Boost",
            Self::Distortion => "Distortion",
            Self::Delay => "Delay",
            Self::Reverb => "Reverb",
        }
    }

    /// Look an effect type up by key, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }

    /// The effect's parameter table, in declaration order.
    pub fn params(self) -> &'static [ParamDescriptor] {
        match self {
            Self::Boost => &boost::PARAMS,
            Self::Distortion => &distortion::PARAMS,
            Self::Delay => &delay::PARAMS,
            Self::Reverb => &reverb::PARAMS,
        }
    }

    /// Index of the parameter called `name` (exact match).
    pub fn param_index(self, name: &str) -> Option<usize> {
        self.params().iter().position(|d| d.name == name)
    }

    /// Descriptor of the parameter called `name` (exact match).
    pub fn param(self, name: &str) -> Option<&'static ParamDescriptor> {
        self.params().iter().find(|d| d.name == name)
    }
}

impl fmt::Display for EffectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when parsing an unknown effect key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownEffectType;

impl fmt::Display for UnknownEffectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown effect type")
    }
}

impl core::error::Error for UnknownEffectType {}

impl FromStr for EffectType {
    type Err = UnknownEffectType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or(UnknownEffectType)
    }
}
