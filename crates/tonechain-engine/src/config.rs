//! Engine configuration.
//!
//! Block size, sample rate and smoothing windows are agreed before the engine
//! is built and never change while it runs. A device that changes format
//! mid-stream is reported as a fault rather than reconfigured in place.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tonechain_core::ms_to_samples;

use crate::error::ControlError;

/// Sample rates the engine accepts.
pub const SUPPORTED_SAMPLE_RATES: [u32; 3] = [44100, 48000, 96000];

/// Block sizes the engine accepts.
pub const SUPPORTED_BLOCK_SIZES: [usize; 7] = [32, 64, 128, 256, 512, 1024, 2048];

/// Engine configuration.
///
/// # Example
///
/// ```rust
/// use tonechain_engine::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.ramp_samples(), 480);
/// assert!(config.is_low_latency());
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Agreed sample rate in Hz.
    pub sample_rate: u32,
    /// Maximum samples processed per node call.
    pub block_size: usize,
    /// Parameter ramp window in milliseconds.
    pub ramp_ms: f32,
    /// Bypass, insertion and removal crossfade in milliseconds.
    pub crossfade_ms: f32,
    /// Capacity of the update queue.
    pub queue_capacity: usize,
    /// Maximum updates applied per callback.
    pub drain_limit: usize,
    /// Capacity of the event channel.
    pub event_capacity: usize,
    /// Tempo used by tempo-synced parameters.
    pub tempo_bpm: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            block_size: 256,
            ramp_ms: 10.0,
            crossfade_ms: 3.0,
            queue_capacity: 256,
            drain_limit: 64,
            event_capacity: 256,
            tempo_bpm: 120.0,
        }
    }
}

impl EngineConfig {
    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<(), ControlError> {
        if !SUPPORTED_SAMPLE_RATES.contains(&self.sample_rate) {
            return Err(ControlError::invalid_config(format!(
                "unsupported sample rate {} (expected one of {:?})",
                self.sample_rate, SUPPORTED_SAMPLE_RATES
            )));
        }
        if !SUPPORTED_BLOCK_SIZES.contains(&self.block_size) {
            return Err(ControlError::invalid_config(format!(
                "unsupported block size {} (expected one of {:?})",
                self.block_size, SUPPORTED_BLOCK_SIZES
            )));
        }
        if !(5.0..=20.0).contains(&self.ramp_ms) {
            return Err(ControlError::invalid_config(format!(
                "ramp_ms {} outside 5-20 ms",
                self.ramp_ms
            )));
        }
        if !(1.0..=20.0).contains(&self.crossfade_ms) {
            return Err(ControlError::invalid_config(format!(
                "crossfade_ms {} outside 1-20 ms",
                self.crossfade_ms
            )));
        }
        if self.queue_capacity == 0 || self.drain_limit == 0 || self.event_capacity == 0 {
            return Err(ControlError::invalid_config(
                "queue_capacity, drain_limit and event_capacity must be at least 1",
            ));
        }
        if !(20.0..=300.0).contains(&self.tempo_bpm) {
            return Err(ControlError::invalid_config(format!(
                "tempo_bpm {} outside 20-300",
                self.tempo_bpm
            )));
        }
        Ok(())
    }

    /// Sample rate as `f32`, for DSP code.
    #[inline]
    pub fn sample_rate_hz(&self) -> f32 {
        self.sample_rate as f32
    }

    /// Parameter ramp window in samples.
    pub fn ramp_samples(&self) -> u32 {
        ms_to_samples(self.ramp_ms, self.sample_rate_hz()).round() as u32
    }

    /// Crossfade window in samples.
    pub fn crossfade_samples(&self) -> u32 {
        ms_to_samples(self.crossfade_ms, self.sample_rate_hz()).round() as u32
    }

    /// Latency contributed by one block, in milliseconds.
    pub fn theoretical_latency_ms(&self) -> f32 {
        self.block_size as f32 / self.sample_rate_hz() * 1000.0
    }

    /// Returns `true` if one block is at most 10 ms.
    pub fn is_low_latency(&self) -> bool {
        self.theoretical_latency_ms() <= 10.0
    }

    /// Returns `true` for block sizes and rates suitable for live playing.
    pub fn is_realtime_capable(&self) -> bool {
        self.block_size <= 1024 && self.sample_rate >= 44100
    }

    /// Deadline for one full block.
    pub fn block_period(&self) -> Duration {
        self.period_for(self.block_size)
    }

    /// Deadline for a callback of `samples` samples.
    #[inline]
    pub fn period_for(&self, samples: usize) -> Duration {
        Duration::from_secs_f64(samples as f64 / f64::from(self.sample_rate))
    }
}
