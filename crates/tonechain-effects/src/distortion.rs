//! Soft-clipping overdrive with tone and level controls.
//!
//! Signal flow: drive gain, `tanh` waveshaper, one-pole lowpass tone,
//! linear output level.

use libm::expf;
use tonechain_core::{
    Effect, OnePole, ParamDescriptor, ParamFrame, ParamUnit, ProcessContext, db_to_linear,
    soft_clip,
};

/// Index of `drive_db` in [`PARAMS`].
pub const DRIVE_DB: usize = 0;
/// Index of `tone` in [`PARAMS`].
pub const TONE: usize = 1;
/// Index of `level` in [`PARAMS`].
pub const LEVEL: usize = 2;

/// Parameter table.
pub static PARAMS: [ParamDescriptor; 3] = [
    ParamDescriptor::continuous("drive_db", "Drive", ParamUnit::Decibels, 0.0, 30.0, 10.0)
        .with_step(0.5),
    ParamDescriptor::continuous("tone", "Tone", ParamUnit::Ratio, 0.0, 1.0, 0.5),
    ParamDescriptor::continuous("level", "Level", ParamUnit::Ratio, 0.0, 1.0, 0.7),
];

const TONE_MIN_HZ: f32 = 800.0;
const TONE_MAX_HZ: f32 = 8000.0;

/// Map tone `0..1` exponentially onto `800 Hz..8 kHz`.
#[inline]
fn tone_to_hz(tone: f32) -> f32 {
    // 800 * 10^tone
    TONE_MIN_HZ * expf(tone * core::f32::consts::LN_10)
}

/// Overdrive effect.
///
/// # Example
///
/// ```rust
/// use tonechain_core::{Effect, ParamSet, ProcessContext};
/// use tonechain_effects::{Distortion, EffectType};
///
/// let mut params = ParamSet::from_descriptors(EffectType::Distortion.params(), 480);
/// let mut dist = Distortion::new(48000.0);
/// let mut block = [0.5f32; 128];
/// dist.process_block(&mut block, &mut params, &ProcessContext::new(48000.0));
/// // Output never exceeds the level control
/// assert!(block.iter().all(|s| s.abs() <= 0.7 + 1e-6));
/// ```
#[derive(Debug, Clone)]
pub struct Distortion {
    tone_filter: OnePole,
    cached_tone: f32,
}

impl Distortion {
    /// Create a distortion at `sample_rate`, tone filter at the default setting.
    pub fn new(sample_rate: f32) -> Self {
        let tone = PARAMS[TONE].default;
        Self {
            tone_filter: OnePole::new(sample_rate, tone_to_hz(tone)),
            cached_tone: tone,
        }
    }

    /// Current tone filter cutoff in Hz.
    pub fn tone_hz(&self) -> f32 {
        self.tone_filter.frequency()
    }
}

impl Effect for Distortion {
    #[inline]
    fn process_sample(&mut self, input: f32, params: &ParamFrame, _ctx: &ProcessContext) -> f32 {
        let tone = params[TONE];
        if (tone - self.cached_tone).abs() > 1e-4 {
            self.cached_tone = tone;
            self.tone_filter
                .set_frequency(tone_to_hz(tone).min(TONE_MAX_HZ));
        }

        let shaped = soft_clip(input * db_to_linear(params[DRIVE_DB]));
        self.tone_filter.process(shaped) * params[LEVEL]
    }

    fn reset(&mut self) {
        self.tone_filter.reset();
    }
}
