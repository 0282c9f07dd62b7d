//! Clean boost with a tilt tone control.

use tonechain_core::{
    Effect, OnePole, ParamDescriptor, ParamFrame, ParamUnit, ProcessContext, db_to_linear,
};

/// Index of `gain_db` in [`PARAMS`].
pub const GAIN_DB: usize = 0;
/// Index of `tone` in [`PARAMS`].
pub const TONE: usize = 1;

/// Parameter table.
pub static PARAMS: [ParamDescriptor; 2] = [
    ParamDescriptor::continuous("gain_db", "Gain", ParamUnit::Decibels, -20.0, 30.0, 0.0)
        .with_step(0.5),
    ParamDescriptor::continuous("tone", "Tone", ParamUnit::Ratio, 0.0, 1.0, 0.5),
];

/// Pivot frequency of the tilt filter.
const TILT_PIVOT_HZ: f32 = 1200.0;

/// Clean gain stage.
///
/// Tone is a tilt around a one-pole lowpass: `0.5` is flat, lower values
/// keep only the lowpassed signal, higher values add extra highs.
///
/// # Example
///
/// ```rust
/// use tonechain_core::{Effect, ParamSet, ProcessContext};
/// use tonechain_effects::{Boost, EffectType};
///
/// let mut params = ParamSet::from_descriptors(EffectType::Boost.params(), 0);
/// params.set_target(0, 6.0);
/// let mut boost = Boost::new(48000.0);
/// let mut block = [0.1f32; 4];
/// boost.process_block(&mut block, &mut params, &ProcessContext::new(48000.0));
/// assert!((block[3] - 0.1995).abs() < 1e-3);
/// ```
#[derive(Debug, Clone)]
pub struct Boost {
    tilt: OnePole,
}

impl Boost {
    /// Create a boost at `sample_rate`.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            tilt: OnePole::new(sample_rate, TILT_PIVOT_HZ),
        }
    }
}

impl Effect for Boost {
    #[inline]
    fn process_sample(&mut self, input: f32, params: &ParamFrame, _ctx: &ProcessContext) -> f32 {
        let boosted = input * db_to_linear(params[GAIN_DB]);
        let low = self.tilt.process(boosted);
        low + (boosted - low) * (2.0 * params[TONE])
    }

    fn reset(&mut self) {
        self.tilt.reset();
    }
}
