//! Freeverb-style room reverb.
//!
//! Eight damped feedback combs in parallel feed four allpasses in series.
//! Loop lengths are the classic Freeverb tunings at 44.1 kHz, scaled to the
//! running sample rate.

use tonechain_core::{
    AllpassFilter, CombFilter, Effect, ParamDescriptor, ParamFrame, ParamUnit, ProcessContext,
};

/// Index of `room_size` in [`PARAMS`].
pub const ROOM_SIZE: usize = 0;
/// Index of `damping` in [`PARAMS`].
pub const DAMPING: usize = 1;
/// Index of `wet_level` in [`PARAMS`].
pub const WET_LEVEL: usize = 2;
/// Index of `dry_level` in [`PARAMS`].
pub const DRY_LEVEL: usize = 3;

/// Parameter table.
pub static PARAMS: [ParamDescriptor; 4] = [
    ParamDescriptor::continuous("room_size", "Room Size", ParamUnit::Ratio, 0.0, 1.0, 0.5),
    ParamDescriptor::continuous("damping", "Damping", ParamUnit::Ratio, 0.0, 1.0, 0.5),
    ParamDescriptor::continuous("wet_level", "Wet", ParamUnit::Ratio, 0.0, 1.0, 0.3),
    ParamDescriptor::continuous("dry_level", "Dry", ParamUnit::Ratio, 0.0, 1.0, 0.7),
];

const COMB_TUNINGS_44K: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
const ALLPASS_TUNINGS_44K: [usize; 4] = [556, 441, 341, 225];

fn scale_to_rate(samples_44k: usize, sample_rate: f32) -> usize {
    ((samples_44k as f32 * sample_rate / 44100.0) as usize).max(1)
}

/// Room reverb.
///
/// # Example
///
/// ```rust
/// use tonechain_core::{Effect, ParamSet, ProcessContext};
/// use tonechain_effects::{EffectType, Reverb};
///
/// let mut params = ParamSet::from_descriptors(EffectType::Reverb.params(), 480);
/// let mut reverb = Reverb::new(48000.0);
/// let mut block = [0.0f32; 256];
/// block[0] = 1.0;
/// reverb.process_block(&mut block, &mut params, &ProcessContext::new(48000.0));
/// assert!((block[0] - 0.7).abs() < 1e-6); // dry path only, the tail arrives later
/// ```
#[derive(Debug, Clone)]
pub struct Reverb {
    combs: [CombFilter; 8],
    allpasses: [AllpassFilter; 4],
    cached_room: f32,
    cached_damp: f32,
}

impl Reverb {
    /// Create a reverb at `sample_rate`, tuned for the default room.
    pub fn new(sample_rate: f32) -> Self {
        let mut reverb = Self {
            combs: core::array::from_fn(|i| {
                CombFilter::new(scale_to_rate(COMB_TUNINGS_44K[i], sample_rate))
            }),
            allpasses: core::array::from_fn(|i| {
                let mut ap = AllpassFilter::new(scale_to_rate(ALLPASS_TUNINGS_44K[i], sample_rate));
                ap.set_feedback(0.5);
                ap
            }),
            cached_room: -1.0,
            cached_damp: -1.0,
        };
        reverb.update_combs(PARAMS[ROOM_SIZE].default, PARAMS[DAMPING].default);
        reverb
    }

    /// Recompute comb coefficients when room or damping moved.
    #[inline]
    fn update_combs(&mut self, room: f32, damp: f32) {
        if (room - self.cached_room).abs() < 1e-3 && (damp - self.cached_damp).abs() < 1e-3 {
            return;
        }
        self.cached_room = room;
        self.cached_damp = damp;

        // 0.28 (small room) to 0.98 (hall)
        let feedback = 0.28 + room * 0.7;
        for comb in &mut self.combs {
            comb.set_feedback(feedback);
            comb.set_damp(damp);
        }
    }
}

impl Effect for Reverb {
    #[inline]
    fn process_sample(&mut self, input: f32, params: &ParamFrame, _ctx: &ProcessContext) -> f32 {
        self.update_combs(params[ROOM_SIZE], params[DAMPING]);

        let mut comb_sum = 0.0f32;
        for comb in &mut self.combs {
            comb_sum += comb.process(input);
        }
        comb_sum *= 0.125;

        let mut wet = comb_sum;
        for allpass in &mut self.allpasses {
            wet = allpass.process(wet);
        }

        input * params[DRY_LEVEL] + wet * params[WET_LEVEL]
    }

    fn reset(&mut self) {
        for comb in &mut self.combs {
            comb.clear();
        }
        for allpass in &mut self.allpasses {
            allpass.clear();
        }
    }
}
