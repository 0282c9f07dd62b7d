//! Feedback echo with optional tempo sync.

use libm::roundf;
use tonechain_core::{
    Effect, InterpolatedDelay, ParamDescriptor, ParamFrame, ParamUnit, ProcessContext,
    flush_denormal, wet_dry_mix,
};

/// Index of `delay_seconds` in [`PARAMS`].
pub const DELAY_SECONDS: usize = 0;
/// Index of `feedback` in [`PARAMS`].
pub const FEEDBACK: usize = 1;
/// Index of `mix` in [`PARAMS`].
pub const MIX: usize = 2;
/// Index of `tempo_sync` in [`PARAMS`].
pub const TEMPO_SYNC: usize = 3;

/// Longest supported delay time.
pub const MAX_DELAY_SECONDS: f32 = 2.0;

/// Parameter table.
pub static PARAMS: [ParamDescriptor; 4] = [
    ParamDescriptor::continuous(
        "delay_seconds",
        "Time",
        ParamUnit::Seconds,
        0.0,
        MAX_DELAY_SECONDS,
        0.25,
    )
    .with_step(0.001),
    ParamDescriptor::continuous("feedback", "Feedback", ParamUnit::Ratio, 0.0, 0.95, 0.3),
    ParamDescriptor::continuous("mix", "Mix", ParamUnit::Ratio, 0.0, 1.0, 0.3),
    ParamDescriptor::toggle("tempo_sync", "Tempo Sync", false),
];

/// Snap `seconds` to the nearest sixteenth note at `tempo_bpm`.
///
/// Never shorter than one sixteenth, never longer than [`MAX_DELAY_SECONDS`].
pub fn sync_to_tempo(seconds: f32, tempo_bpm: f32) -> f32 {
    if tempo_bpm <= 0.0 {
        return seconds;
    }
    let sixteenth = 15.0 / tempo_bpm;
    let steps = roundf(seconds / sixteenth).max(1.0);
    let mut synced = steps * sixteenth;
    while synced > MAX_DELAY_SECONDS && synced > sixteenth {
        synced -= sixteenth;
    }
    synced.min(MAX_DELAY_SECONDS)
}

/// Feedback delay.
///
/// The delay line is sized for [`MAX_DELAY_SECONDS`] at construction and is
/// never resized. Feedback is written back through [`flush_denormal`] so long
/// tails decay to true silence.
#[derive(Debug, Clone)]
pub struct Delay {
    line: InterpolatedDelay,
    sample_rate: f32,
}

impl Delay {
    /// Create a delay at `sample_rate`.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            line: InterpolatedDelay::from_time(sample_rate, MAX_DELAY_SECONDS + 0.001),
            sample_rate,
        }
    }
}

impl Effect for Delay {
    #[inline]
    fn process_sample(&mut self, input: f32, params: &ParamFrame, ctx: &ProcessContext) -> f32 {
        let seconds = if params.is_on(TEMPO_SYNC) {
            sync_to_tempo(params[DELAY_SECONDS], ctx.tempo_bpm)
        } else {
            params[DELAY_SECONDS]
        };
        // Read before write: a delay of N samples is N - 1 back from the last write.
        let delay_samples = (seconds * self.sample_rate).max(1.0) - 1.0;

        let delayed = self.line.read(delay_samples);
        self.line
            .write(flush_denormal(input + delayed * params[FEEDBACK]));

        wet_dry_mix(input, delayed, params[MIX])
    }

    fn reset(&mut self) {
        self.line.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonechain_core::ParamSet;

    fn params(seconds: f32, feedback: f32, mix: f32) -> ParamSet {
        let mut set = ParamSet::from_descriptors(&PARAMS, 0);
        set.set_target(DELAY_SECONDS, seconds);
        set.set_target(FEEDBACK, feedback);
        set.set_target(MIX, mix);
        set
    }

    #[test]
    fn echo_arrives_after_delay_time() {
        // 0.125 s at 1024 Hz = 128 samples, exact in binary
        let mut set = params(0.125, 0.0, 1.0);
        let mut delay = Delay::new(1024.0);
        let mut block = vec![0.0f32; 300];
        block[0] = 1.0;
        delay.process_block(&mut block, &mut set, &ProcessContext::new(1024.0));

        assert_eq!(block[0], 0.0);
        assert_eq!(block[127], 0.0);
        assert_eq!(block[128], 1.0);
        assert_eq!(block[129], 0.0);
    }

    #[test]
    fn feedback_repeats_decay() {
        let mut set = params(0.03125, 0.5, 1.0);
        let mut delay = Delay::new(1024.0);
        let mut block = vec![0.0f32; 200];
        block[0] = 1.0;
        delay.process_block(&mut block, &mut set, &ProcessContext::new(1024.0));

        assert_eq!(block[32], 1.0);
        assert_eq!(block[64], 0.5);
        assert_eq!(block[96], 0.25);
    }

    #[test]
    fn dry_only_passes_through() {
        let mut set = params(0.25, 0.9, 0.0);
        let mut delay = Delay::new(48000.0);
        let input: Vec<f32> = (0..256).map(|i| (i as f32 * 0.1).sin()).collect();
        let mut block = input.clone();
        delay.process_block(&mut block, &mut set, &ProcessContext::new(48000.0));
        assert_eq!(block, input);
    }

    #[test]
    fn tempo_sync_snaps_to_sixteenths() {
        // 120 BPM: sixteenth = 0.125 s
        assert!((sync_to_tempo(0.3, 120.0) - 0.25).abs() < 1e-6);
        assert!((sync_to_tempo(0.0, 120.0) - 0.125).abs() < 1e-6);
        assert!((sync_to_tempo(2.0, 120.0) - 2.0).abs() < 1e-6);
        // 35 BPM: 2.0 s rounds to five sixteenths (2.14 s), pulled back under the limit
        let synced = sync_to_tempo(2.0, 35.0);
        assert!(synced <= MAX_DELAY_SECONDS);
        assert!((synced - 4.0 * 15.0 / 35.0).abs() < 1e-5);
        assert_eq!(sync_to_tempo(0.3, 0.0), 0.3);
    }

    #[test]
    fn tempo_sync_changes_echo_position() {
        let mut set = params(0.01, 0.0, 1.0);
        set.set_target(TEMPO_SYNC, 1.0);
        let mut delay = Delay::new(1024.0);
        let ctx = ProcessContext::new(1024.0).with_tempo(480.0);
        // 480 BPM: sixteenth = 31.25 ms = 32 samples at 1024 Hz
        let mut block = vec![0.0f32; 64];
        block[0] = 1.0;
        delay.process_block(&mut block, &mut set, &ctx);
        assert_eq!(block[32], 1.0);
    }

    #[test]
    fn reset_clears_line() {
        let mut set = params(0.001, 0.0, 1.0);
        let mut delay = Delay::new(48000.0);
        let ctx = ProcessContext::new(48000.0);
        let mut block = [1.0f32; 32];
        delay.process_block(&mut block, &mut set, &ctx);
        delay.reset();
        let mut silence = [0.0f32; 96];
        delay.process_block(&mut silence, &mut set, &ctx);
        assert_eq!(silence, [0.0; 96]);
    }
}
