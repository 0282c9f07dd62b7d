//! One-pole lowpass filter for tone controls.
//!
//! ```text
//! y[n] = x[n] + coeff * (y[n-1] - x[n])
//! ```
//!
//! where `coeff = exp(-2π * freq / sample_rate)`.

use crate::flush_denormal;
use libm::expf;

/// One-pole (6 dB/oct) lowpass filter.
///
/// # Example
///
/// ```rust
/// use tonechain_core::OnePole;
///
/// let mut lp = OnePole::new(48000.0, 4000.0);
/// let filtered = lp.process(1.0);
/// assert!(filtered < 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct OnePole {
    state: f32,
    coeff: f32,
    sample_rate: f32,
    freq: f32,
}

impl OnePole {
    /// Create a lowpass at `freq_hz`.
    pub fn new(sample_rate: f32, freq_hz: f32) -> Self {
        let mut filter = Self {
            state: 0.0,
            coeff: 0.0,
            sample_rate,
            freq: freq_hz,
        };
        filter.recalculate_coeff();
        filter
    }

    /// Set the cutoff frequency. Skips the `exp` when unchanged.
    #[inline]
    pub fn set_frequency(&mut self, freq_hz: f32) {
        if (freq_hz - self.freq).abs() > 1e-3 {
            self.freq = freq_hz;
            self.recalculate_coeff();
        }
    }

    /// Current cutoff in Hz.
    pub fn frequency(&self) -> f32 {
        self.freq
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.state = flush_denormal(input + self.coeff * (self.state - input));
        self.state
    }

    /// Reset filter state to zero.
    pub fn reset(&mut self) {
        self.state = 0.0;
    }

    fn recalculate_coeff(&mut self) {
        let nyquist = self.sample_rate * 0.5;
        let freq = self.freq.clamp(1.0, nyquist);
        self.coeff = expf(-core::f32::consts::TAU * freq / self.sample_rate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_dc() {
        let mut lp = OnePole::new(48000.0, 1000.0);
        let mut out = 0.0;
        for _ in 0..48000 {
            out = lp.process(1.0);
        }
        assert!((out - 1.0).abs() < 1e-4, "DC should pass through, got {out}");
    }

    #[test]
    fn attenuates_high_freq() {
        let mut lp = OnePole::new(48000.0, 100.0);
        let mut sum = 0.0f32;
        for i in 0..4800 {
            let input = if i % 2 == 0 { 1.0 } else { -1.0 };
            sum += lp.process(input).abs();
        }
        let avg = sum / 4800.0;
        assert!(avg < 0.05, "Nyquist signal should be heavily attenuated, avg = {avg}");
    }

    #[test]
    fn reset_clears_state() {
        let mut lp = OnePole::new(48000.0, 1000.0);
        lp.process(1.0);
        lp.reset();
        assert_eq!(lp.process(0.0), 0.0);
    }

    #[test]
    fn set_frequency_updates_cutoff() {
        let mut lp = OnePole::new(48000.0, 1000.0);
        lp.set_frequency(2000.0);
        assert_eq!(lp.frequency(), 2000.0);
    }
}
