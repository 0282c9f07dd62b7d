//! Feedback comb filter with damping, the building block of Freeverb.

use crate::InterpolatedDelay;
use crate::flush_denormal;

/// Lowpass-feedback comb filter.
///
/// The delayed output is run through a one-pole lowpass before it is fed
/// back, so high frequencies decay faster than low ones, as in a real room.
///
/// # Example
///
/// ```rust
/// use tonechain_core::CombFilter;
///
/// let mut comb = CombFilter::new(1116);
/// comb.set_feedback(0.84);
/// comb.set_damp(0.2);
///
/// let output = comb.process(1.0);
/// assert_eq!(output, 0.0); // nothing has come round yet
/// ```
#[derive(Debug, Clone)]
pub struct CombFilter {
    delay: InterpolatedDelay,
    feedback: f32,
    damp1: f32,
    damp2: f32,
    filterstore: f32,
}

impl CombFilter {
    /// Create a comb filter with the given loop length in samples.
    pub fn new(delay_samples: usize) -> Self {
        Self {
            delay: InterpolatedDelay::new(delay_samples),
            feedback: 0.5,
            damp1: 0.0,
            damp2: 1.0,
            filterstore: 0.0,
        }
    }

    /// Set the loop feedback gain, clamped to `[0, 0.99]`.
    #[inline]
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.99);
    }

    /// Set high-frequency damping in `[0, 1]`; 0 is bright, 1 is dark.
    #[inline]
    pub fn set_damp(&mut self, damp: f32) {
        self.damp1 = damp.clamp(0.0, 1.0);
        self.damp2 = 1.0 - self.damp1;
    }

    /// Process a single sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let delay_samples = (self.delay.capacity() - 1) as f32;
        let output = self.delay.read(delay_samples);

        self.filterstore = flush_denormal(output * self.damp2 + self.filterstore * self.damp1);
        self.delay.write(input + self.filterstore * self.feedback);

        output
    }

    /// Clear the comb filter state.
    pub fn clear(&mut self) {
        self.delay.clear();
        self.filterstore = 0.0;
    }

    /// Loop length in samples.
    pub fn capacity(&self) -> usize {
        self.delay.capacity()
    }
}
