//! Schroeder allpass filter for reverb diffusion.

use crate::InterpolatedDelay;
use crate::flush_denormal;

/// Schroeder allpass filter.
///
/// Passes all frequencies at equal gain while smearing phase, which turns
/// the comb bank's discrete echoes into a dense tail.
#[derive(Debug, Clone)]
pub struct AllpassFilter {
    delay: InterpolatedDelay,
    feedback: f32,
}

impl AllpassFilter {
    /// Create an allpass with the given delay in samples and feedback 0.5.
    pub fn new(delay_samples: usize) -> Self {
        Self {
            delay: InterpolatedDelay::new(delay_samples),
            feedback: 0.5,
        }
    }

    /// Set the feedback coefficient. Stable for `|feedback| < 1`.
    #[inline]
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(-0.99, 0.99);
    }

    /// Process a single sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let delay_samples = (self.delay.capacity() - 1) as f32;
        let delayed = self.delay.read(delay_samples);

        let output = -input + delayed;
        self.delay
            .write(flush_denormal(input + delayed * self.feedback));

        output
    }

    /// Clear the filter state.
    pub fn clear(&mut self) {
        self.delay.clear();
    }
}
