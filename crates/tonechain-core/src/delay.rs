//! Circular-buffer delay line with fractional reads.
//!
//! The echo effect and the reverb's comb/allpass sections are all built on
//! [`InterpolatedDelay`]. The buffer is sized once, on the control side, for
//! the longest delay the owner will ever request; processing never reallocates.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

/// Interpolated delay line using a circular buffer (heap-allocated).
///
/// Supports fractional delay times through linear interpolation, so the
/// delay time can ramp without stepping artifacts.
///
/// # Example
///
/// ```rust
/// use tonechain_core::InterpolatedDelay;
///
/// // 50 ms max delay at 48 kHz
/// let mut delay = InterpolatedDelay::from_time(48000.0, 0.05);
///
/// delay.write(1.0);
/// for _ in 0..9 {
///     delay.write(0.0);
/// }
/// // The impulse was written 9 samples before the last write
/// assert_eq!(delay.read(9.0), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct InterpolatedDelay {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl InterpolatedDelay {
    /// Creates a new delay line holding up to `max_delay_samples` samples.
    ///
    /// A zero capacity is rounded up to one sample.
    pub fn new(max_delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; max_delay_samples.max(1)],
            write_pos: 0,
        }
    }

    /// Creates a delay line from sample rate and max delay time in seconds.
    pub fn from_time(sample_rate: f32, max_seconds: f32) -> Self {
        let max_samples = (sample_rate * max_seconds) as usize + 1;
        Self::new(max_samples)
    }

    /// Reads a delayed sample with linear interpolation.
    ///
    /// `delay_samples` counts back from the most recently written sample and is
    /// clamped to `[0, capacity - 1]`.
    #[inline]
    pub fn read(&self, delay_samples: f32) -> f32 {
        let len = self.buffer.len();
        let delay_clamped = delay_samples.clamp(0.0, (len - 1) as f32);

        let delay_int = delay_clamped as usize;
        let frac = delay_clamped - delay_int as f32;

        // Points at the sample `delay_int` samples before the last write.
        let read_pos = (self.write_pos + len - delay_int - 1) % len;
        let next_pos = (read_pos + len - 1) % len;

        let a = self.buffer[read_pos];
        let b = self.buffer[next_pos];
        a + (b - a) * frac
    }

    /// Writes a sample and advances the write position.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Read at `delay_samples`, then write `sample`.
    #[inline]
    pub fn read_write(&mut self, sample: f32, delay_samples: f32) -> f32 {
        let output = self.read(delay_samples);
        self.write(sample);
        output
    }

    /// Clears the delay line (sets all samples to 0).
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    /// Returns the maximum delay capacity in samples.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }
}
