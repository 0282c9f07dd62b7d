//! Block timing.
//!
//! The engine measures each callback against its deadline through a
//! [`BlockClock`]. The default reads the monotonic clock; tests and offline
//! rendering substitute a [`FixedClock`] so underrun accounting is
//! deterministic.

use std::time::{Duration, Instant};

/// Measures how long one callback took.
pub trait BlockClock: Send {
    /// Called at the top of a callback.
    fn begin(&mut self);

    /// Time since the last [`begin`](Self::begin).
    fn elapsed(&self) -> Duration;
}

/// Wall-clock timing with [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    started: Instant,
}

impl MonotonicClock {
    /// New clock, started now.
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockClock for MonotonicClock {
    #[inline]
    fn begin(&mut self) {
        self.started = Instant::now();
    }

    #[inline]
    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Reports the same elapsed time for every callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedClock {
    elapsed: Duration,
}

impl FixedClock {
    /// Every callback appears to take `elapsed`.
    pub const fn new(elapsed: Duration) -> Self {
        Self { elapsed }
    }
}

impl BlockClock for FixedClock {
    fn begin(&mut self) {}

    fn elapsed(&self) -> Duration {
        self.elapsed
    }
}
