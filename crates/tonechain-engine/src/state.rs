//! Engine lifecycle states.
//!
//! ```text
//! Stopped ──start()──▶ Starting ──first callback──▶ Running
//!    ▲                    │                           │
//!    │                  stop()                      stop()
//!    │                    ▼                           ▼
//!    ├──────────────── Stopped ◀──next callback── Draining
//!    │
//!    └──clear_fault()── Faulted ◀──device fault── Running / Starting / Draining
//! ```
//!
//! The state is one `AtomicU8`. Every transition is a compare-and-swap from
//! an expected state, so a control thread calling `stop()` and the audio
//! thread completing `Starting → Running` never both succeed against the
//! same starting state.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of the effects engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EngineState {
    /// Not processing. Callbacks output silence.
    Stopped = 0,
    /// `start()` accepted; the next callback begins processing.
    Starting = 1,
    /// Processing audio.
    Running = 2,
    /// `stop()` accepted; the next callback outputs silence and stops.
    Draining = 3,
    /// The driver reported a device fault. Requires `clear_fault()`.
    Faulted = 4,
}

impl EngineState {
    /// Lowercase name, as used in log fields.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Faulted => "faulted",
        }
    }

    /// Returns `true` if callbacks in this state process audio.
    pub const fn is_processing(self) -> bool {
        matches!(self, Self::Running)
    }

    const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Starting,
            2 => Self::Running,
            3 => Self::Draining,
            4 => Self::Faulted,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lock-free cell holding an [`EngineState`].
#[derive(Debug)]
pub(crate) struct AtomicState(AtomicU8);

impl AtomicState {
    pub(crate) fn new(state: EngineState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    #[inline]
    pub(crate) fn load(&self) -> EngineState {
        EngineState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move from `from` to `to` if the current state is `from`.
    ///
    /// Returns the state observed before the attempt on failure.
    #[inline]
    pub(crate) fn transition(&self, from: EngineState, to: EngineState) -> Result<(), EngineState> {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(EngineState::from_u8)
    }
}
