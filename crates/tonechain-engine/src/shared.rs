//! State shared between the audio context and control contexts.
//!
//! Everything the audio context touches here is an atomic or a wait-free
//! channel endpoint. The audio context writes counters and the live snapshot
//! pointer; control contexts read them and drive lifecycle transitions.
//!
//! The retire list is the one locked field. Only control contexts lock it.
//! It holds every published snapshot until nothing else does, and since the
//! engine itself keeps this struct alive, the audio context never releases
//! the last reference to a snapshot even after every controller is gone.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use arc_swap::ArcSwap;
use crossbeam_channel::{Sender, TrySendError};
use parking_lot::Mutex;

use crate::event::{EngineEvent, FaultReason};
use crate::snapshot::ChainSnapshot;
use crate::state::{AtomicState, EngineState};

/// Point-in-time view of the engine's counters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineStatus {
    /// Lifecycle state.
    pub state: EngineState,
    /// Callbacks that processed audio.
    pub blocks_processed: u64,
    /// Callbacks that exceeded their deadline.
    pub underruns: u64,
    /// Time spent on the last callback divided by its deadline.
    pub last_block_load: f32,
    /// Generation of the chain the audio context is running.
    pub live_generation: u64,
    /// Updates addressed to nodes no longer in the chain.
    pub updates_ignored: u64,
    /// Events lost to a full event channel.
    pub events_dropped: u64,
    /// Non-finite samples replaced with silence.
    pub samples_sanitized: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) blocks: AtomicU64,
    pub(crate) underruns: AtomicU64,
    /// `f32` bits.
    pub(crate) load: AtomicU32,
    pub(crate) ignored_updates: AtomicU64,
    pub(crate) dropped_events: AtomicU64,
    pub(crate) sanitized: AtomicU64,
}

impl Counters {
    #[inline]
    pub(crate) fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn set_load(&self, load: f32) {
        self.load.store(load.to_bits(), Ordering::Relaxed);
    }

    fn load_value(&self) -> f32 {
        f32::from_bits(self.load.load(Ordering::Relaxed))
    }
}

pub(crate) struct EngineShared {
    pub(crate) state: AtomicState,
    /// Snapshot the audio context is running. Replaced only by the audio context.
    pub(crate) live: ArcSwap<ChainSnapshot>,
    pub(crate) counters: Counters,
    events: Sender<EngineEvent>,
    /// Published snapshots awaiting reclamation. Never locked by the audio context.
    retired: Mutex<Vec<Arc<ChainSnapshot>>>,
}

impl EngineShared {
    pub(crate) fn new(initial: Arc<ChainSnapshot>, events: Sender<EngineEvent>) -> Self {
        Self {
            state: AtomicState::new(EngineState::Stopped),
            live: ArcSwap::new(Arc::clone(&initial)),
            counters: Counters::default(),
            events,
            retired: Mutex::new(vec![initial]),
        }
    }

    /// Hold `snapshot` until [`collect_retired`](Self::collect_retired) finds it unused.
    pub(crate) fn retire(&self, snapshot: Arc<ChainSnapshot>) {
        self.retired.lock().push(snapshot);
    }

    /// Free snapshots referenced only by the retire list. Returns how many.
    pub(crate) fn collect_retired(&self) -> usize {
        let mut retired = self.retired.lock();
        let before = retired.len();
        retired.retain(|s| Arc::strong_count(s) > 1);
        before - retired.len()
    }

    pub(crate) fn retired_len(&self) -> usize {
        self.retired.lock().len()
    }

    /// Send an event without blocking.
    #[inline]
    pub(crate) fn emit(&self, event: EngineEvent) {
        if let Err(TrySendError::Full(_)) = self.events.try_send(event) {
            Counters::bump(&self.counters.dropped_events, 1);
        }
    }

    /// Compare-and-swap the lifecycle state, emitting `StateChanged` on success.
    pub(crate) fn transition(&self, from: EngineState, to: EngineState) -> Result<(), EngineState> {
        self.state.transition(from, to)?;
        self.emit(EngineEvent::StateChanged { from, to });
        Ok(())
    }

    /// Move any active state to `Faulted` and emit `DeviceFault`.
    ///
    /// Returns `false` if the engine was not active.
    pub(crate) fn fault(&self, reason: FaultReason) -> bool {
        for from in [EngineState::Running, EngineState::Starting, EngineState::Draining] {
            if self.transition(from, EngineState::Faulted).is_ok() {
                self.emit(EngineEvent::DeviceFault { reason });
                return true;
            }
        }
        false
    }

    pub(crate) fn live_generation(&self) -> u64 {
        self.live.load().generation()
    }

    pub(crate) fn status(&self) -> EngineStatus {
        let c = &self.counters;
        EngineStatus {
            state: self.state.load(),
            blocks_processed: c.blocks.load(Ordering::Relaxed),
            underruns: c.underruns.load(Ordering::Relaxed),
            last_block_load: c.load_value(),
            live_generation: self.live_generation(),
            updates_ignored: c.ignored_updates.load(Ordering::Relaxed),
            events_dropped: c.dropped_events.load(Ordering::Relaxed),
            samples_sanitized: c.sanitized.load(Ordering::Relaxed),
        }
    }
}
