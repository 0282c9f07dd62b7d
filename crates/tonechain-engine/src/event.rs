//! Engine events for observability.
//!
//! The audio context reports what happened (underruns, state changes, device
//! faults, sanitized output) as [`EngineEvent`]s on a bounded channel. Sending
//! never blocks; when the channel is full the event is dropped and counted.
//! A control thread drains the channel, typically through [`log_events`].

use std::fmt;

use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};

use crate::node::NodeId;
use crate::state::EngineState;

/// Why the driver reported a device fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultReason {
    /// The device went away.
    Disconnected,
    /// The device changed sample rate or format mid-stream.
    FormatChanged,
    /// The driver's stream reported an unrecoverable error.
    StreamError,
}

impl fmt::Display for FaultReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "device disconnected",
            Self::FormatChanged => "device format changed",
            Self::StreamError => "stream error",
        })
    }
}

/// Discrete engine event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineEvent {
    /// A callback took longer than its block period.
    Underrun {
        /// Index of the late callback.
        block_index: u64,
    },
    /// The lifecycle state changed.
    StateChanged {
        /// Previous state.
        from: EngineState,
        /// New state.
        to: EngineState,
    },
    /// The driver reported a device fault.
    DeviceFault {
        /// What went wrong.
        reason: FaultReason,
    },
    /// A node produced NaN or infinite samples; they were zeroed and the
    /// node's DSP memory cleared.
    SignalSanitized {
        /// Index of the affected callback.
        block_index: u64,
        /// Node that produced the bad samples.
        node_id: NodeId,
    },
}

/// Drain every pending event and forward it to `tracing`.
///
/// Returns the number of events drained. Call periodically from a control
/// thread; never from the audio callback.
pub fn log_events(events: &Receiver<EngineEvent>) -> usize {
    let mut count = 0;
    for event in events.try_iter() {
        count += 1;
        match event {
            EngineEvent::Underrun { block_index } => {
                tracing::warn!(block_index, "audio underrun");
            }
            EngineEvent::StateChanged { from, to } => {
                tracing::info!(from = %from, to = %to, "engine state changed");
            }
            EngineEvent::DeviceFault { reason } => {
                tracing::error!(reason = %reason, "device fault");
            }
            EngineEvent::SignalSanitized {
                block_index,
                node_id,
            } => {
                tracing::warn!(block_index, node = %node_id, "non-finite output replaced");
            }
        }
    }
    count
}
