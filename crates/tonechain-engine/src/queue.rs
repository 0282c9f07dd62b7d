//! Bounded update queue.
//!
//! Many producers, one consumer. Producers never block: a push into a full
//! queue fails immediately and hands the message back. The consumer (the
//! audio context) drains at most a fixed number of messages per callback.

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError, bounded};

use crate::message::UpdateMessage;

/// Result of a push attempt.
#[derive(Debug)]
pub enum PushError {
    /// The queue is at capacity. Retry later or drop the update.
    Full(UpdateMessage),
    /// The consuming engine has been dropped.
    Disconnected(UpdateMessage),
}

/// Producer half. Cheap to clone.
#[derive(Debug, Clone)]
pub struct UpdateSender {
    tx: Sender<UpdateMessage>,
}

impl UpdateSender {
    /// Push without blocking.
    #[inline]
    pub fn try_push(&self, message: UpdateMessage) -> Result<(), PushError> {
        self.tx.try_send(message).map_err(|e| match e {
            TrySendError::Full(m) => PushError::Full(m),
            TrySendError::Disconnected(m) => PushError::Disconnected(m),
        })
    }

    /// Messages currently waiting.
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    /// Returns `true` if nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    /// Queue capacity.
    pub fn capacity(&self) -> usize {
        self.tx.capacity().unwrap_or(0)
    }
}

/// Consumer half, owned by the engine.
#[derive(Debug)]
pub struct UpdateReceiver {
    rx: Receiver<UpdateMessage>,
}

impl UpdateReceiver {
    /// Pop the oldest message, if any. Never blocks.
    #[inline]
    pub fn pop(&self) -> Option<UpdateMessage> {
        match self.rx.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Messages currently waiting.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Returns `true` if nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Create a queue holding at most `capacity` messages.
pub fn update_queue(capacity: usize) -> (UpdateSender, UpdateReceiver) {
    let (tx, rx) = bounded(capacity);
    (UpdateSender { tx }, UpdateReceiver { rx })
}
