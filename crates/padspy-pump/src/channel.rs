use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender, TryRecvError, TrySendError};
use std::sync::Arc;

use padspy_frame::ButtonState;
use tracing::warn;

use crate::error::{PumpError, Result};

/// Queue sizing for the state channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChannelCapacity {
    /// Never drops, never blocks the producer.
    #[default]
    Unbounded,
    /// Holds at most `n` states (minimum 1). When full, new states are
    /// dropped rather than blocking the producer.
    Bounded(usize),
}

enum Tx {
    Unbounded(Sender<ButtonState>),
    Bounded(SyncSender<ButtonState>),
}

/// Producer half, owned by the reader thread.
pub struct StateSender {
    tx: Tx,
    dropped: Arc<AtomicU64>,
}

/// Consumer half, owned by the render pump.
pub struct StateReceiver {
    rx: Receiver<ButtonState>,
    dropped: Arc<AtomicU64>,
}

/// Result of a non-blocking receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryRecv {
    State(ButtonState),
    /// Nothing queued right now.
    Empty,
    /// Nothing queued and the producer is gone.
    Closed,
}

/// Create a single-producer/single-consumer state channel.
pub fn state_channel(capacity: ChannelCapacity) -> (StateSender, StateReceiver) {
    let dropped = Arc::new(AtomicU64::new(0));
    let (tx, rx) = match capacity {
        ChannelCapacity::Unbounded => {
            let (tx, rx) = mpsc::channel();
            (Tx::Unbounded(tx), rx)
        }
        ChannelCapacity::Bounded(n) => {
            let (tx, rx) = mpsc::sync_channel(n.max(1));
            (Tx::Bounded(tx), rx)
        }
    };

    (
        StateSender {
            tx,
            dropped: Arc::clone(&dropped),
        },
        StateReceiver { rx, dropped },
    )
}

impl StateSender {
    /// Enqueue a state without blocking.
    ///
    /// Fails only when the receiver has been dropped.
    pub fn send(&self, state: ButtonState) -> Result<()> {
        match &self.tx {
            Tx::Unbounded(tx) => tx.send(state).map_err(|_| PumpError::ReceiverGone),
            Tx::Bounded(tx) => match tx.try_send(state) {
                Ok(()) => Ok(()),
                Err(TrySendError::Full(_)) => {
                    if self.dropped.fetch_add(1, Ordering::Relaxed) == 0 {
                        warn!("state queue full, dropping states until the consumer catches up");
                    }
                    Ok(())
                }
                Err(TrySendError::Disconnected(_)) => Err(PumpError::ReceiverGone),
            },
        }
    }

    /// States dropped because a bounded queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl StateReceiver {
    /// Dequeue the oldest state without blocking.
    pub fn try_recv(&self) -> TryRecv {
        match self.rx.try_recv() {
            Ok(state) => TryRecv::State(state),
            Err(TryRecvError::Empty) => TryRecv::Empty,
            Err(TryRecvError::Disconnected) => TryRecv::Closed,
        }
    }

    /// States the producer dropped because a bounded queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for StateSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.tx {
            Tx::Unbounded(_) => "unbounded",
            Tx::Bounded(_) => "bounded",
        };
        f.debug_struct("StateSender")
            .field("kind", &kind)
            .field("dropped", &self.dropped())
            .finish()
    }
}

impl std::fmt::Debug for StateReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateReceiver")
            .field("dropped", &self.dropped())
            .finish()
    }
}
