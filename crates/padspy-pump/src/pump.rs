use std::fmt;
use std::str::FromStr;
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::channel::{StateReceiver, TryRecv};
use crate::consumer::StateConsumer;
use crate::control::StopToken;
use crate::error::PumpError;

/// Default tick period.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(5);

/// How many queued states one tick applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DrainPolicy {
    /// Every queued state, in arrival order.
    #[default]
    All,
    /// At most one state per tick.
    One,
}

impl DrainPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            DrainPolicy::All => "all",
            DrainPolicy::One => "one",
        }
    }
}

impl fmt::Display for DrainPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DrainPolicy {
    type Err = PumpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(DrainPolicy::All),
            "one" => Ok(DrainPolicy::One),
            other => Err(PumpError::UnknownDrainPolicy(other.to_string())),
        }
    }
}

/// Render pump configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpConfig {
    /// Time between ticks when driven by [`RenderPump::run`]. Default: 5 ms.
    pub interval: Duration,
    pub drain: DrainPolicy,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            drain: DrainPolicy::default(),
        }
    }
}

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tick {
    /// States applied to the consumer.
    pub applied: usize,
    /// The producer is gone and the queue is empty.
    pub closed: bool,
}

/// Why [`RenderPump::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpExit {
    /// The reader ended and every queued state was applied.
    SourceClosed,
    /// The stop token fired.
    Stopped,
}

/// Drains the state channel into a consumer on the consumer's own thread.
#[derive(Debug)]
pub struct RenderPump {
    rx: StateReceiver,
    config: PumpConfig,
    applied: u64,
}

impl RenderPump {
    pub fn new(rx: StateReceiver, config: PumpConfig) -> Self {
        Self {
            rx,
            config,
            applied: 0,
        }
    }

    /// Apply queued states per the drain policy. Never blocks; an empty
    /// queue makes this a no-op.
    pub fn tick<C: StateConsumer + ?Sized>(&mut self, consumer: &mut C) -> Tick {
        let mut tick = Tick::default();
        loop {
            if self.config.drain == DrainPolicy::One && tick.applied == 1 {
                break;
            }
            match self.rx.try_recv() {
                TryRecv::State(state) => {
                    consumer.apply(state);
                    tick.applied += 1;
                }
                TryRecv::Empty => break,
                TryRecv::Closed => {
                    tick.closed = true;
                    break;
                }
            }
        }
        self.applied += tick.applied as u64;
        tick
    }

    /// Tick every `interval` until the source closes or `stop` fires.
    ///
    /// For hosts without an event loop of their own; GUI hosts call
    /// [`RenderPump::tick`] from a timer instead.
    pub fn run<C: StateConsumer + ?Sized>(
        &mut self,
        consumer: &mut C,
        stop: &StopToken,
    ) -> PumpExit {
        loop {
            if stop.is_stopped() {
                debug!(applied = self.applied, "render pump stopped");
                return PumpExit::Stopped;
            }
            if self.tick(consumer).closed {
                debug!(applied = self.applied, "state source closed");
                return PumpExit::SourceClosed;
            }
            thread::sleep(self.config.interval);
        }
    }

    /// Total states applied so far.
    pub fn applied(&self) -> u64 {
        self.applied
    }

    /// States the producer dropped because a bounded queue was full.
    pub fn dropped(&self) -> u64 {
        self.rx.dropped()
    }
}
