//! Reader thread, state hand-off queue and render pump.
//!
//! A dedicated thread runs a [`padspy_frame::FrameReader`] over a blocking
//! byte source and pushes each decoded state into a [`StateSender`]. The
//! consumer side owns a [`RenderPump`] that drains the queue on a fixed
//! period without ever blocking, applying states to a [`StateConsumer`].
//! The queue and a [`StopToken`] are the only things the two sides share.

pub mod channel;
pub mod consumer;
pub mod control;
pub mod error;
pub mod pump;
pub mod reader;

pub use channel::{state_channel, ChannelCapacity, StateReceiver, StateSender, TryRecv};
pub use consumer::{LatestState, StateConsumer, TransitionLog};
pub use control::StopToken;
pub use error::{PumpError, Result};
pub use pump::{DrainPolicy, PumpConfig, PumpExit, RenderPump, Tick, DEFAULT_INTERVAL};
pub use reader::{run_reader, spawn_reader, ReaderExit, ReaderHandle};
