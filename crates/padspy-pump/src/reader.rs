use std::io::Read;
use std::thread::{self, JoinHandle};

use padspy_frame::{FrameConfig, FrameError, FrameReader};
use tracing::{debug, warn};

use crate::channel::StateSender;
use crate::control::StopToken;
use crate::error::{PumpError, Result};

/// Why a reader loop ended.
#[derive(Debug)]
pub enum ReaderExit {
    /// The byte source reached end of stream.
    StreamClosed,
    /// The stop token fired.
    Stopped,
    /// The state receiver was dropped.
    ConsumerGone,
    /// The byte source failed.
    Failed(FrameError),
    /// The reader thread panicked.
    Panicked,
}

/// Handle to a running reader thread.
#[derive(Debug)]
pub struct ReaderHandle {
    thread: JoinHandle<ReaderExit>,
    stop: StopToken,
}

impl ReaderHandle {
    /// Ask the reader to stop before its next read.
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the reader thread and report why it ended.
    pub fn join(self) -> ReaderExit {
        self.thread.join().unwrap_or(ReaderExit::Panicked)
    }
}

/// Decode states from `reader` into `tx` until the source ends, the stop
/// token fires or the consumer goes away.
///
/// Timeouts from the source are treated as "no data yet"; malformed frames
/// are dropped inside the frame reader.
pub fn run_reader<S: Read>(
    reader: &mut FrameReader<S>,
    tx: &StateSender,
    stop: &StopToken,
) -> ReaderExit {
    loop {
        if stop.is_stopped() {
            return ReaderExit::Stopped;
        }

        match reader.read_state() {
            Ok(Some(state)) => {
                if tx.send(state).is_err() {
                    return ReaderExit::ConsumerGone;
                }
            }
            Ok(None) => continue,
            Err(FrameError::ConnectionClosed) => return ReaderExit::StreamClosed,
            Err(err) => return ReaderExit::Failed(err),
        }
    }
}

/// Spawn the reader thread over a blocking byte source.
///
/// The thread owns `tx`; when it ends, the receiver observes the channel as
/// closed once the remaining states are drained.
pub fn spawn_reader<S>(
    source: S,
    config: FrameConfig,
    tx: StateSender,
    stop: StopToken,
) -> Result<ReaderHandle>
where
    S: Read + Send + 'static,
{
    let thread_stop = stop.clone();
    let thread = thread::Builder::new()
        .name("padspy-reader".to_string())
        .spawn(move || {
            let format = config.format;
            let mut reader = FrameReader::with_config(source, config);
            debug!(%format, "reader started");

            let exit = run_reader(&mut reader, &tx, &thread_stop);

            match &exit {
                ReaderExit::Failed(err) => warn!(error = %err, "reader failed"),
                other => debug!(exit = ?other, "reader finished"),
            }
            debug!(
                discarded = reader.discarded_frames(),
                dropped = tx.dropped(),
                "reader statistics"
            );
            exit
        })
        .map_err(PumpError::Spawn)?;

    Ok(ReaderHandle { thread, stop })
}
