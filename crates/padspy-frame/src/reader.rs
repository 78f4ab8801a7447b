use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use tracing::trace;

use crate::button::ButtonState;
use crate::codec::{decode, hex_token, FrameConfig, WireFormat, DELIMITER};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 256;
const READ_CHUNK_SIZE: usize = 256;

/// Reassembles newline-delimited frames from any `Read` stream and decodes
/// them into button states.
///
/// Handles partial reads internally: callers only ever see states decoded
/// from complete frames. A frame is removed from the buffer at its delimiter
/// whatever the decode outcome, so one bad frame never shifts the framing of
/// the next.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
    /// Set after an oversize partial frame was dropped; cleared at the next
    /// delimiter.
    skipping: bool,
    discarded: u64,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration (byte-array).
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            skipping: false,
            discarded: 0,
        }
    }

    /// Read until the next decodable frame (blocking).
    ///
    /// Returns `Ok(None)` when the source timed out before a complete valid
    /// frame arrived, `Err(FrameError::ConnectionClosed)` at end of stream.
    /// A partial frame pending at end of stream is dropped.
    pub fn read_state(&mut self) -> Result<Option<ButtonState>> {
        loop {
            if let Some(state) = self.next_buffered() {
                return Ok(Some(state));
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if is_timeout(&err) => return Ok(None),
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                if !self.buf.is_empty() {
                    trace!(len = self.buf.len(), "dropping partial frame at end of stream");
                    self.buf.clear();
                }
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Decode complete frames already in the buffer until one yields a state.
    fn next_buffered(&mut self) -> Option<ButtonState> {
        while let Some(end) = self.buf.iter().position(|&b| b == DELIMITER) {
            let frame = self.buf.split_to(end + 1);
            if std::mem::take(&mut self.skipping) {
                continue;
            }
            if let Some(state) = self.decode_frame(&frame[..end]) {
                return Some(state);
            }
        }

        if self.buf.len() > self.config.max_frame_len {
            trace!(
                len = self.buf.len(),
                max = self.config.max_frame_len,
                "partial frame too long, skipping to next delimiter"
            );
            self.buf.clear();
            if !self.skipping {
                self.skipping = true;
                self.discarded += 1;
            }
        }
        None
    }

    fn decode_frame(&mut self, frame: &[u8]) -> Option<ButtonState> {
        if self.config.format == WireFormat::HexText && hex_token(frame).is_empty() {
            return None;
        }

        let state = decode(self.config.format, frame);

        if state.is_none() {
            self.discarded += 1;
            trace!(len = frame.len(), format = %self.config.format, "discarding malformed frame");
        }
        state
    }

    /// Number of frames dropped so far (too short, unparsable or oversize).
    pub fn discarded_frames(&self) -> u64 {
        self.discarded
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl<T: Read> Iterator for FrameReader<T> {
    type Item = Result<ButtonState>;

    /// Yields states until end of stream; timeouts are skipped.
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.read_state() {
                Ok(Some(state)) => return Some(Ok(state)),
                Ok(None) => continue,
                Err(FrameError::ConnectionClosed) => return None,
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

fn is_timeout(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock)
}
