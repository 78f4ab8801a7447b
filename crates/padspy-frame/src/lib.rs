//! Newline framing and button-state decoding for NES controller streams.
//!
//! This is the core of padspy. A receiver streams controller snapshots over
//! a serial link in one of two wire formats:
//! - byte-array: 8 bytes, one per button (0 = released), then `\n`
//! - hex-text: one ASCII hex value per line, optionally `0x`-prefixed
//!
//! [`FrameReader`] turns any `Read` stream into validated [`ButtonState`]s.
//! Malformed frames are dropped and the reader resynchronizes on the next
//! newline; only end-of-stream and I/O failures surface as errors.

pub mod button;
pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use button::{transitions, Button, ButtonState, Transition};
pub use codec::{
    decode, decode_byte_array, decode_hex, encode_frame, DecodeResult, FrameConfig, WireFormat,
    BYTE_ARRAY_LEN, DEFAULT_MAX_FRAME_LEN, DELIMITER,
};
pub use error::{FrameError, ParseError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
