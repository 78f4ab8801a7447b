use std::fmt;
use std::str::FromStr;

use bytes::{BufMut, BytesMut};
use tracing::debug;

use crate::button::{Button, ButtonState};
use crate::error::ParseError;

/// Frame delimiter for both wire formats.
pub const DELIMITER: u8 = b'\n';

/// Minimum byte-array frame length: one byte per button.
pub const BYTE_ARRAY_LEN: usize = 8;

/// Default cap on bytes accumulated without seeing a delimiter.
pub const DEFAULT_MAX_FRAME_LEN: usize = 1024;

/// Outcome of decoding one frame: a state, or `None` to discard it.
pub type DecodeResult = Option<ButtonState>;

/// How button states are encoded on the wire. Fixed for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum WireFormat {
    /// `b0 b1 .. b7 \n`, one byte per button, non-zero = pressed.
    #[default]
    ByteArray,
    /// One hex value per text line, e.g. `0x3F` or `3F`.
    HexText,
}

impl WireFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            WireFormat::ByteArray => "bytes",
            WireFormat::HexText => "hex",
        }
    }
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WireFormat {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bytes" | "byte-array" | "bytearray" => Ok(WireFormat::ByteArray),
            "hex" | "hex-text" | "hextext" => Ok(WireFormat::HexText),
            other => Err(ParseError::WireFormat(other.to_string())),
        }
    }
}

/// Decode a byte-array frame (delimiter already stripped).
///
/// Frames shorter than [`BYTE_ARRAY_LEN`] are discarded. Bytes past index 7
/// are ignored.
pub fn decode_byte_array(frame: &[u8]) -> DecodeResult {
    let buttons = frame.get(..BYTE_ARRAY_LEN)?;
    let bits = buttons
        .iter()
        .enumerate()
        .filter(|(_, byte)| **byte != 0)
        .fold(0u8, |bits, (i, _)| bits | (1 << i));
    Some(ButtonState::from_bits(bits))
}

/// Decode a hex-text token.
///
/// If the token contains `0x`, the number starts there; otherwise the whole
/// trimmed token must be hex digits. Values above `0xFF` keep their low
/// byte.
pub fn decode_hex(token: &str) -> DecodeResult {
    let token = token.trim();
    let number = match token.find("0x") {
        Some(start) => &token[start..],
        None => token,
    };
    let digits = number
        .strip_prefix("0x")
        .or_else(|| number.strip_prefix("0X"))
        .unwrap_or(number);
    if digits.is_empty() {
        return None;
    }

    let mut low = 0u8;
    let mut overflow = false;
    for c in digits.chars() {
        let digit = c.to_digit(16)? as u8;
        overflow |= low >> 4 != 0;
        low = (low << 4) | digit;
    }

    if overflow {
        debug!(token, low_byte = low, "hex value exceeds 8 bits, keeping low byte");
    }
    Some(ButtonState::from_bits(low))
}

/// Printable token of a hex-text line: non-ASCII bytes dropped, whitespace
/// trimmed.
pub fn hex_token(line: &[u8]) -> String {
    let text: String = line
        .iter()
        .filter(|byte| byte.is_ascii())
        .map(|&byte| byte as char)
        .collect();
    text.trim().to_string()
}

/// Decode one frame (delimiter stripped) in the given format.
pub fn decode(format: WireFormat, frame: &[u8]) -> DecodeResult {
    match format {
        WireFormat::ByteArray => decode_byte_array(frame),
        WireFormat::HexText => decode_hex(&hex_token(frame)),
    }
}

/// Encode a state as one complete frame, delimiter included.
///
/// Byte-array frames use `0x01` for pressed buttons, like the receiver
/// firmware does.
pub fn encode_frame(format: WireFormat, state: ButtonState, dst: &mut BytesMut) {
    match format {
        WireFormat::ByteArray => {
            dst.reserve(BYTE_ARRAY_LEN + 1);
            for button in Button::ALL {
                dst.put_u8(u8::from(state.is_pressed(button)));
            }
        }
        WireFormat::HexText => {
            dst.put_slice(format!("0x{:02X}", state.bits()).as_bytes());
        }
    }
    dst.put_u8(DELIMITER);
}

/// Configuration for frame readers and writers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameConfig {
    /// Wire format of the stream.
    pub format: WireFormat,
    /// Bytes a partial frame may accumulate before it is dropped.
    /// Default: 1024.
    pub max_frame_len: usize,
}

impl FrameConfig {
    pub fn new(format: WireFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            format: WireFormat::default(),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_array_a_only() {
        let state = decode_byte_array(&[1, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(state.bits(), 0x01);
    }

    #[test]
    fn byte_array_up_only() {
        let state = decode_byte_array(&[0, 0, 0, 0, 1, 0, 0, 0]).unwrap();
        assert_eq!(state.bits(), 0x10);
    }

    #[test]
    fn byte_array_any_nonzero_byte_is_pressed() {
        let state = decode_byte_array(&[0xFF, 0, 0x80, 0, 0, 0, 0, 0x02]).unwrap();
        assert_eq!(state.bits(), 0b1000_0101);
    }

    #[test]
    fn byte_array_bit_matches_byte_for_every_position() {
        for i in 0..BYTE_ARRAY_LEN {
            let mut frame = [0u8; BYTE_ARRAY_LEN];
            frame[i] = 1;
            assert_eq!(decode_byte_array(&frame).unwrap().bits(), 1 << i);
        }
    }

    #[test]
    fn byte_array_ignores_trailing_bytes() {
        let short = [1, 1, 0, 0, 0, 0, 0, 1];
        let mut padded = short.to_vec();
        padded.extend_from_slice(&[1, 1, 1, 0xAA]);
        assert_eq!(decode_byte_array(&short), decode_byte_array(&padded));
    }

    #[test]
    fn byte_array_short_frames_are_discarded() {
        for len in 0..BYTE_ARRAY_LEN {
            assert_eq!(decode_byte_array(&vec![1; len]), None, "len {len}");
        }
    }

    #[test]
    fn hex_with_and_without_prefix() {
        assert_eq!(decode_hex("0x3F").unwrap().bits(), 0x3F);
        assert_eq!(decode_hex("3F").unwrap().bits(), 0x3F);
        assert_eq!(decode_hex("ff").unwrap().bits(), 0xFF);
        assert_eq!(decode_hex("0X0a").unwrap().bits(), 0x0A);
        assert_eq!(decode_hex("  0x00 \r").unwrap().bits(), 0x00);
    }

    #[test]
    fn hex_every_byte_value() {
        for v in 0..=255u8 {
            assert_eq!(decode_hex(&format!("{v:x}")).unwrap().bits(), v);
            assert_eq!(decode_hex(&format!("0x{v:02X}")).unwrap().bits(), v);
        }
    }

    #[test]
    fn hex_number_starts_at_prefix() {
        assert_eq!(decode_hex("state=0x11").unwrap().bits(), 0x11);
        assert_eq!(decode_hex("10x5").unwrap().bits(), 0x05);
    }

    #[test]
    fn hex_rejects_non_hex() {
        assert_eq!(decode_hex("zz"), None);
        assert_eq!(decode_hex(""), None);
        assert_eq!(decode_hex("   "), None);
        assert_eq!(decode_hex("0x"), None);
        assert_eq!(decode_hex("0x3G"), None);
        assert_eq!(decode_hex("state=3F"), None);
        assert_eq!(decode_hex("-1"), None);
        assert_eq!(decode_hex("+3F"), None);
        assert_eq!(decode_hex("3_F"), None);
        assert_eq!(decode_hex("0x_3F"), None);
    }

    #[test]
    fn hex_out_of_range_keeps_low_byte() {
        assert_eq!(decode_hex("0x1FF").unwrap().bits(), 0xFF);
        assert_eq!(decode_hex("100").unwrap().bits(), 0x00);
        assert_eq!(
            decode_hex("123456789abcdef0123456789abcdef42").unwrap().bits(),
            0x42
        );
    }

    #[test]
    fn hex_token_drops_non_ascii() {
        assert_eq!(hex_token(b" 3\xffF\r"), "3F");
        assert_eq!(decode(WireFormat::HexText, b"3\xc3\xa9F").unwrap().bits(), 0x3F);
    }

    #[test]
    fn decode_dispatches_on_format() {
        assert_eq!(
            decode(WireFormat::ByteArray, &[0, 0, 0, 0, 0, 0, 0, 1]).unwrap().bits(),
            0x80
        );
        assert_eq!(decode(WireFormat::HexText, b"0x80").unwrap().bits(), 0x80);
        assert_eq!(decode(WireFormat::HexText, b"80\x00"), None);
    }

    #[test]
    fn encode_byte_array_matches_firmware() {
        let mut buf = BytesMut::new();
        encode_frame(WireFormat::ByteArray, ButtonState::from_bits(0x11), &mut buf);
        assert_eq!(buf.as_ref(), &[1, 0, 0, 0, 1, 0, 0, 0, b'\n']);
    }

    #[test]
    fn encode_hex_text() {
        let mut buf = BytesMut::new();
        encode_frame(WireFormat::HexText, ButtonState::from_bits(0x3F), &mut buf);
        assert_eq!(buf.as_ref(), b"0x3F\n");
    }

    #[test]
    fn wire_format_names() {
        assert_eq!("bytes".parse::<WireFormat>().unwrap(), WireFormat::ByteArray);
        assert_eq!("Hex-Text".parse::<WireFormat>().unwrap(), WireFormat::HexText);
        assert!(matches!(
            "morse".parse::<WireFormat>(),
            Err(ParseError::WireFormat(_))
        ));
        assert_eq!(WireFormat::HexText.to_string(), "hex");
    }

    #[test]
    fn default_config() {
        let cfg = FrameConfig::default();
        assert_eq!(cfg.format, WireFormat::ByteArray);
        assert_eq!(cfg.max_frame_len, DEFAULT_MAX_FRAME_LEN);
        assert_eq!(FrameConfig::new(WireFormat::HexText).format, WireFormat::HexText);
    }
}
