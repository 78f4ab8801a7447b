/// Errors that can occur while reading or writing frames.
///
/// Malformed frames are not errors: they are discarded inside the reader.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The byte source reached end of stream.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;

/// Errors from parsing user-supplied names (wire formats, buttons).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown wire format '{0}' (expected 'bytes' or 'hex')")]
    WireFormat(String),

    #[error("unknown button '{0}' (expected A, B, SELECT, START, UP, DOWN, LEFT or RIGHT)")]
    Button(String),
}
