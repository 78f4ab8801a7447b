use std::fmt;
use std::io;

use padspy_frame::{FrameError, ParseError};
use padspy_pump::PumpError;
use padspy_transport::TransportError;

// Exit codes follow sysexits-style conventions.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound => TRANSPORT_ERROR,
        io::ErrorKind::BrokenPipe => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Io(source) => io_error(context, source),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn pump_error(context: &str, err: PumpError) -> CliError {
    match err {
        PumpError::Spawn(source) => io_error(context, source),
        PumpError::UnknownDrainPolicy(_) => CliError::new(USAGE, format!("{context}: {err}")),
        PumpError::ReceiverGone => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}

pub fn parse_error(context: &str, err: ParseError) -> CliError {
    CliError::new(USAGE, format!("{context}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_port_maps_to_transport_error() {
        let err = transport_error(
            "port check failed",
            TransportError::PortNotFound("/dev/ttyUSB9".to_string()),
        );
        assert_eq!(err.code, TRANSPORT_ERROR);
        assert!(err.message.contains("/dev/ttyUSB9"));
    }

    #[test]
    fn io_permission_denied_maps_to_permission_code() {
        let err = io_error("open", io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(err.code, PERMISSION_DENIED);
    }

    #[test]
    fn closed_stdout_is_plain_failure() {
        let err = io_error("output write failed", io::Error::from(io::ErrorKind::BrokenPipe));
        assert_eq!(err.code, FAILURE);
    }

    #[test]
    fn stream_close_is_plain_failure() {
        let err = frame_error("serial read failed", FrameError::ConnectionClosed);
        assert_eq!(err.code, FAILURE);
    }

    #[test]
    fn parse_errors_are_usage_errors() {
        let err = parse_error("invalid buttons", ParseError::Button("X".to_string()));
        assert_eq!(err.code, USAGE);
    }
}
