use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::link::SerialLink;

/// Baud rate used when none is configured (matches the receiver firmware).
pub const DEFAULT_BAUD: u32 = 115_200;

/// Read timeout used when none is configured.
///
/// Bounds how long a reader thread can go without checking its stop signal.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Everything needed to open the controller link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    /// Port identifier (`/dev/ttyUSB0`, `COM6`, ...).
    pub port: String,
    /// Line speed in baud.
    pub baud: u32,
    /// Maximum time a single read blocks before reporting a timeout.
    pub read_timeout: Duration,
}

impl SerialSettings {
    /// Settings for `port` with default baud and read timeout.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud: DEFAULT_BAUD,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Override the baud rate.
    pub fn with_baud(mut self, baud: u32) -> Self {
        self.baud = baud;
        self
    }

    /// Override the read timeout.
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }
}

/// Open a serial link with the given settings (8N1, no flow control).
pub fn open(settings: &SerialSettings) -> Result<SerialLink> {
    debug!(port = %settings.port, baud = settings.baud, "opening serial port");
    let port = serialport::new(settings.port.as_str(), settings.baud)
        .timeout(settings.read_timeout)
        .open()
        .map_err(|source| TransportError::Open {
            port: settings.port.clone(),
            source,
        })?;

    info!(port = %settings.port, baud = settings.baud, "serial port open");
    Ok(SerialLink::from_port(port, settings.port.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_firmware_defaults() {
        let settings = SerialSettings::new("/dev/ttyUSB0");
        assert_eq!(settings.port, "/dev/ttyUSB0");
        assert_eq!(settings.baud, 115_200);
        assert_eq!(settings.read_timeout, DEFAULT_READ_TIMEOUT);
    }

    #[test]
    fn builder_overrides() {
        let settings = SerialSettings::new("COM6")
            .with_baud(9600)
            .with_read_timeout(Duration::from_secs(1));
        assert_eq!(settings.baud, 9600);
        assert_eq!(settings.read_timeout, Duration::from_secs(1));
    }

    #[test]
    fn open_missing_port_reports_port_name() {
        let settings = SerialSettings::new("/dev/padspy-no-such-port");
        let err = open(&settings).unwrap_err();
        match err {
            TransportError::Open { port, .. } => assert_eq!(port, "/dev/padspy-no-such-port"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
