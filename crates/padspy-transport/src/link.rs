use std::io::{Read, Write};

use serialport::SerialPort;

/// An open serial link. Implements `Read` and `Write`.
///
/// Reads honour the link's read timeout: when no byte arrives in time the
/// read fails with `ErrorKind::TimedOut`, which frame readers treat as
/// "no data yet" rather than as a broken stream.
pub struct SerialLink {
    inner: Box<dyn SerialPort>,
    port: String,
}

impl SerialLink {
    pub(crate) fn from_port(inner: Box<dyn SerialPort>, port: impl Into<String>) -> Self {
        Self {
            inner,
            port: port.into(),
        }
    }

    /// Name of the port this link was opened on.
    pub fn port(&self) -> &str {
        &self.port
    }
}

impl Read for SerialLink {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for SerialLink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl std::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLink")
            .field("port", &self.port)
            .field("read_timeout", &self.inner.timeout())
            .finish()
    }
}
