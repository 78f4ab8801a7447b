//! Serial byte source for padspy.
//!
//! This is the lowest layer of padspy. It opens the serial link the
//! controller receiver is attached to and hands back a [`SerialLink`], a
//! plain `Read + Write` stream. Everything else builds on `std::io::Read`,
//! so files, pipes and in-memory cursors work as byte sources too.

pub mod error;
pub mod link;
pub mod ports;
pub mod serial;

pub use error::{Result, TransportError};
pub use link::SerialLink;
pub use ports::{available_ports, ensure_port_exists, find_port, PortInfo, PortKind};
pub use serial::{open, SerialSettings, DEFAULT_BAUD, DEFAULT_READ_TIMEOUT};
