//! Live NES controller state from a serial receiver.
//!
//! padspy reads the byte stream a controller receiver writes to a serial
//! port, decodes it into 8-bit button states and hands them to a consumer
//! running on its own thread.
//!
//! # Crate Structure
//!
//! - [`transport`] — Serial port settings, open and enumeration
//! - [`frame`] — Button model, wire-format decoders, newline reassembly
//! - [`pump`] — Reader thread, state channel and render pump
//! - [`config`] — Persisted session settings

pub mod config;

/// Re-export transport types.
pub mod transport {
    pub use padspy_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use padspy_frame::*;
}

/// Re-export pump types.
pub mod pump {
    pub use padspy_pump::*;
}
