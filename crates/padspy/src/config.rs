//! Persisted session settings.
//!
//! Settings live in a small JSON file. Loading is lenient: a missing file,
//! unreadable file or bad field falls back to defaults so a stale config
//! never prevents a session from starting.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use padspy_frame::{FrameConfig, WireFormat};
use padspy_pump::{DrainPolicy, PumpConfig};
use padspy_transport::{SerialSettings, DEFAULT_BAUD, DEFAULT_READ_TIMEOUT};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Default settings file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "padspy.json";

/// Default pump interval in milliseconds.
pub const DEFAULT_INTERVAL_MS: u64 = 5;

/// Port used when nothing is configured.
pub fn default_port() -> &'static str {
    if cfg!(windows) {
        "COM6"
    } else {
        "/dev/ttyUSB0"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub port: String,
    pub baud: u32,
    pub format: WireFormat,
    pub interval_ms: u64,
    pub drain: DrainPolicy,
    pub read_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: default_port().to_string(),
            baud: DEFAULT_BAUD,
            format: WireFormat::default(),
            interval_ms: DEFAULT_INTERVAL_MS,
            drain: DrainPolicy::default(),
            read_timeout_ms: DEFAULT_READ_TIMEOUT.as_millis() as u64,
        }
    }
}

#[derive(Serialize)]
struct SettingsFile<'a> {
    port: &'a str,
    baud: u32,
    format: &'a str,
    interval_ms: u64,
    drain: &'a str,
    read_timeout_ms: u64,
}

impl Settings {
    /// Load settings from `path`, falling back to defaults field by field.
    pub fn load(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no settings file, using defaults");
                return Self::default();
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "settings file unreadable, using defaults");
                return Self::default();
            }
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(value) => Self::from_json(&value),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "settings file is not valid JSON, using defaults");
                Self::default()
            }
        }
    }

    /// Build settings from a parsed JSON document.
    ///
    /// Unknown keys are ignored. A field with the wrong type or an
    /// unparsable value keeps its default.
    pub fn from_json(value: &Value) -> Self {
        let mut settings = Self::default();

        if let Some(port) = value.get("port").and_then(Value::as_str) {
            let port = port.trim();
            if !port.is_empty() {
                settings.port = port.to_string();
            }
        }

        if let Some(raw) = value.get("baud") {
            match number_field(raw).and_then(|n| u32::try_from(n).ok()) {
                Some(baud) if baud > 0 => settings.baud = baud,
                _ => warn!(baud = %raw, "invalid baud in settings, using {DEFAULT_BAUD}"),
            }
        }

        if let Some(raw) = value.get("format").and_then(Value::as_str) {
            match raw.parse::<WireFormat>() {
                Ok(format) => settings.format = format,
                Err(err) => warn!(error = %err, "invalid format in settings"),
            }
        }

        if let Some(raw) = value.get("interval_ms") {
            match number_field(raw) {
                Some(ms) if ms > 0 => settings.interval_ms = ms,
                _ => warn!(interval_ms = %raw, "invalid interval_ms in settings"),
            }
        }

        if let Some(raw) = value.get("drain").and_then(Value::as_str) {
            match raw.parse::<DrainPolicy>() {
                Ok(drain) => settings.drain = drain,
                Err(err) => warn!(error = %err, "invalid drain in settings"),
            }
        }

        if let Some(raw) = value.get("read_timeout_ms") {
            match number_field(raw) {
                Some(ms) if ms > 0 => settings.read_timeout_ms = ms,
                _ => warn!(read_timeout_ms = %raw, "invalid read_timeout_ms in settings"),
            }
        }

        settings
    }

    /// Write settings to `path` as pretty JSON.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let text = serde_json::to_string_pretty(&self.to_file()).map_err(io::Error::other)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, format!("{text}\n"))?;
        debug!(path = %path.display(), "settings saved");
        Ok(())
    }

    /// JSON form, as written by [`Settings::save`].
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self.to_file()).unwrap_or(Value::Null)
    }

    fn to_file(&self) -> SettingsFile<'_> {
        SettingsFile {
            port: &self.port,
            baud: self.baud,
            format: self.format.as_str(),
            interval_ms: self.interval_ms,
            drain: self.drain.as_str(),
            read_timeout_ms: self.read_timeout_ms,
        }
    }

    pub fn serial_settings(&self) -> SerialSettings {
        SerialSettings::new(&self.port)
            .with_baud(self.baud)
            .with_read_timeout(Duration::from_millis(self.read_timeout_ms))
    }

    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig::new(self.format)
    }

    pub fn pump_config(&self) -> PumpConfig {
        PumpConfig {
            interval: Duration::from_millis(self.interval_ms),
            drain: self.drain,
        }
    }
}

/// Accept both `115200` and `"115200"`.
fn number_field(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("padspy-{name}-{}-{nanos}.json", std::process::id()))
    }

    #[test]
    fn defaults_match_receiver_firmware() {
        let settings = Settings::default();
        assert_eq!(settings.baud, 115_200);
        assert_eq!(settings.format, WireFormat::ByteArray);
        assert_eq!(settings.interval_ms, 5);
        assert_eq!(settings.drain, DrainPolicy::All);
        assert_eq!(settings.port, default_port());
    }

    #[test]
    fn reads_every_field() {
        let settings = Settings::from_json(&json!({
            "port": "/dev/ttyACM0",
            "baud": 9600,
            "format": "hex",
            "interval_ms": 16,
            "drain": "one",
            "read_timeout_ms": 250
        }));

        assert_eq!(settings.port, "/dev/ttyACM0");
        assert_eq!(settings.baud, 9600);
        assert_eq!(settings.format, WireFormat::HexText);
        assert_eq!(settings.interval_ms, 16);
        assert_eq!(settings.drain, DrainPolicy::One);
        assert_eq!(settings.read_timeout_ms, 250);
    }

    #[test]
    fn unparsable_baud_falls_back_to_default() {
        assert_eq!(Settings::from_json(&json!({ "baud": "fast" })).baud, DEFAULT_BAUD);
        assert_eq!(Settings::from_json(&json!({ "baud": -1 })).baud, DEFAULT_BAUD);
        assert_eq!(Settings::from_json(&json!({ "baud": "57600" })).baud, 57_600);
    }

    #[test]
    fn bad_fields_keep_defaults_and_good_fields_survive() {
        let settings = Settings::from_json(&json!({
            "port": "COM3",
            "format": "morse",
            "drain": "latest",
            "interval_ms": 0
        }));
        assert_eq!(settings.port, "COM3");
        assert_eq!(settings.format, WireFormat::ByteArray);
        assert_eq!(settings.drain, DrainPolicy::All);
        assert_eq!(settings.interval_ms, DEFAULT_INTERVAL_MS);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = temp_path("missing");
        assert_eq!(Settings::load(&path), Settings::default());
    }

    #[test]
    fn invalid_json_gives_defaults() {
        let path = temp_path("invalid");
        fs::write(&path, "[serial]\nport = COM6\n").unwrap();
        assert_eq!(Settings::load(&path), Settings::default());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let path = temp_path("saved");
        let settings = Settings {
            port: "/dev/ttyUSB1".to_string(),
            baud: 57_600,
            format: WireFormat::HexText,
            interval_ms: 10,
            drain: DrainPolicy::One,
            read_timeout_ms: 50,
        };

        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path), settings);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn derived_library_configs() {
        let settings = Settings::from_json(&json!({ "format": "hex", "interval_ms": 20, "drain": "one" }));
        assert_eq!(settings.frame_config().format, WireFormat::HexText);
        assert_eq!(settings.pump_config().interval, Duration::from_millis(20));
        assert_eq!(settings.pump_config().drain, DrainPolicy::One);
        assert_eq!(settings.serial_settings().baud, DEFAULT_BAUD);
    }
}
