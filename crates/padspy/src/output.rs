use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use padspy::config::Settings;
use padspy_frame::{Button, ButtonState};
use padspy_pump::{StateConsumer, StopToken};
use padspy_transport::PortInfo;
use serde::Serialize;
use tracing::debug;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct StateOutput {
    state: u8,
    hex: String,
    pressed: Vec<&'static str>,
    timestamp: String,
}

/// Render one state as a block of text (no trailing newline).
pub fn render_state(state: ButtonState, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            let out = StateOutput {
                state: state.bits(),
                hex: hex(state),
                pressed: state.pressed().map(Button::name).collect(),
                timestamp: now_unix_millis(),
            };
            serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Table => {
            let mut header = vec!["STATE"];
            header.extend(Button::ALL.iter().map(|b| b.name()));
            let mut row = vec![hex(state)];
            row.extend(Button::ALL.iter().map(|b| {
                if state.is_pressed(*b) {
                    "X".to_string()
                } else {
                    String::new()
                }
            }));

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(header)
                .add_row(row);
            table.to_string()
        }
        OutputFormat::Pretty => format!("{} {state}", hex(state)),
        OutputFormat::Raw => hex(state),
    }
}

/// Terminal overlay: writes a state only when it differs from the last one
/// written, so re-applying a state is invisible.
///
/// The first write failure is kept and every later state is ignored; the
/// optional stop token fires so the session ends instead of decoding into
/// a closed stdout.
pub struct TerminalRenderer<W> {
    out: W,
    format: OutputFormat,
    changes_only: bool,
    last: Option<ButtonState>,
    error: Option<io::Error>,
    stop: Option<StopToken>,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out,
            format,
            changes_only: true,
            last: None,
            error: None,
            stop: None,
        }
    }

    /// Fire `stop` when a write fails.
    pub fn stop_on_error(mut self, stop: StopToken) -> Self {
        self.stop = Some(stop);
        self
    }

    /// The write failure that ended rendering, if any.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    /// Write every applied state, repeats included.
    pub fn every_state(mut self) -> Self {
        self.changes_only = false;
        self
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> StateConsumer for TerminalRenderer<W> {
    fn apply(&mut self, state: ButtonState) {
        if self.changes_only && self.last == Some(state) {
            return;
        }
        if self.error.is_some() {
            return;
        }
        self.last = Some(state);

        let written = writeln!(self.out, "{}", render_state(state, self.format))
            .and_then(|()| self.out.flush());
        if let Err(err) = written {
            debug!(error = %err, "output closed, stopping");
            self.error = Some(err);
            if let Some(stop) = &self.stop {
                stop.stop();
            }
        }
    }
}

pub fn print_ports(ports: &[PortInfo], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out: Vec<_> = ports
                .iter()
                .map(|p| {
                    serde_json::json!({
                        "name": p.name,
                        "kind": p.kind.as_str(),
                        "description": p.description,
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "KIND", "DESCRIPTION"]);
            for p in ports {
                table.add_row(vec![
                    p.name.clone(),
                    p.kind.as_str().to_string(),
                    p.description.clone().unwrap_or_default(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            if ports.is_empty() {
                println!("no serial ports found");
            }
            for p in ports {
                match &p.description {
                    Some(desc) => println!("{} ({}, {desc})", p.name, p.kind.as_str()),
                    None => println!("{} ({})", p.name, p.kind.as_str()),
                }
            }
        }
        OutputFormat::Raw => {
            for p in ports {
                println!("{}", p.name);
            }
        }
    }
}

pub fn print_settings(settings: &Settings, path: &Path, format: OutputFormat) {
    let value = settings.to_json();
    match format {
        OutputFormat::Json | OutputFormat::Raw => {
            println!(
                "{}",
                serde_json::to_string(&value).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KEY", "VALUE"]);
            table.add_row(vec!["file".to_string(), path.display().to_string()]);
            for (key, val) in settings_pairs(&value) {
                table.add_row(vec![key, val]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("file: {}", path.display());
            for (key, val) in settings_pairs(&value) {
                println!("{key}: {val}");
            }
        }
    }
}

fn settings_pairs(value: &serde_json::Value) -> Vec<(String, String)> {
    value
        .as_object()
        .map(|map| {
            map.iter()
                .map(|(k, v)| {
                    let v = v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
                    (k.clone(), v)
                })
                .collect()
        })
        .unwrap_or_default()
}

fn hex(state: ButtonState) -> String {
    format!("0x{:02X}", state.bits())
}

fn now_unix_millis() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_shows_hex_and_names() {
        let state = ButtonState::from_bits(0x11);
        assert_eq!(render_state(state, OutputFormat::Pretty), "0x11 A+UP");
        assert_eq!(render_state(ButtonState::RELEASED, OutputFormat::Pretty), "0x00 -");
    }

    #[test]
    fn raw_is_the_hex_byte() {
        assert_eq!(render_state(ButtonState::from_bits(0x3F), OutputFormat::Raw), "0x3F");
    }

    #[test]
    fn json_lists_pressed_buttons() {
        let text = render_state(ButtonState::from_bits(0x81), OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["state"], 0x81);
        assert_eq!(value["hex"], "0x81");
        assert_eq!(value["pressed"], serde_json::json!(["A", "RIGHT"]));
    }

    #[test]
    fn table_has_a_column_per_button() {
        let text = render_state(ButtonState::from_bits(0x01), OutputFormat::Table);
        for button in Button::ALL {
            assert!(text.contains(button.name()), "{button}");
        }
    }

    #[test]
    fn renderer_skips_repeated_states() {
        let mut renderer = TerminalRenderer::new(Vec::new(), OutputFormat::Raw);
        for bits in [0x01, 0x01, 0x01, 0x00, 0x00, 0x01] {
            renderer.apply(ButtonState::from_bits(bits));
        }
        assert_eq!(renderer.into_inner(), b"0x01\n0x00\n0x01\n");
    }

    #[test]
    fn renderer_surfaces_broken_pipe_and_stops_the_session() {
        let stop = StopToken::new();
        let mut renderer = TerminalRenderer::new(ClosedPipe { writes: 0 }, OutputFormat::Raw)
            .every_state()
            .stop_on_error(stop.clone());

        renderer.apply(ButtonState::from_bits(0x01));
        renderer.apply(ButtonState::from_bits(0x02));
        renderer.apply(ButtonState::from_bits(0x03));

        assert!(stop.is_stopped());
        let err = renderer.take_error().expect("write failure should be kept");
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(renderer.into_inner().writes, 1);
    }

    #[test]
    fn healthy_output_reports_no_error() {
        let stop = StopToken::new();
        let mut renderer =
            TerminalRenderer::new(Vec::new(), OutputFormat::Raw).stop_on_error(stop.clone());
        renderer.apply(ButtonState::from_bits(0x01));

        assert!(renderer.take_error().is_none());
        assert!(!stop.is_stopped());
    }

    struct ClosedPipe {
        writes: usize,
    }

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            self.writes += 1;
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn renderer_can_write_every_state() {
        let mut renderer = TerminalRenderer::new(Vec::new(), OutputFormat::Raw).every_state();
        renderer.apply(ButtonState::from_bits(0x02));
        renderer.apply(ButtonState::from_bits(0x02));
        assert_eq!(renderer.into_inner(), b"0x02\n0x02\n");
    }
}
