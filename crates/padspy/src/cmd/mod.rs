use std::io::Read;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Args, Subcommand};
use padspy::config::Settings;
use padspy_frame::{FrameConfig, WireFormat};
use padspy_pump::{
    spawn_reader, state_channel, ChannelCapacity, DrainPolicy, PumpConfig, PumpExit, ReaderExit,
    ReaderHandle, RenderPump, StateConsumer, StopToken,
};
use tracing::debug;

use crate::exit::{pump_error, CliError, CliResult, INTERNAL};
use crate::output::OutputFormat;

pub mod config;
pub mod decode;
pub mod emit;
pub mod ports;
pub mod version;
pub mod watch;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show live controller state from a serial receiver.
    Watch(WatchArgs),
    /// Decode a recorded capture from a file or stdin.
    Decode(DecodeArgs),
    /// Encode a button state and write it as a receiver would.
    Emit(EmitArgs),
    /// List available serial ports.
    Ports(PortsArgs),
    /// Show or change persisted settings.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Show version information.
    Version(VersionArgs),
}

/// Everything a command needs from the top level, built once per run.
#[derive(Debug)]
pub struct AppContext {
    pub format: OutputFormat,
    pub config_path: PathBuf,
    pub settings: Settings,
}

pub fn run(command: Command, ctx: &AppContext) -> CliResult<i32> {
    match command {
        Command::Watch(args) => watch::run(args, ctx),
        Command::Decode(args) => decode::run(args, ctx),
        Command::Emit(args) => emit::run(args, ctx),
        Command::Ports(args) => ports::run(args, ctx),
        Command::Config(command) => config::run(command, ctx),
        Command::Version(args) => version::run(args),
    }
}

/// Options shared by commands that read a controller stream.
#[derive(Args, Debug, Default)]
pub struct StreamArgs {
    /// Wire format (bytes or hex). Default: from settings.
    #[arg(long, value_name = "FORMAT")]
    pub wire: Option<WireFormat>,
    /// Render interval in milliseconds. Default: from settings.
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_ms: Option<u64>,
    /// Apply every queued state per tick (all) or one per tick (one).
    #[arg(long, value_name = "POLICY")]
    pub drain: Option<DrainPolicy>,
    /// Bound the state queue; states arriving while it is full are dropped.
    #[arg(long, value_name = "N")]
    pub queue: Option<usize>,
    /// Log every button press and release.
    #[arg(long)]
    pub transitions: bool,
}

impl StreamArgs {
    /// Flags override file settings.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(wire) = self.wire {
            settings.format = wire;
        }
        if let Some(ms) = self.interval_ms {
            settings.interval_ms = ms;
        }
        if let Some(drain) = self.drain {
            settings.drain = drain;
        }
    }

    pub fn capacity(&self) -> ChannelCapacity {
        match self.queue {
            Some(n) => ChannelCapacity::Bounded(n),
            None => ChannelCapacity::Unbounded,
        }
    }
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Serial port. Default: from settings.
    #[arg(long, short = 'p', value_name = "PORT")]
    pub port: Option<String>,
    /// Baud rate. Default: from settings.
    #[arg(long, short = 'b', value_name = "BAUD")]
    pub baud: Option<u32>,
    /// Open the port without first checking it is listed by the system.
    #[arg(long)]
    pub no_port_check: bool,
    #[command(flatten)]
    pub stream: StreamArgs,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Capture file. Reads stdin when omitted or `-`.
    pub file: Option<PathBuf>,
    /// Print only states that differ from the previous one.
    #[arg(long)]
    pub changes_only: bool,
    #[command(flatten)]
    pub stream: StreamArgs,
}

#[derive(Args, Debug)]
pub struct EmitArgs {
    /// Buttons to press: names joined by `+` or `,` (A+UP), `none`, or a hex
    /// value (0x11).
    pub buttons: String,
    /// Wire format (bytes or hex). Default: from settings.
    #[arg(long, value_name = "FORMAT")]
    pub wire: Option<WireFormat>,
    /// Write to this serial port instead of stdout.
    #[arg(long, short = 'p', value_name = "PORT")]
    pub port: Option<String>,
    /// Baud rate when writing to a port. Default: from settings.
    #[arg(long, short = 'b', value_name = "BAUD")]
    pub baud: Option<u32>,
    /// Number of frames to write.
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u64).range(1..))]
    pub repeat: u64,
    /// Delay between repeated frames in milliseconds.
    #[arg(long, value_name = "MS", default_value = "10")]
    pub every_ms: u64,
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective settings.
    Show,
    /// Change settings and save them.
    Set(ConfigSetArgs),
}

#[derive(Args, Debug, Default)]
pub struct ConfigSetArgs {
    #[arg(long, value_name = "PORT")]
    pub port: Option<String>,
    #[arg(long, value_name = "BAUD", value_parser = clap::value_parser!(u32).range(1..))]
    pub baud: Option<u32>,
    #[arg(long, value_name = "FORMAT")]
    pub wire: Option<WireFormat>,
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_ms: Option<u64>,
    #[arg(long, value_name = "POLICY")]
    pub drain: Option<DrainPolicy>,
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub read_timeout_ms: Option<u64>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// How a reader/pump session ended.
#[derive(Debug)]
pub struct SessionEnd {
    pub pump: PumpExit,
    pub reader: ReaderExit,
    pub applied: u64,
    pub dropped: u64,
}

/// Run the reader thread over `source` and pump its states into `consumer`
/// on this thread until the source ends or `stop` fires.
pub fn run_session<S, C>(
    source: S,
    frame: FrameConfig,
    pump: PumpConfig,
    capacity: ChannelCapacity,
    consumer: &mut C,
    stop: &StopToken,
) -> CliResult<SessionEnd>
where
    S: Read + Send + 'static,
    C: StateConsumer + ?Sized,
{
    let (tx, rx) = state_channel(capacity);
    let reader = spawn_reader(source, frame, tx, stop.clone())
        .map_err(|err| pump_error("reader start failed", err))?;

    let mut render = RenderPump::new(rx, pump);
    let pump_exit = render.run(consumer, stop);

    stop.stop();
    let reader_exit = match pump_exit {
        PumpExit::SourceClosed => reader.join(),
        PumpExit::Stopped => join_within(reader, STOP_GRACE),
    };
    debug!(
        pump = ?pump_exit,
        reader = ?reader_exit,
        applied = render.applied(),
        dropped = render.dropped(),
        "session ended"
    );

    Ok(SessionEnd {
        pump: pump_exit,
        reader: reader_exit,
        applied: render.applied(),
        dropped: render.dropped(),
    })
}

/// A reader blocked on a source without read timeouts (stdin, pipes) is
/// left behind after this long; it exits with the process.
const STOP_GRACE: Duration = Duration::from_millis(500);

fn join_within(reader: ReaderHandle, grace: Duration) -> ReaderExit {
    let deadline = Instant::now() + grace;
    while !reader.is_finished() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    if reader.is_finished() {
        reader.join()
    } else {
        debug!("reader still blocked in read, detaching");
        ReaderExit::Stopped
    }
}

/// Ctrl-C fires `stop`.
pub fn install_ctrlc_handler(stop: StopToken) -> CliResult<()> {
    ctrlc::set_handler(move || stop.stop()).map_err(|err| {
        CliError::new(INTERNAL, format!("signal handler setup failed: {err}"))
    })
}
