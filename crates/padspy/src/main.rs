mod cmd;
mod exit;
mod logging;
mod output;

use std::path::PathBuf;

use clap::Parser;
use padspy::config::{Settings, DEFAULT_CONFIG_FILE};

use crate::cmd::{AppContext, Command};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "padspy", version, about = "NES controller state viewer")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Settings file.
    #[arg(
        long,
        value_name = "FILE",
        env = "PADSPY_CONFIG",
        default_value = DEFAULT_CONFIG_FILE,
        global = true
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let ctx = AppContext {
        format: cli.format.unwrap_or_else(OutputFormat::default_for_stdout),
        settings: Settings::load(&cli.config),
        config_path: cli.config,
    };

    match cmd::run(cli.command, &ctx) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
