use std::io::Write;
use std::thread;
use std::time::Duration;

use padspy_frame::{decode_hex, ButtonState, FrameConfig, FrameWriter};
use padspy_transport::open;
use tracing::debug;

use crate::cmd::{AppContext, EmitArgs};
use crate::exit::{frame_error, parse_error, transport_error, CliResult, SUCCESS};

pub fn run(args: EmitArgs, ctx: &AppContext) -> CliResult<i32> {
    let state = parse_state(&args.buttons)?;
    let config = FrameConfig::new(args.wire.unwrap_or(ctx.settings.format));
    debug!(state = state.bits(), wire = %config.format, repeat = args.repeat, "emitting");

    match &args.port {
        Some(port) => {
            let mut settings = ctx.settings.clone();
            settings.port = port.clone();
            if let Some(baud) = args.baud {
                settings.baud = baud;
            }
            let link = open(&settings.serial_settings())
                .map_err(|err| transport_error("open failed", err))?;
            write_frames(FrameWriter::with_config(link, config), state, &args)
        }
        None => {
            let stdout = std::io::stdout().lock();
            write_frames(FrameWriter::with_config(stdout, config), state, &args)
        }
    }
}

fn write_frames<W: Write>(
    mut writer: FrameWriter<W>,
    state: ButtonState,
    args: &EmitArgs,
) -> CliResult<i32> {
    for i in 0..args.repeat {
        if i > 0 && args.every_ms > 0 {
            thread::sleep(Duration::from_millis(args.every_ms));
        }
        writer
            .send(state)
            .map_err(|err| frame_error("write failed", err))?;
    }
    Ok(SUCCESS)
}

/// Button names first (`A+UP`, `b`), then a hex value (`0x11`, `ff`).
fn parse_state(input: &str) -> CliResult<ButtonState> {
    match input.parse::<ButtonState>() {
        Ok(state) => Ok(state),
        Err(err) => decode_hex(input).ok_or_else(|| parse_error("invalid buttons", err)),
    }
}
