use std::fs::File;
use std::io::Read;

use padspy_pump::{ReaderExit, StopToken, TransitionLog};
use tracing::{debug, info};

use crate::cmd::{install_ctrlc_handler, run_session, AppContext, DecodeArgs, SessionEnd};
use crate::exit::{frame_error, io_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::TerminalRenderer;

pub fn run(args: DecodeArgs, ctx: &AppContext) -> CliResult<i32> {
    let mut settings = ctx.settings.clone();
    args.stream.apply_to(&mut settings);

    let source: Box<dyn Read + Send> = match &args.file {
        Some(path) if path.as_os_str() != "-" => Box::new(File::open(path).map_err(|err| {
            io_error(&format!("failed opening {}", path.display()), err)
        })?),
        _ => Box::new(std::io::stdin()),
    };
    debug!(wire = %settings.format, "decoding capture");

    let stop = StopToken::new();
    install_ctrlc_handler(stop.clone())?;

    let mut renderer =
        TerminalRenderer::new(std::io::stdout(), ctx.format).stop_on_error(stop.clone());
    if !args.changes_only {
        renderer = renderer.every_state();
    }
    let frame = settings.frame_config();
    let pump = settings.pump_config();
    let capacity = args.stream.capacity();

    let (end, mut renderer) = if args.stream.transitions {
        let mut consumer = TransitionLog::new(renderer);
        let end = run_session(source, frame, pump, capacity, &mut consumer, &stop)?;
        (end, consumer.into_inner())
    } else {
        let mut consumer = renderer;
        let end = run_session(source, frame, pump, capacity, &mut consumer, &stop)?;
        (end, consumer)
    };

    if let Some(err) = renderer.take_error() {
        return Err(io_error("output write failed", err));
    }
    exit_code(end)
}

/// End of a capture is the normal way out.
fn exit_code(end: SessionEnd) -> CliResult<i32> {
    match end.reader {
        ReaderExit::StreamClosed | ReaderExit::Stopped => {
            info!(applied = end.applied, dropped = end.dropped, "capture decoded");
            Ok(SUCCESS)
        }
        ReaderExit::Failed(err) => Err(frame_error("capture read failed", err)),
        ReaderExit::ConsumerGone | ReaderExit::Panicked => {
            Err(CliError::new(INTERNAL, "reader thread ended unexpectedly"))
        }
    }
}
