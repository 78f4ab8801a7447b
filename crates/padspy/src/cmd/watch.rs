use padspy_pump::{PumpExit, ReaderExit, StopToken, TransitionLog};
use padspy_transport::{ensure_port_exists, open};
use tracing::{info, warn};

use crate::cmd::{install_ctrlc_handler, run_session, AppContext, SessionEnd, WatchArgs};
use crate::exit::{
    frame_error, io_error, transport_error, CliError, CliResult, FAILURE, INTERNAL, SUCCESS,
};
use crate::output::TerminalRenderer;

pub fn run(args: WatchArgs, ctx: &AppContext) -> CliResult<i32> {
    let mut settings = ctx.settings.clone();
    if let Some(port) = args.port {
        settings.port = port;
    }
    if let Some(baud) = args.baud {
        settings.baud = baud;
    }
    args.stream.apply_to(&mut settings);

    if !args.no_port_check {
        ensure_port_exists(&settings.port)
            .map_err(|err| transport_error("port check failed", err))?;
    }
    let link = open(&settings.serial_settings())
        .map_err(|err| transport_error("open failed", err))?;
    info!(port = link.port(), baud = settings.baud, wire = %settings.format, "watching");

    let stop = StopToken::new();
    install_ctrlc_handler(stop.clone())?;

    let renderer =
        TerminalRenderer::new(std::io::stdout(), ctx.format).stop_on_error(stop.clone());
    let frame = settings.frame_config();
    let pump = settings.pump_config();
    let capacity = args.stream.capacity();

    let (end, mut renderer) = if args.stream.transitions {
        let mut consumer = TransitionLog::new(renderer);
        let end = run_session(link, frame, pump, capacity, &mut consumer, &stop)?;
        (end, consumer.into_inner())
    } else {
        let mut consumer = renderer;
        let end = run_session(link, frame, pump, capacity, &mut consumer, &stop)?;
        (end, consumer)
    };

    if let Some(err) = renderer.take_error() {
        return Err(io_error("output write failed", err));
    }
    exit_code(end)
}

/// Ctrl-C is a clean exit; anything that ends the stream on its own is not.
fn exit_code(end: SessionEnd) -> CliResult<i32> {
    if end.pump == PumpExit::Stopped {
        return Ok(SUCCESS);
    }
    match end.reader {
        ReaderExit::Stopped => Ok(SUCCESS),
        ReaderExit::StreamClosed => {
            warn!(applied = end.applied, "serial stream closed");
            Err(CliError::new(FAILURE, "serial stream closed"))
        }
        ReaderExit::Failed(err) => {
            warn!(error = %err, "serial stream lost");
            Err(frame_error("serial read failed", err))
        }
        ReaderExit::ConsumerGone | ReaderExit::Panicked => {
            Err(CliError::new(INTERNAL, "reader thread ended unexpectedly"))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Error, ErrorKind};

    use padspy_frame::FrameError;

    use super::*;

    fn end(pump: PumpExit, reader: ReaderExit) -> SessionEnd {
        SessionEnd {
            pump,
            reader,
            applied: 0,
            dropped: 0,
        }
    }

    #[test]
    fn ctrl_c_is_success() {
        let code = exit_code(end(PumpExit::Stopped, ReaderExit::Stopped)).unwrap();
        assert_eq!(code, SUCCESS);
    }

    #[test]
    fn stream_close_is_failure() {
        let err = exit_code(end(PumpExit::SourceClosed, ReaderExit::StreamClosed)).unwrap_err();
        assert_eq!(err.code, FAILURE);
    }

    #[test]
    fn unplugged_device_reports_io_error() {
        let lost = FrameError::Io(Error::from(ErrorKind::BrokenPipe));
        let err = exit_code(end(PumpExit::SourceClosed, ReaderExit::Failed(lost))).unwrap_err();
        assert!(err.message.starts_with("serial read failed"));
    }
}
