use tracing::info;

use crate::cmd::{AppContext, ConfigCommand, ConfigSetArgs};
use crate::exit::{io_error, CliResult, SUCCESS};
use crate::output::print_settings;

pub fn run(command: ConfigCommand, ctx: &AppContext) -> CliResult<i32> {
    match command {
        ConfigCommand::Show => {
            print_settings(&ctx.settings, &ctx.config_path, ctx.format);
            Ok(SUCCESS)
        }
        ConfigCommand::Set(args) => set(args, ctx),
    }
}

fn set(args: ConfigSetArgs, ctx: &AppContext) -> CliResult<i32> {
    let mut settings = ctx.settings.clone();
    if let Some(port) = args.port {
        settings.port = port;
    }
    if let Some(baud) = args.baud {
        settings.baud = baud;
    }
    if let Some(wire) = args.wire {
        settings.format = wire;
    }
    if let Some(ms) = args.interval_ms {
        settings.interval_ms = ms;
    }
    if let Some(drain) = args.drain {
        settings.drain = drain;
    }
    if let Some(ms) = args.read_timeout_ms {
        settings.read_timeout_ms = ms;
    }

    settings.save(&ctx.config_path).map_err(|err| {
        io_error(&format!("failed writing {}", ctx.config_path.display()), err)
    })?;
    info!(path = %ctx.config_path.display(), port = %settings.port, baud = settings.baud, "settings saved");

    print_settings(&settings, &ctx.config_path, ctx.format);
    Ok(SUCCESS)
}
