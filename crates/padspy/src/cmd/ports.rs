use padspy_transport::available_ports;

use crate::cmd::{AppContext, PortsArgs};
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::print_ports;

pub fn run(_args: PortsArgs, ctx: &AppContext) -> CliResult<i32> {
    let ports = available_ports().map_err(|err| transport_error("port scan failed", err))?;
    print_ports(&ports, ctx.format);
    Ok(SUCCESS)
}
