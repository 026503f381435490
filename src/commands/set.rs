//! Set command implementation

use ch9121_core::{ConfigWriter, Port, Transport};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::cli::SetArgs;

/// Stage every setting given on the command line, then commit
///
/// The chip saves the new settings and restarts with them. Configuration
/// mode is left whether or not the commit succeeds.
pub fn cmd_set<T, P, D>(
    writer: &mut ConfigWriter<T, P, D>,
    args: &SetArgs,
) -> Result<(), Box<dyn std::error::Error>>
where
    T: Transport,
    P: OutputPin,
    D: DelayNs,
{
    // The port range is enforced by clap
    let port = Port::from_number(args.port).ok_or("Port must be 1 or 2")?;

    writer.enter()?;
    let result = stage_settings(writer, args, port).and_then(|count| {
        if count == 0 {
            return Ok(0);
        }
        writer.commit().map(|()| count)
    });
    let exit = writer.exit();

    let count = result?;
    exit?;

    if count == 0 {
        return Err("Nothing to set (see 'ch9121 set --help')".into());
    }
    println!("Applied {} setting(s), chip restarted", count);
    Ok(())
}

fn stage_settings<T, P, D>(
    writer: &mut ConfigWriter<T, P, D>,
    args: &SetArgs,
    port: Port,
) -> ch9121_core::Result<usize>
where
    T: Transport,
    P: OutputPin,
    D: DelayNs,
{
    if let Some(dhcp) = args.dhcp {
        writer.dhcp(dhcp.enabled())?;
    }
    if let Some(ip) = args.ip {
        writer.device_ip(ip)?;
    }
    if let Some(mask) = args.subnet {
        writer.subnet_mask(mask)?;
    }
    if let Some(gateway) = args.gateway {
        writer.gateway_ip(gateway)?;
    }
    if let Some(enable) = args.enable_port2 {
        writer.port2_enabled(enable.enabled())?;
    }

    if let Some(mode) = args.mode {
        writer.network_mode(port, mode.into())?;
    }
    if let Some(number) = args.local_port {
        writer.device_port(port, number)?;
    }
    if let Some(ip) = args.dest_ip {
        writer.destination_ip(port, ip)?;
    }
    if let Some(number) = args.dest_port {
        writer.destination_port(port, number)?;
    }
    if let Some(baud) = args.baud {
        writer.baud_rate(port, baud)?;
    }
    if let Some(framing) = args.framing {
        writer.uart_framing(port, framing)?;
    }
    if let Some(timeout) = args.timeout {
        writer.timeout(port, timeout)?;
    }

    for write in writer.staged() {
        log::debug!(
            "Staged command 0x{:02X} ({} payload bytes)",
            write.command,
            write.payload.len()
        );
    }
    Ok(writer.staged().len())
}
