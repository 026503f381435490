//! Get command implementation

use ch9121_core::{ConfigReader, NetworkMode, Port, Transport};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::cli::Setting;

/// Read a single setting and format it for display
///
/// `port` is ignored for device-wide settings.
pub fn cmd_get<T, P, D>(
    reader: &mut ConfigReader<T, P, D>,
    setting: Setting,
    port: Port,
) -> Result<String, Box<dyn std::error::Error>>
where
    T: Transport,
    P: OutputPin,
    D: DelayNs,
{
    if !setting.is_per_port() && port != Port::One {
        log::warn!("{:?} is a device setting, ignoring --port", setting);
    }

    reader.enter()?;
    let value = read_setting(reader, setting, port);
    let exit = reader.exit();

    let value = value?;
    exit?;
    Ok(value)
}

fn read_setting<T, P, D>(
    reader: &mut ConfigReader<T, P, D>,
    setting: Setting,
    port: Port,
) -> ch9121_core::Result<String>
where
    T: Transport,
    P: OutputPin,
    D: DelayNs,
{
    let value = match setting {
        Setting::Ip => reader.device_ip()?.to_string(),
        Setting::Subnet => reader.subnet_mask()?.to_string(),
        Setting::Gateway => reader.gateway_ip()?.to_string(),
        Setting::Mac => reader.device_mac()?.to_string(),
        Setting::Version => format!("0x{:02X}", reader.chip_version()?),
        Setting::Mode => {
            let code = reader.network_mode(port)?;
            match NetworkMode::from_code(code) {
                Some(mode) => format!("{} ({})", code, mode),
                None => format!("{} (unknown)", code),
            }
        }
        Setting::LocalPort => reader.device_port(port)?.to_string(),
        Setting::DestIp => reader.destination_ip(port)?.to_string(),
        Setting::DestPort => reader.destination_port(port)?.to_string(),
        Setting::Baud => reader.baud_rate(port)?.to_string(),
        Setting::Framing => {
            let framing = reader.uart_framing(port)?;
            match framing.check_label() {
                Some(label) => format!("{} ({} parity)", framing, label),
                None => framing.to_string(),
            }
        }
        Setting::Timeout => format!("{}ms", reader.timeout(port)?.saturating_mul(5)),
        Setting::Port2 => reader.port2_enabled()?.to_string(),
    };
    Ok(value)
}
