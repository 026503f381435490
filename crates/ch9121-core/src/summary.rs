//! Structured configuration report

use core::fmt;
use core::net::Ipv4Addr;

use crate::types::{MacAddress, NetworkMode, UartFraming};

/// Device-wide network identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceNetwork {
    /// Device IP address
    pub ip: Ipv4Addr,
    /// Gateway IP address
    pub gateway: Ipv4Addr,
    /// Subnet mask
    pub subnet: Ipv4Addr,
    /// MAC address
    pub mac: MacAddress,
}

/// Settings of one UART port, raw codes preserved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSettings {
    /// Network mode code
    pub mode: u32,
    /// Local port number
    pub device_port: u32,
    /// Remote port number
    pub destination_port: u32,
    /// Remote IP address
    pub destination_ip: Ipv4Addr,
    /// Serial baud rate
    pub baud_rate: u32,
    /// Stop/check/data bits
    pub framing: UartFraming,
    /// Serial timeout, in units of 5 ms
    pub timeout: u32,
}

impl PortSettings {
    /// Network mode, if the code is a known one
    pub fn network_mode(&self) -> Option<NetworkMode> {
        NetworkMode::from_code(self.mode)
    }

    /// Serial timeout in milliseconds
    pub fn timeout_ms(&self) -> u32 {
        self.timeout.saturating_mul(5)
    }
}

/// Full configuration as read by [`ConfigReader::summary`](crate::ConfigReader::summary)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Device network settings
    pub device: DeviceNetwork,
    /// UART 1 settings
    pub port1: PortSettings,
    /// UART 2 settings
    pub port2: PortSettings,
}

fn heading(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f, "{}", title)?;
    for _ in 0..title.len() {
        f.write_str("=")?;
    }
    writeln!(f)
}

impl fmt::Display for DeviceNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        heading(f, "Device Network")?;
        writeln!(f, "IP:                       {}", self.ip)?;
        writeln!(f, "Gateway:                  {}", self.gateway)?;
        writeln!(f, "Subnet:                   {}", self.subnet)?;
        writeln!(f, "MAC:                      {}", self.mac)
    }
}

impl fmt::Display for PortSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.network_mode() {
            Some(mode) => writeln!(f, "Network mode:             {} ({})", self.mode, mode)?,
            None => writeln!(f, "Network mode:             {} (unknown)", self.mode)?,
        }
        writeln!(f, "Device port:              {}", self.device_port)?;
        writeln!(f, "Destination port:         {}", self.destination_port)?;
        writeln!(f, "Destination IP:           {}", self.destination_ip)?;
        writeln!(f, "Baud rate:                {}", self.baud_rate)?;
        write!(f, "Bits (stop, check, data): {}", self.framing)?;
        match self.framing.check_label() {
            Some(label) => writeln!(f, " ({} parity)", label)?,
            None => writeln!(f)?,
        }
        writeln!(f, "Timeout:                  {}ms", self.timeout_ms())
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.device)?;
        writeln!(f)?;
        heading(f, "UART 1")?;
        write!(f, "{}", self.port1)?;
        writeln!(f)?;
        heading(f, "UART 2")?;
        write!(f, "{}", self.port2)
    }
}
