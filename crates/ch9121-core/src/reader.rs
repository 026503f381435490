//! Configuration reader
//!
//! [`ConfigReader`] wraps a [`ConfigSession`] with one accessor per readable
//! setting. Each accessor is a single round trip whose response is decoded
//! with the rule that belongs to its command.

use core::net::Ipv4Addr;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::error::{Error, Result};
use crate::port::Port;
use crate::protocol::{self, cmd};
use crate::session::{ConfigSession, SessionConfig, SessionState};
use crate::summary::{DeviceNetwork, PortSettings, Summary};
use crate::transport::Transport;
use crate::types::{MacAddress, UartFraming};

/// Reads the chip's current configuration
pub struct ConfigReader<T, P, D> {
    session: ConfigSession<T, P, D>,
}

impl<T, P, D> ConfigReader<T, P, D>
where
    T: Transport,
    P: OutputPin,
    D: DelayNs,
{
    /// Create an idle reader
    pub fn new(transport: T, pin: P, delay: D, config: SessionConfig) -> Self {
        Self::from_session(ConfigSession::new(transport, pin, delay, config))
    }

    /// Wrap an existing session
    pub fn from_session(session: ConfigSession<T, P, D>) -> Self {
        Self { session }
    }

    /// Give the underlying session back
    pub fn into_session(self) -> ConfigSession<T, P, D> {
        self.session
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Enter configuration mode
    pub fn enter(&mut self) -> Result<()> {
        self.session.enter()
    }

    /// Leave configuration mode
    ///
    /// Sends the "leave serial configuration mode" command first. The chip
    /// only honours it on the negotiating side, so a missing or odd reply
    /// is logged and ignored; the pin is released either way.
    pub fn exit(&mut self) -> Result<()> {
        if !self.session.is_configuring() {
            return Ok(());
        }

        match self.session.round_trip(cmd::LEAVE_CONFIG_MODE, protocol::MIN_UINT_LEN) {
            Ok(_) => {}
            Err(e @ (Error::ResponseTimeout { .. } | Error::MalformedResponse { .. })) => {
                log::warn!("ch9121: Leave-config-mode command not acknowledged: {}", e);
            }
            Err(e) => {
                // Still try to release the pin before reporting the failure
                if let Err(pin_err) = self.session.exit() {
                    log::warn!(
                        "ch9121: Failed to leave configuration mode after error: {}",
                        pin_err
                    );
                }
                return Err(e);
            }
        }

        self.session.exit()
    }

    // ---- Device network ----

    /// Device IP address
    pub fn device_ip(&mut self) -> Result<Ipv4Addr> {
        self.read_ipv4(cmd::READ_DEVICE_IP)
    }

    /// Subnet mask
    pub fn subnet_mask(&mut self) -> Result<Ipv4Addr> {
        self.read_ipv4(cmd::READ_SUBNET_MASK)
    }

    /// Gateway IP address
    pub fn gateway_ip(&mut self) -> Result<Ipv4Addr> {
        self.read_ipv4(cmd::READ_GATEWAY_IP)
    }

    /// Device MAC address
    pub fn device_mac(&mut self) -> Result<MacAddress> {
        let response = self.session.round_trip(cmd::READ_DEVICE_MAC, protocol::MAC_LEN)?;
        protocol::decode_mac(&response)
    }

    /// Chip firmware version
    pub fn chip_version(&mut self) -> Result<u32> {
        self.read_uint(cmd::READ_CHIP_VERSION)
    }

    // ---- Per-port settings ----

    /// Network mode code (see [`NetworkMode`](crate::NetworkMode))
    pub fn network_mode(&mut self, port: Port) -> Result<u32> {
        self.read_uint(port.registers().mode)
    }

    /// Local port number the chip listens on or sends from
    pub fn device_port(&mut self, port: Port) -> Result<u32> {
        self.read_uint(port.registers().device_port)
    }

    /// Remote port number
    pub fn destination_port(&mut self, port: Port) -> Result<u32> {
        self.read_uint(port.registers().destination_port)
    }

    /// Remote IP address
    pub fn destination_ip(&mut self, port: Port) -> Result<Ipv4Addr> {
        self.read_ipv4(port.registers().destination_ip)
    }

    /// Serial baud rate
    pub fn baud_rate(&mut self, port: Port) -> Result<u32> {
        self.read_uint(port.registers().baud_rate)
    }

    /// Stop/check/data bits
    pub fn uart_framing(&mut self, port: Port) -> Result<UartFraming> {
        let response = self.session
            .round_trip(port.registers().framing, protocol::FRAMING_LEN)?;
        protocol::decode_uart_framing(&response)
    }

    /// Serial packet timeout, in units of 5 ms
    pub fn timeout(&mut self, port: Port) -> Result<u32> {
        self.read_uint(port.registers().timeout)
    }

    /// Port 2 enable flag
    ///
    /// The chip reports this through the port 2 mode register.
    pub fn port2_enabled(&mut self) -> Result<u32> {
        self.read_uint(cmd::READ_PORT2_MODE)
    }

    // ---- Grouped reads ----

    /// IP, gateway, subnet and MAC in one go
    pub fn device_network(&mut self) -> Result<DeviceNetwork> {
        Ok(DeviceNetwork {
            ip: self.device_ip()?,
            gateway: self.gateway_ip()?,
            subnet: self.subnet_mask()?,
            mac: self.device_mac()?,
        })
    }

    /// Every setting of one port
    pub fn port_settings(&mut self, port: Port) -> Result<PortSettings> {
        Ok(PortSettings {
            mode: self.network_mode(port)?,
            device_port: self.device_port(port)?,
            destination_port: self.destination_port(port)?,
            destination_ip: self.destination_ip(port)?,
            baud_rate: self.baud_rate(port)?,
            framing: self.uart_framing(port)?,
            timeout: self.timeout(port)?,
        })
    }

    /// Read the whole configuration
    ///
    /// Enters configuration mode, reads device network settings then both
    /// ports, and leaves again. Configuration mode is left even when one of
    /// the reads fails.
    pub fn summary(&mut self) -> Result<Summary> {
        self.enter()?;

        let result = self.read_all();
        let exit = self.exit();

        let summary = result?;
        exit?;
        Ok(summary)
    }

    fn read_all(&mut self) -> Result<Summary> {
        Ok(Summary {
            device: self.device_network()?,
            port1: self.port_settings(Port::One)?,
            port2: self.port_settings(Port::Two)?,
        })
    }

    fn read_ipv4(&mut self, command: u8) -> Result<Ipv4Addr> {
        let response = self.session.round_trip(command, protocol::IPV4_LEN)?;
        protocol::decode_ipv4(&response)
    }

    fn read_uint(&mut self, command: u8) -> Result<u32> {
        let response = self.session.round_trip(command, protocol::MIN_UINT_LEN)?;
        protocol::decode_uint(&response)
    }
}
