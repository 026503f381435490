//! Configuration writer
//!
//! Settings are staged locally and only sent by [`ConfigWriter::commit`],
//! which transmits them in order, then saves them to EEPROM and makes the
//! chip reload. Every write is answered with a single status byte;
//! [`protocol::ACK`] means accepted.

use core::net::Ipv4Addr;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::error::{Error, Result};
use crate::port::Port;
use crate::protocol::{self, cmd, Frame, MAX_PAYLOAD_LEN};
use crate::session::{ConfigSession, SessionConfig, SessionState};
use crate::transport::Transport;
use crate::types::{NetworkMode, UartFraming};

/// Maximum number of writes staged before a commit
pub const MAX_STAGED: usize = 24;

/// One buffered write request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedWrite {
    /// Write command
    pub command: u8,
    /// New value, already in wire format
    pub payload: heapless::Vec<u8, MAX_PAYLOAD_LEN>,
}

impl StagedWrite {
    /// Stage `payload` for `command`
    pub fn new(command: u8, payload: &[u8]) -> Result<Self> {
        let payload = heapless::Vec::from_slice(payload).map_err(|()| Error::PayloadTooLong)?;
        Ok(Self { command, payload })
    }

    /// Encoded request frame
    pub fn frame(&self) -> Result<Frame> {
        protocol::encode_write(self.command, &self.payload)
    }
}

/// Changes the chip's configuration
pub struct ConfigWriter<T, P, D> {
    session: ConfigSession<T, P, D>,
    staged: heapless::Vec<StagedWrite, MAX_STAGED>,
}

impl<T, P, D> ConfigWriter<T, P, D>
where
    T: Transport,
    P: OutputPin,
    D: DelayNs,
{
    /// Create an idle writer
    pub fn new(transport: T, pin: P, delay: D, config: SessionConfig) -> Self {
        Self::from_session(ConfigSession::new(transport, pin, delay, config))
    }

    /// Wrap an existing session
    pub fn from_session(session: ConfigSession<T, P, D>) -> Self {
        Self {
            session,
            staged: heapless::Vec::new(),
        }
    }

    /// Give the underlying session back, dropping anything staged
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
    /// Writes that were staged but not committed are dropped.
    pub fn exit(&mut self) -> Result<()> {
        if !self.staged.is_empty() {
            log::warn!(
                "ch9121: Dropping {} uncommitted settings",
                self.staged.len()
            );
            self.staged.clear();
        }
        self.session.exit()
    }

    /// Writes waiting for [`commit`](Self::commit)
    pub fn staged(&self) -> &[StagedWrite] {
        &self.staged
    }

    /// Forget every staged write
    pub fn discard(&mut self) {
        self.staged.clear();
    }

    /// Stage a raw write
    pub fn stage(&mut self, command: u8, payload: &[u8]) -> Result<()> {
        if !self.session.is_configuring() {
            return Err(Error::NotConfiguring);
        }

        let write = StagedWrite::new(command, payload)?;
        self.staged.push(write).map_err(|_| Error::StagingFull)?;
        log::debug!("ch9121: Staged command 0x{:02X} {:02X?}", command, payload);
        Ok(())
    }

    // ---- Device network ----

    /// Turn DHCP on or off
    pub fn dhcp(&mut self, enabled: bool) -> Result<()> {
        self.stage(cmd::SET_DHCP, &[enabled as u8])
    }

    /// Set the device IP address
    pub fn device_ip(&mut self, ip: Ipv4Addr) -> Result<()> {
        self.stage(cmd::SET_DEVICE_IP, &ip.octets())
    }

    /// Set the subnet mask
    pub fn subnet_mask(&mut self, mask: Ipv4Addr) -> Result<()> {
        self.stage(cmd::SET_SUBNET_MASK, &mask.octets())
    }

    /// Set the gateway IP address
    pub fn gateway_ip(&mut self, ip: Ipv4Addr) -> Result<()> {
        self.stage(cmd::SET_GATEWAY_IP, &ip.octets())
    }

    /// Turn UART 2 on or off
    pub fn port2_enabled(&mut self, enabled: bool) -> Result<()> {
        self.stage(cmd::SET_PORT2_ENABLE, &[enabled as u8])
    }

    // ---- Per-port settings ----

    /// Select a port's network mode
    pub fn network_mode(&mut self, port: Port, mode: NetworkMode) -> Result<()> {
        self.stage(port.write_registers().mode, &[mode.code()])
    }

    /// Shorthand for selecting TCP client mode
    pub fn tcp_client(&mut self, port: Port) -> Result<()> {
        self.network_mode(port, NetworkMode::TcpClient)
    }

    /// Set a port's local port number
    pub fn device_port(&mut self, port: Port, number: u16) -> Result<()> {
        self.stage(port.write_registers().device_port, &number.to_le_bytes())
    }

    /// Set a port's remote IP address
    pub fn destination_ip(&mut self, port: Port, ip: Ipv4Addr) -> Result<()> {
        self.stage(port.write_registers().destination_ip, &ip.octets())
    }

    /// Set a port's remote port number
    pub fn destination_port(&mut self, port: Port, number: u16) -> Result<()> {
        self.stage(
            port.write_registers().destination_port,
            &number.to_le_bytes(),
        )
    }

    /// Set a port's baud rate
    pub fn baud_rate(&mut self, port: Port, baud: u32) -> Result<()> {
        self.stage(port.write_registers().baud_rate, &baud.to_le_bytes())
    }

    /// Set a port's stop/check/data bits
    pub fn uart_framing(&mut self, port: Port, framing: UartFraming) -> Result<()> {
        self.stage(port.write_registers().framing, &framing.to_bytes())
    }

    /// Set a port's serial timeout, in units of 5 ms
    pub fn timeout(&mut self, port: Port, timeout: u32) -> Result<()> {
        self.stage(port.write_registers().timeout, &timeout.to_le_bytes())
    }

    /// Send every staged write, save and apply
    ///
    /// Stops at the first write the chip does not acknowledge. The staging
    /// buffer is empty afterwards whatever the outcome.
    pub fn commit(&mut self) -> Result<()> {
        if !self.session.is_configuring() {
            return Err(Error::NotConfiguring);
        }

        let staged = core::mem::take(&mut self.staged);
        for write in &staged {
            self.send_acked(&write.frame()?)?;
        }

        self.send_acked(&protocol::encode_request(cmd::SAVE_PARAMETERS))?;
        self.send_acked(&protocol::encode_request(cmd::EXECUTE_AND_RESET))?;
        log::info!("ch9121: Committed {} settings", staged.len());

        Ok(())
    }

    fn send_acked(&mut self, frame: &[u8]) -> Result<()> {
        let command = frame[2];
        let response = self.session.transact(frame, protocol::MIN_UINT_LEN)?;

        match response.first() {
            Some(&protocol::ACK) => Ok(()),
            Some(&status) => {
                log::error!(
                    "ch9121: Command 0x{:02X} rejected (status 0x{:02X})",
                    command,
                    status
                );
                Err(Error::Rejected { command, status })
            }
            None => Err(Error::MalformedResponse {
                expected: 1,
                actual: 0,
            }),
        }
    }
}
