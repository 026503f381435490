//! ch9121-dummy - In-memory CH9121 emulator for testing
//!
//! This crate provides a dummy CH9121 that answers configuration commands
//! from an in-memory register file. It's useful for testing and development
//! without real hardware.
//!
//! The emulator hands out three handles sharing the same chip state: a
//! [`DummyTransport`], a [`DummyModePin`] and a [`NoDelay`]. Each call to
//! [`DummyTransport::write`](ch9121_core::Transport::write) is treated as one
//! complete request frame.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::net::Ipv4Addr;
use std::rc::Rc;

use ch9121_core::error::Result;
use ch9121_core::protocol::{cmd, ACK, PREAMBLE};
use ch9121_core::{MacAddress, NetworkMode, Port, Transport, UartFraming};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};

/// Settings of one emulated UART port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DummyPort {
    /// Network mode code
    pub mode: u8,
    /// Local port number
    pub device_port: u16,
    /// Remote IP address
    pub destination_ip: Ipv4Addr,
    /// Remote port number
    pub destination_port: u16,
    /// Baud rate
    pub baud_rate: u32,
    /// Stop/check/data bits
    pub framing: UartFraming,
    /// Serial timeout (units of 5 ms)
    pub timeout: u32,
}

impl Default for DummyPort {
    fn default() -> Self {
        Self {
            mode: NetworkMode::TcpServer.code(),
            device_port: 2000,
            destination_ip: Ipv4Addr::new(192, 168, 1, 100),
            destination_port: 1000,
            baud_rate: 9600,
            framing: UartFraming::new_8n1(),
            timeout: 0,
        }
    }
}

/// Configuration held by the emulated chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DummyConfig {
    /// Chip version byte
    pub version: u8,
    /// Device IP
    pub ip: Ipv4Addr,
    /// Subnet mask
    pub subnet: Ipv4Addr,
    /// Gateway IP
    pub gateway: Ipv4Addr,
    /// MAC address
    pub mac: MacAddress,
    /// DHCP enabled
    pub dhcp: bool,
    /// UART 2 enabled
    ///
    /// Kept apart from `port2.mode`. Reads of 0x90 still answer with the
    /// port 2 mode code.
    pub port2_enabled: bool,
    /// UART 1 settings
    pub port1: DummyPort,
    /// UART 2 settings
    pub port2: DummyPort,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            version: 0x05,
            ip: Ipv4Addr::new(192, 168, 1, 200),
            subnet: Ipv4Addr::new(255, 255, 255, 0),
            gateway: Ipv4Addr::new(192, 168, 1, 1),
            mac: MacAddress([0x84, 0xC2, 0xE4, 0x01, 0x02, 0x03]),
            dhcp: false,
            port2_enabled: false,
            port1: DummyPort::default(),
            port2: DummyPort {
                device_port: 3000,
                destination_port: 2000,
                ..DummyPort::default()
            },
        }
    }
}

impl DummyConfig {
    /// Settings of one port
    pub fn port(&self, port: Port) -> &DummyPort {
        match port {
            Port::One => &self.port1,
            Port::Two => &self.port2,
        }
    }

    fn port_mut(&mut self, port: Port) -> &mut DummyPort {
        match port {
            Port::One => &mut self.port1,
            Port::Two => &mut self.port2,
        }
    }
}

#[derive(Debug)]
struct ChipState {
    /// Settings the chip is running with
    active: DummyConfig,
    /// Settings saved to EEPROM
    saved: DummyConfig,
    /// Settings written since the last save
    pending: DummyConfig,
    pin_low: bool,
    active_low: bool,
    rx: VecDeque<u8>,
    frames: Vec<Vec<u8>>,
    pin_history: Vec<bool>,
    resets: u32,
    silent: bool,
    reject: Option<u8>,
}

impl ChipState {
    fn in_config_mode(&self) -> bool {
        self.pin_low == self.active_low
    }

    fn handle_frame(&mut self, frame: &[u8]) {
        self.frames.push(frame.to_vec());

        if !self.in_config_mode() {
            log::trace!("dummy: Bridged {} bytes", frame.len());
            return;
        }
        if frame.len() < 3 || frame[..2] != PREAMBLE {
            log::debug!("dummy: Ignoring malformed frame {:02X?}", frame);
            return;
        }
        if self.silent {
            return;
        }

        let command = frame[2];
        let payload = &frame[3..];

        if self.reject == Some(command) {
            self.rx.push_back(0x00);
            return;
        }

        if let Some(response) = self.read_register(command) {
            self.rx.extend(response);
        } else if self.write_register(command, payload) {
            self.rx.push_back(ACK);
        } else {
            log::debug!("dummy: Unknown command 0x{:02X}", command);
        }
    }

    fn read_register(&self, command: u8) -> Option<Vec<u8>> {
        let c = &self.active;
        let port_read = |port: Port, command: u8| -> Option<Vec<u8>> {
            let regs = port.registers();
            let p = c.port(port);
            let bytes = match command {
                _ if command == regs.mode => vec![p.mode],
                _ if command == regs.device_port => p.device_port.to_le_bytes().to_vec(),
                _ if command == regs.destination_ip => p.destination_ip.octets().to_vec(),
                _ if command == regs.destination_port => {
                    p.destination_port.to_le_bytes().to_vec()
                }
                _ if command == regs.baud_rate => p.baud_rate.to_le_bytes().to_vec(),
                _ if command == regs.framing => p.framing.to_bytes().to_vec(),
                _ if command == regs.timeout => p.timeout.to_le_bytes().to_vec(),
                _ => return None,
            };
            Some(bytes)
        };

        match command {
            cmd::READ_CHIP_VERSION => Some(vec![c.version]),
            cmd::LEAVE_CONFIG_MODE => Some(vec![ACK]),
            cmd::READ_DEVICE_IP => Some(c.ip.octets().to_vec()),
            cmd::READ_SUBNET_MASK => Some(c.subnet.octets().to_vec()),
            cmd::READ_GATEWAY_IP => Some(c.gateway.octets().to_vec()),
            cmd::READ_DEVICE_MAC => Some(c.mac.octets().to_vec()),
            _ => port_read(Port::One, command).or_else(|| port_read(Port::Two, command)),
        }
    }

    /// Apply a write command; false if the command is unknown
    fn write_register(&mut self, command: u8, payload: &[u8]) -> bool {
        match command {
            cmd::SAVE_PARAMETERS => {
                self.saved = self.pending;
                return true;
            }
            cmd::EXECUTE_AND_RESET => {
                self.active = self.saved;
                self.pending = self.saved;
                self.resets += 1;
                log::debug!("dummy: Chip reset with new configuration");
                return true;
            }
            _ => {}
        }

        let p = &mut self.pending;
        match command {
            cmd::SET_DEVICE_IP => p.ip = ipv4(payload),
            cmd::SET_SUBNET_MASK => p.subnet = ipv4(payload),
            cmd::SET_GATEWAY_IP => p.gateway = ipv4(payload),
            cmd::SET_DHCP => p.dhcp = payload.first().copied().unwrap_or(0) != 0,
            cmd::SET_PORT2_ENABLE => p.port2_enabled = payload.first().copied().unwrap_or(0) != 0,
            _ => {
                for port in Port::ALL {
                    let regs = port.write_registers();
                    let target = p.port_mut(port);
                    match command {
                        _ if command == regs.mode => {
                            target.mode = payload.first().copied().unwrap_or(0)
                        }
                        _ if command == regs.device_port => target.device_port = le(payload) as u16,
                        _ if command == regs.destination_ip => target.destination_ip = ipv4(payload),
                        _ if command == regs.destination_port => {
                            target.destination_port = le(payload) as u16
                        }
                        _ if command == regs.baud_rate => target.baud_rate = le(payload),
                        _ if command == regs.framing => {
                            let mut raw = [0u8; 3];
                            let n = payload.len().min(3);
                            raw[..n].copy_from_slice(&payload[..n]);
                            target.framing = UartFraming {
                                stop_bits: raw[0],
                                check: raw[1],
                                data_bits: raw[2],
                            };
                        }
                        _ if command == regs.timeout => target.timeout = le(payload),
                        _ => continue,
                    }
                    return true;
                }
                return false;
            }
        }
        true
    }
}

fn ipv4(payload: &[u8]) -> Ipv4Addr {
    let mut octets = [0u8; 4];
    let n = payload.len().min(4);
    octets[..n].copy_from_slice(&payload[..n]);
    Ipv4Addr::from(octets)
}

fn le(payload: &[u8]) -> u32 {
    payload
        .iter()
        .take(4)
        .rev()
        .fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

/// Emulated CH9121
///
/// Cloning gives another view of the same chip.
#[derive(Debug, Clone)]
pub struct DummyCh9121 {
    state: Rc<RefCell<ChipState>>,
}

impl DummyCh9121 {
    /// Create an emulated chip with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        Self {
            state: Rc::new(RefCell::new(ChipState {
                active: config,
                saved: config,
                pending: config,
                pin_low: false,
                active_low: true,
                rx: VecDeque::new(),
                frames: Vec::new(),
                pin_history: Vec::new(),
                resets: 0,
                silent: false,
                reject: None,
            })),
        }
    }

    /// Create an emulated chip with factory defaults
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Serial line handle
    pub fn transport(&self) -> DummyTransport {
        DummyTransport(self.clone())
    }

    /// CFG0 pin handle
    pub fn mode_pin(&self) -> DummyModePin {
        DummyModePin(self.clone())
    }

    /// Configuration the chip is currently running with
    pub fn active_config(&self) -> DummyConfig {
        self.state.borrow().active
    }

    /// Whether CFG0 currently selects configuration mode
    pub fn in_config_mode(&self) -> bool {
        self.state.borrow().in_config_mode()
    }

    /// Select configuration mode with a high CFG0 instead of low
    pub fn set_active_high(&self) {
        self.state.borrow_mut().active_low = false;
    }

    /// Stop answering any command
    pub fn set_silent(&self, silent: bool) {
        self.state.borrow_mut().silent = silent;
    }

    /// Answer `command` with a non-ACK status byte
    pub fn reject_command(&self, command: u8) {
        self.state.borrow_mut().reject = Some(command);
    }

    /// Put unsolicited bytes in the host receive buffer
    pub fn inject_rx(&self, bytes: &[u8]) {
        self.state.borrow_mut().rx.extend(bytes.iter().copied());
    }

    /// Every frame written by the host, in order
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.state.borrow().frames.clone()
    }

    /// Levels driven on CFG0 (`true` = high), in order
    pub fn pin_history(&self) -> Vec<bool> {
        self.state.borrow().pin_history.clone()
    }

    /// Number of execute-and-reset commands handled
    pub fn resets(&self) -> u32 {
        self.state.borrow().resets
    }
}

impl Default for DummyCh9121 {
    fn default() -> Self {
        Self::new_default()
    }
}

/// Serial line into a [`DummyCh9121`]
#[derive(Debug, Clone)]
pub struct DummyTransport(DummyCh9121);

impl Transport for DummyTransport {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.0.state.borrow_mut().handle_frame(data);
        Ok(())
    }

    fn bytes_available(&mut self) -> Result<usize> {
        Ok(self.0.state.borrow().rx.len())
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut state = self.0.state.borrow_mut();
        let n = buf.len().min(state.rx.len());
        for (slot, byte) in buf.iter_mut().zip(state.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

/// CFG0 pin of a [`DummyCh9121`]
#[derive(Debug, Clone)]
pub struct DummyModePin(DummyCh9121);

impl DummyModePin {
    fn set(&mut self, high: bool) {
        let mut state = self.0.state.borrow_mut();
        state.pin_low = !high;
        state.pin_history.push(high);
    }
}

impl ErrorType for DummyModePin {
    type Error = Infallible;
}

impl OutputPin for DummyModePin {
    fn set_low(&mut self) -> core::result::Result<(), Self::Error> {
        self.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> core::result::Result<(), Self::Error> {
        self.set(true);
        Ok(())
    }
}

/// Delay that returns immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {
        // No delay needed for in-memory operations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ch9121_core::{ConfigReader, ConfigWriter, Error, SessionConfig};

    fn reader(chip: &DummyCh9121) -> ConfigReader<DummyTransport, DummyModePin, NoDelay> {
        ConfigReader::new(
            chip.transport(),
            chip.mode_pin(),
            NoDelay,
            SessionConfig::default(),
        )
    }

    fn writer(chip: &DummyCh9121) -> ConfigWriter<DummyTransport, DummyModePin, NoDelay> {
        ConfigWriter::new(
            chip.transport(),
            chip.mode_pin(),
            NoDelay,
            SessionConfig::default(),
        )
    }

    #[test]
    fn test_summary_of_defaults() {
        let chip = DummyCh9121::new_default();
        let summary = reader(&chip).summary().unwrap();

        assert_eq!(summary.device.ip, Ipv4Addr::new(192, 168, 1, 200));
        assert_eq!(summary.device.mac.to_string(), "84:C2:E4:01:02:03");
        assert_eq!(summary.port1.device_port, 2000);
        assert_eq!(summary.port2.device_port, 3000);
        assert_eq!(summary.port1.baud_rate, 9600);
        assert_eq!(summary.port1.framing, UartFraming::new_8n1());

        assert!(!chip.in_config_mode());
        assert_eq!(chip.pin_history(), vec![false, true]);
    }

    #[test]
    fn test_requests_outside_config_mode_are_bridged() {
        let chip = DummyCh9121::new_default();
        let mut transport = chip.transport();
        transport.write(&[0x57, 0xAB, 0x61]).unwrap();
        assert_eq!(transport.bytes_available().unwrap(), 0);
    }

    #[test]
    fn test_stale_bytes_do_not_leak_into_response() {
        let chip = DummyCh9121::new_default();
        chip.inject_rx(b"hello");

        let mut reader = reader(&chip);
        reader.enter().unwrap();
        assert_eq!(
            reader.gateway_ip().unwrap(),
            Ipv4Addr::new(192, 168, 1, 1)
        );
        reader.exit().unwrap();
    }

    #[test]
    fn test_write_then_read_back() {
        let chip = DummyCh9121::new_default();

        let mut writer = writer(&chip);
        writer.enter().unwrap();
        writer.dhcp(true).unwrap();
        writer.gateway_ip(Ipv4Addr::new(10, 0, 0, 1)).unwrap();
        writer.subnet_mask(Ipv4Addr::new(255, 0, 0, 0)).unwrap();
        writer.tcp_client(Port::One).unwrap();
        writer.destination_ip(Port::One, Ipv4Addr::new(10, 0, 0, 51)).unwrap();
        writer.destination_port(Port::One, 6969).unwrap();
        writer.baud_rate(Port::Two, 115_200).unwrap();
        writer
            .uart_framing(
                Port::Two,
                UartFraming {
                    stop_bits: 2,
                    check: UartFraming::CHECK_EVEN,
                    data_bits: 7,
                },
            )
            .unwrap();
        writer.commit().unwrap();
        writer.exit().unwrap();

        assert_eq!(chip.resets(), 1);
        assert!(chip.active_config().dhcp);

        let summary = reader(&chip).summary().unwrap();
        assert_eq!(summary.device.gateway, Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(summary.device.subnet, Ipv4Addr::new(255, 0, 0, 0));
        assert_eq!(summary.port1.network_mode(), Some(NetworkMode::TcpClient));
        assert_eq!(summary.port1.destination_ip, Ipv4Addr::new(10, 0, 0, 51));
        assert_eq!(summary.port1.destination_port, 6969);
        assert_eq!(summary.port2.baud_rate, 115_200);
        assert_eq!(summary.port2.framing.check_label(), Some("even"));
        // Untouched settings survive
        assert_eq!(summary.device.ip, Ipv4Addr::new(192, 168, 1, 200));
    }

    #[test]
    fn test_port2_enable_leaves_mode_alone() {
        let chip = DummyCh9121::new_default();

        let mut writer = writer(&chip);
        writer.enter().unwrap();
        writer.port2_enabled(true).unwrap();
        writer.commit().unwrap();
        writer.exit().unwrap();

        let config = chip.active_config();
        assert!(config.port2_enabled);
        assert_eq!(config.port2.mode, NetworkMode::TcpServer.code());

        let summary = reader(&chip).summary().unwrap();
        assert_eq!(summary.port2.network_mode(), Some(NetworkMode::TcpServer));
    }

    #[test]
    fn test_uncommitted_writes_are_not_applied() {
        let chip = DummyCh9121::new_default();

        let mut writer = writer(&chip);
        writer.enter().unwrap();
        writer.device_ip(Ipv4Addr::new(10, 1, 1, 1)).unwrap();
        writer.exit().unwrap();

        assert_eq!(chip.active_config(), DummyConfig::default());
        assert_eq!(chip.resets(), 0);
    }

    #[test]
    fn test_rejected_write() {
        let chip = DummyCh9121::new_default();
        chip.reject_command(cmd::SET_PORT1_BAUD);

        let mut writer = writer(&chip);
        writer.enter().unwrap();
        writer.baud_rate(Port::One, 57_600).unwrap();
        assert_eq!(
            writer.commit(),
            Err(Error::Rejected {
                command: cmd::SET_PORT1_BAUD,
                status: 0x00
            })
        );
        writer.exit().unwrap();
        assert_eq!(chip.active_config().port1.baud_rate, 9600);
    }

    #[test]
    fn test_silent_chip_times_out() {
        let chip = DummyCh9121::new_default();
        chip.set_silent(true);

        let mut reader = reader(&chip);
        reader.enter().unwrap();
        assert_eq!(
            reader.device_ip(),
            Err(Error::ResponseTimeout {
                command: cmd::READ_DEVICE_IP
            })
        );

        // Leave still releases the pin
        reader.exit().unwrap();
        assert!(!chip.in_config_mode());
    }

    #[test]
    fn test_active_high_chip() {
        let chip = DummyCh9121::new_default();
        chip.set_active_high();

        let mut reader = ConfigReader::new(
            chip.transport(),
            chip.mode_pin(),
            NoDelay,
            SessionConfig::default().with_active_low(false),
        );
        reader.enter().unwrap();
        assert!(chip.in_config_mode());
        assert_eq!(reader.chip_version().unwrap(), 5);
        reader.exit().unwrap();
        assert!(!chip.in_config_mode());
    }
}
