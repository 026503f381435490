//! Per-port register tables
//!
//! Both UART ports expose the same set of settings, but at addresses that
//! do not share a common offset. Each port is described by one table and
//! every per-port accessor goes through it.

use core::fmt;

use crate::protocol::cmd;

/// One of the chip's two serial-to-network channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Port {
    /// UART 1
    One,
    /// UART 2
    Two,
}

impl Port {
    /// Both ports, in report order
    pub const ALL: [Port; 2] = [Port::One, Port::Two];

    /// Map a 1-based port number
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Port::One),
            2 => Some(Port::Two),
            _ => None,
        }
    }

    /// 1-based port number
    pub fn number(self) -> u8 {
        match self {
            Port::One => 1,
            Port::Two => 2,
        }
    }

    /// Read command table for this port
    pub fn registers(self) -> &'static PortRegisters {
        match self {
            Port::One => &PORT1_REGISTERS,
            Port::Two => &PORT2_REGISTERS,
        }
    }

    /// Write command table for this port
    pub fn write_registers(self) -> &'static PortWriteRegisters {
        match self {
            Port::One => &PORT1_WRITE_REGISTERS,
            Port::Two => &PORT2_WRITE_REGISTERS,
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UART {}", self.number())
    }
}

/// Read commands for one port's settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRegisters {
    /// Network mode (1 byte)
    pub mode: u8,
    /// Local port number (2 bytes LE)
    pub device_port: u8,
    /// Destination IP (4 bytes)
    pub destination_ip: u8,
    /// Destination port number (2 bytes LE)
    pub destination_port: u8,
    /// Baud rate (LE)
    pub baud_rate: u8,
    /// Stop/check/data bits (3 bytes)
    pub framing: u8,
    /// Serial timeout (LE)
    pub timeout: u8,
}

/// Write commands for one port's settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortWriteRegisters {
    /// Network mode
    pub mode: u8,
    /// Local port number
    pub device_port: u8,
    /// Destination IP
    pub destination_ip: u8,
    /// Destination port number
    pub destination_port: u8,
    /// Baud rate
    pub baud_rate: u8,
    /// Stop/check/data bits
    pub framing: u8,
    /// Serial timeout
    pub timeout: u8,
}

/// UART 1 read commands
pub const PORT1_REGISTERS: PortRegisters = PortRegisters {
    mode: cmd::READ_PORT1_MODE,
    device_port: cmd::READ_PORT1_DEVICE_PORT,
    destination_ip: cmd::READ_PORT1_DEST_IP,
    destination_port: cmd::READ_PORT1_DEST_PORT,
    baud_rate: cmd::READ_PORT1_BAUD,
    framing: cmd::READ_PORT1_FRAMING,
    timeout: cmd::READ_PORT1_TIMEOUT,
};

/// UART 2 read commands
pub const PORT2_REGISTERS: PortRegisters = PortRegisters {
    mode: cmd::READ_PORT2_MODE,
    device_port: cmd::READ_PORT2_DEVICE_PORT,
    destination_ip: cmd::READ_PORT2_DEST_IP,
    destination_port: cmd::READ_PORT2_DEST_PORT,
    baud_rate: cmd::READ_PORT2_BAUD,
    framing: cmd::READ_PORT2_FRAMING,
    timeout: cmd::READ_PORT2_TIMEOUT,
};

/// UART 1 write commands
pub const PORT1_WRITE_REGISTERS: PortWriteRegisters = PortWriteRegisters {
    mode: cmd::SET_PORT1_MODE,
    device_port: cmd::SET_PORT1_DEVICE_PORT,
    destination_ip: cmd::SET_PORT1_DEST_IP,
    destination_port: cmd::SET_PORT1_DEST_PORT,
    baud_rate: cmd::SET_PORT1_BAUD,
    framing: cmd::SET_PORT1_FRAMING,
    timeout: cmd::SET_PORT1_TIMEOUT,
};

/// UART 2 write commands
pub const PORT2_WRITE_REGISTERS: PortWriteRegisters = PortWriteRegisters {
    mode: cmd::SET_PORT2_MODE,
    device_port: cmd::SET_PORT2_DEVICE_PORT,
    destination_ip: cmd::SET_PORT2_DEST_IP,
    destination_port: cmd::SET_PORT2_DEST_PORT,
    baud_rate: cmd::SET_PORT2_BAUD,
    framing: cmd::SET_PORT2_FRAMING,
    timeout: cmd::SET_PORT2_TIMEOUT,
};
