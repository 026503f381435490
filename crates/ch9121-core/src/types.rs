//! Decoded setting values

use core::fmt;

/// Ethernet MAC address as reported by the chip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// Raw octets in wire order
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            a, b, c, d, e, g
        )
    }
}

/// Serial line framing of one UART port
///
/// The three codes are kept exactly as the chip reports them. Use
/// [`UartFraming::check_label`] to name the check code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UartFraming {
    /// Stop bits (1 or 2)
    pub stop_bits: u8,
    /// Check (parity) code
    pub check: u8,
    /// Data bits (5 to 8)
    pub data_bits: u8,
}

impl UartFraming {
    /// Check code for even parity
    pub const CHECK_EVEN: u8 = 0x00;
    /// Check code for odd parity
    pub const CHECK_ODD: u8 = 0x01;
    /// Check code for mark parity
    pub const CHECK_MARK: u8 = 0x02;
    /// Check code for space parity
    pub const CHECK_SPACE: u8 = 0x03;
    /// Check code for no parity
    pub const CHECK_NONE: u8 = 0x04;

    /// 8 data bits, no parity, 1 stop bit (chip default)
    pub const fn new_8n1() -> Self {
        Self {
            stop_bits: 1,
            check: Self::CHECK_NONE,
            data_bits: 8,
        }
    }

    /// Human-readable name of the check code, if it is a known one
    pub fn check_label(&self) -> Option<&'static str> {
        match self.check {
            Self::CHECK_EVEN => Some("even"),
            Self::CHECK_ODD => Some("odd"),
            Self::CHECK_MARK => Some("mark"),
            Self::CHECK_SPACE => Some("space"),
            Self::CHECK_NONE => Some("none"),
            _ => None,
        }
    }

    /// Wire representation: stop, check, data
    pub fn to_bytes(&self) -> [u8; 3] {
        [self.stop_bits, self.check, self.data_bits]
    }
}

impl Default for UartFraming {
    fn default() -> Self {
        Self::new_8n1()
    }
}

impl fmt::Display for UartFraming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.stop_bits, self.check, self.data_bits)
    }
}

/// Network role of a UART port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkMode {
    /// Accept TCP connections on the device port
    TcpServer,
    /// Connect to the destination IP/port over TCP
    TcpClient,
    /// Listen for UDP datagrams on the device port
    UdpServer,
    /// Send UDP datagrams to the destination IP/port
    UdpClient,
}

impl NetworkMode {
    /// Map a raw mode code to a known mode
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0x00 => Some(Self::TcpServer),
            0x01 => Some(Self::TcpClient),
            0x02 => Some(Self::UdpServer),
            0x03 => Some(Self::UdpClient),
            _ => None,
        }
    }

    /// Raw mode code as stored by the chip
    pub fn code(self) -> u8 {
        match self {
            Self::TcpServer => 0x00,
            Self::TcpClient => 0x01,
            Self::UdpServer => 0x02,
            Self::UdpClient => 0x03,
        }
    }

    /// Short lowercase name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TcpServer => "tcp-server",
            Self::TcpClient => "tcp-client",
            Self::UdpServer => "udp-server",
            Self::UdpClient => "udp-client",
        }
    }
}

impl fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    #[test]
    fn test_mac_display_is_uppercase_and_padded() {
        let mac = MacAddress([0x00, 0x1A, 0x2B, 0x3C, 0x4D, 0x5E]);
        assert_eq!(mac.to_string(), "00:1A:2B:3C:4D:5E");

        let mac = MacAddress([0x0a, 0xbc, 0x01, 0xff, 0x00, 0x0f]);
        assert_eq!(mac.to_string(), "0A:BC:01:FF:00:0F");
    }

    #[test]
    fn test_framing_check_label() {
        assert_eq!(UartFraming::new_8n1().check_label(), Some("none"));

        let framing = UartFraming {
            stop_bits: 1,
            check: 0x01,
            data_bits: 7,
        };
        assert_eq!(framing.check_label(), Some("odd"));
        assert_eq!(framing.to_string(), "1,1,7");

        // Unknown codes are kept, just not named
        let framing = UartFraming {
            stop_bits: 1,
            check: 0x09,
            data_bits: 8,
        };
        assert_eq!(framing.check_label(), None);
        assert_eq!(framing.to_bytes(), [1, 9, 8]);
    }

    #[test]
    fn test_network_mode_codes() {
        for code in 0..4u32 {
            let mode = NetworkMode::from_code(code).unwrap();
            assert_eq!(mode.code() as u32, code);
        }
        assert_eq!(NetworkMode::from_code(4), None);
        assert_eq!(NetworkMode::TcpClient.to_string(), "tcp-client");
    }
}
