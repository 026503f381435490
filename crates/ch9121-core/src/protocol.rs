//! CH9121 configuration protocol constants and codec
//!
//! Every request starts with the two-byte preamble `0x57 0xAB` followed by a
//! single command byte. Read requests stop there; write requests append the
//! new value. Responses carry no header, length or command echo: the caller
//! picks the decode rule from the command it sent.

use core::net::Ipv4Addr;

use crate::error::{Error, Result};
use crate::types::{MacAddress, UartFraming};

/// Request preamble
pub const PREAMBLE: [u8; 2] = [0x57, 0xAB];

/// Acknowledgement byte returned for an accepted write
pub const ACK: u8 = 0xAA;

/// Largest write payload (u32 values)
pub const MAX_PAYLOAD_LEN: usize = 4;

/// Request frame capacity: preamble + command + payload
pub const MAX_FRAME_LEN: usize = PREAMBLE.len() + 1 + MAX_PAYLOAD_LEN;

/// Response buffer capacity
pub const MAX_RESPONSE_LEN: usize = 32;

/// Reply length of an IPv4 register
pub const IPV4_LEN: usize = 4;

/// Reply length of the MAC register
pub const MAC_LEN: usize = 6;

/// Reply length of a framing register
pub const FRAMING_LEN: usize = 3;

/// Shortest integer reply; also the length of an acknowledgement
pub const MIN_UINT_LEN: usize = 1;

/// An encoded request frame
pub type Frame = heapless::Vec<u8, MAX_FRAME_LEN>;

/// Raw response bytes
pub type Response = heapless::Vec<u8, MAX_RESPONSE_LEN>;

/// Command bytes
pub mod cmd {
    // Chip control
    /// Read chip version (1 byte)
    pub const READ_CHIP_VERSION: u8 = 0x01;
    /// Save staged parameters to EEPROM
    pub const SAVE_PARAMETERS: u8 = 0x0D;
    /// Apply saved parameters and reset the chip
    pub const EXECUTE_AND_RESET: u8 = 0x0E;
    /// Leave serial configuration mode (only honoured on the negotiating side)
    pub const LEAVE_CONFIG_MODE: u8 = 0x5E;

    // Device network, read
    /// Read device IP (4 bytes)
    pub const READ_DEVICE_IP: u8 = 0x61;
    /// Read subnet mask (4 bytes)
    pub const READ_SUBNET_MASK: u8 = 0x62;
    /// Read gateway IP (4 bytes)
    pub const READ_GATEWAY_IP: u8 = 0x63;
    /// Read device MAC (6 bytes)
    pub const READ_DEVICE_MAC: u8 = 0x81;

    // Port 1, read
    /// Read port 1 network mode (1 byte)
    pub const READ_PORT1_MODE: u8 = 0x60;
    /// Read port 1 device port (2 bytes LE)
    pub const READ_PORT1_DEVICE_PORT: u8 = 0x64;
    /// Read port 1 destination IP (4 bytes)
    pub const READ_PORT1_DEST_IP: u8 = 0x65;
    /// Read port 1 destination port (2 bytes LE)
    pub const READ_PORT1_DEST_PORT: u8 = 0x66;
    /// Read port 1 baud rate (LE)
    pub const READ_PORT1_BAUD: u8 = 0x71;
    /// Read port 1 stop/check/data bits (3 bytes)
    pub const READ_PORT1_FRAMING: u8 = 0x72;
    /// Read port 1 serial timeout (LE, units of 5 ms)
    pub const READ_PORT1_TIMEOUT: u8 = 0x73;

    // Port 2, read
    /// Read port 2 enable / network mode (1 byte)
    pub const READ_PORT2_MODE: u8 = 0x90;
    /// Read port 2 device port (2 bytes LE)
    pub const READ_PORT2_DEVICE_PORT: u8 = 0x91;
    /// Read port 2 destination IP (4 bytes)
    pub const READ_PORT2_DEST_IP: u8 = 0x92;
    /// Read port 2 destination port (2 bytes LE)
    pub const READ_PORT2_DEST_PORT: u8 = 0x93;
    /// Read port 2 baud rate (LE)
    pub const READ_PORT2_BAUD: u8 = 0x94;
    /// Read port 2 stop/check/data bits (3 bytes)
    pub const READ_PORT2_FRAMING: u8 = 0x95;
    /// Read port 2 serial timeout (LE, units of 5 ms)
    pub const READ_PORT2_TIMEOUT: u8 = 0x96;

    // Device network, write
    /// Set device IP
    pub const SET_DEVICE_IP: u8 = 0x11;
    /// Set subnet mask
    pub const SET_SUBNET_MASK: u8 = 0x12;
    /// Set gateway IP
    pub const SET_GATEWAY_IP: u8 = 0x13;
    /// Enable (1) or disable (0) DHCP
    pub const SET_DHCP: u8 = 0x33;
    /// Enable (1) or disable (0) port 2
    pub const SET_PORT2_ENABLE: u8 = 0x39;

    // Port 1, write
    /// Set port 1 network mode
    pub const SET_PORT1_MODE: u8 = 0x10;
    /// Set port 1 device port
    pub const SET_PORT1_DEVICE_PORT: u8 = 0x14;
    /// Set port 1 destination IP
    pub const SET_PORT1_DEST_IP: u8 = 0x15;
    /// Set port 1 destination port
    pub const SET_PORT1_DEST_PORT: u8 = 0x16;
    /// Set port 1 baud rate
    pub const SET_PORT1_BAUD: u8 = 0x21;
    /// Set port 1 stop/check/data bits
    pub const SET_PORT1_FRAMING: u8 = 0x22;
    /// Set port 1 serial timeout
    pub const SET_PORT1_TIMEOUT: u8 = 0x23;

    // Port 2, write
    /// Set port 2 network mode
    pub const SET_PORT2_MODE: u8 = 0x40;
    /// Set port 2 device port
    pub const SET_PORT2_DEVICE_PORT: u8 = 0x41;
    /// Set port 2 destination IP
    pub const SET_PORT2_DEST_IP: u8 = 0x42;
    /// Set port 2 destination port
    pub const SET_PORT2_DEST_PORT: u8 = 0x43;
    /// Set port 2 baud rate
    pub const SET_PORT2_BAUD: u8 = 0x44;
    /// Set port 2 stop/check/data bits
    pub const SET_PORT2_FRAMING: u8 = 0x45;
    /// Set port 2 serial timeout
    pub const SET_PORT2_TIMEOUT: u8 = 0x46;
}

/// Every read command the driver issues
pub const READ_COMMANDS: &[u8] = &[
    cmd::READ_CHIP_VERSION,
    cmd::LEAVE_CONFIG_MODE,
    cmd::READ_PORT1_MODE,
    cmd::READ_DEVICE_IP,
    cmd::READ_SUBNET_MASK,
    cmd::READ_GATEWAY_IP,
    cmd::READ_PORT1_DEVICE_PORT,
    cmd::READ_PORT1_DEST_IP,
    cmd::READ_PORT1_DEST_PORT,
    cmd::READ_PORT1_BAUD,
    cmd::READ_PORT1_FRAMING,
    cmd::READ_PORT1_TIMEOUT,
    cmd::READ_DEVICE_MAC,
    cmd::READ_PORT2_MODE,
    cmd::READ_PORT2_DEVICE_PORT,
    cmd::READ_PORT2_DEST_IP,
    cmd::READ_PORT2_DEST_PORT,
    cmd::READ_PORT2_BAUD,
    cmd::READ_PORT2_FRAMING,
    cmd::READ_PORT2_TIMEOUT,
];

/// Build a read request frame
///
/// The command is not validated; the chip decides what it understands.
pub fn encode_request(command: u8) -> [u8; 3] {
    [PREAMBLE[0], PREAMBLE[1], command]
}

/// Build a write request frame: preamble, command, payload
pub fn encode_write(command: u8, payload: &[u8]) -> Result<Frame> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(Error::PayloadTooLong);
    }

    let mut frame = Frame::new();
    frame
        .extend_from_slice(&encode_request(command))
        .map_err(|()| Error::PayloadTooLong)?;
    frame
        .extend_from_slice(payload)
        .map_err(|()| Error::PayloadTooLong)?;
    Ok(frame)
}

fn require(payload: &[u8], expected: usize) -> Result<()> {
    if payload.len() < expected {
        return Err(Error::MalformedResponse {
            expected,
            actual: payload.len(),
        });
    }
    Ok(())
}

/// Decode an IPv4 address (first 4 bytes, wire order)
pub fn decode_ipv4(payload: &[u8]) -> Result<Ipv4Addr> {
    require(payload, IPV4_LEN)?;
    Ok(Ipv4Addr::new(payload[0], payload[1], payload[2], payload[3]))
}

/// Decode a MAC address (first 6 bytes, wire order)
pub fn decode_mac(payload: &[u8]) -> Result<MacAddress> {
    require(payload, MAC_LEN)?;
    let mut octets = [0u8; MAC_LEN];
    octets.copy_from_slice(&payload[..MAC_LEN]);
    Ok(MacAddress(octets))
}

/// Decode a little-endian unsigned integer spanning the whole payload
pub fn decode_uint(payload: &[u8]) -> Result<u32> {
    if payload.is_empty() || payload.len() > 4 {
        return Err(Error::MalformedResponse {
            expected: if payload.is_empty() { 1 } else { 4 },
            actual: payload.len(),
        });
    }

    Ok(payload
        .iter()
        .rev()
        .fold(0u32, |acc, &b| (acc << 8) | b as u32))
}

/// Decode a stop/check/data triple (first 3 bytes)
///
/// Codes are passed through unchecked.
pub fn decode_uart_framing(payload: &[u8]) -> Result<UartFraming> {
    require(payload, FRAMING_LEN)?;
    Ok(UartFraming {
        stop_bits: payload[0],
        check: payload[1],
        data_bits: payload[2],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    #[test]
    fn test_encode_request_preamble() {
        for &c in READ_COMMANDS {
            assert_eq!(encode_request(c), [0x57, 0xAB, c]);
        }

        // Unknown commands are encoded as-is
        assert_eq!(encode_request(0xFF), [0x57, 0xAB, 0xFF]);
    }

    #[test]
    fn test_encode_write() {
        let frame = encode_write(cmd::SET_GATEWAY_IP, &[192, 168, 1, 1]).unwrap();
        assert_eq!(&frame[..], &[0x57, 0xAB, 0x13, 192, 168, 1, 1]);

        let frame = encode_write(cmd::SAVE_PARAMETERS, &[]).unwrap();
        assert_eq!(&frame[..], &[0x57, 0xAB, 0x0D]);

        assert_eq!(
            encode_write(cmd::SET_PORT1_BAUD, &[0; 5]),
            Err(Error::PayloadTooLong)
        );
    }

    #[test]
    fn test_decode_ipv4() {
        let ip = decode_ipv4(&[192, 168, 1, 51]).unwrap();
        assert_eq!(ip.to_string(), "192.168.1.51");

        // Trailing bytes are ignored
        let ip = decode_ipv4(&[10, 0, 0, 5, 0xEE]).unwrap();
        assert_eq!(ip, Ipv4Addr::new(10, 0, 0, 5));

        let ip = decode_ipv4(&[255, 255, 255, 0]).unwrap();
        assert_eq!(ip.to_string(), "255.255.255.0");
    }

    #[test]
    fn test_decode_ipv4_every_octet_value() {
        for value in 0..=255u8 {
            let other = value.wrapping_mul(37).wrapping_add(11);
            let patterns = [
                [value, other, other, other],
                [other, value, other, other],
                [other, other, value, other],
                [other, other, other, value],
            ];
            for octets in patterns {
                assert_eq!(
                    decode_ipv4(&octets),
                    Ok(Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3]))
                );
            }
        }
    }

    #[test]
    fn test_decode_ipv4_short() {
        assert_eq!(
            decode_ipv4(&[1, 2, 3]),
            Err(Error::MalformedResponse {
                expected: 4,
                actual: 3
            })
        );
        assert!(decode_ipv4(&[]).is_err());
    }

    #[test]
    fn test_decode_mac() {
        let mac = decode_mac(&[0x00, 0x1A, 0x2B, 0x3C, 0x4D, 0x5E]).unwrap();
        assert_eq!(mac.to_string(), "00:1A:2B:3C:4D:5E");

        assert_eq!(
            decode_mac(&[0x00, 0x1A, 0x2B, 0x3C, 0x4D]),
            Err(Error::MalformedResponse {
                expected: 6,
                actual: 5
            })
        );
    }

    #[test]
    fn test_decode_uint() {
        assert_eq!(decode_uint(&[0x01, 0x00]), Ok(1));
        assert_eq!(decode_uint(&[0xFF, 0xFF]), Ok(65535));
        assert_eq!(decode_uint(&[0x03]), Ok(3));
        // 115200 baud
        assert_eq!(decode_uint(&[0x00, 0xC2, 0x01, 0x00]), Ok(115_200));
    }

    #[test]
    fn test_decode_uint_bad_length() {
        assert_eq!(
            decode_uint(&[]),
            Err(Error::MalformedResponse {
                expected: 1,
                actual: 0
            })
        );
        assert!(decode_uint(&[0; 5]).is_err());
    }

    #[test]
    fn test_decode_uart_framing() {
        let framing = decode_uart_framing(&[0x01, 0x04, 0x08]).unwrap();
        assert_eq!(framing, UartFraming::new_8n1());

        // Out-of-range check code is passed through
        let framing = decode_uart_framing(&[0x02, 0x07, 0x05]).unwrap();
        assert_eq!(framing.check, 0x07);

        assert!(decode_uart_framing(&[0x01, 0x04]).is_err());
    }
}
