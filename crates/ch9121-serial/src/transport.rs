//! Serial port transport implementation

use std::io::{Read, Write};
use std::time::Duration;

use ch9121_core::{Error, Transport};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

use crate::error::{Result, SerialError};

/// Baud rate the CH9121 uses for its configuration interface
pub const DEFAULT_BAUD: u32 = 9600;

/// Serial port transport
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Open a serial port at the given baud rate (8N1, no flow control)
    pub fn open(device: &str, baud: Option<u32>) -> Result<Self> {
        let baud_rate = baud.unwrap_or(DEFAULT_BAUD);

        let port = serialport::new(device, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(100))
            .open()
            .map_err(|source| SerialError::OpenFailed {
                path: device.to_string(),
                source,
            })?;

        log::info!("Opened serial port {} at {} baud", device, baud_rate);

        Ok(Self { port })
    }

    /// Another handle on the same port, used to drive RTS/DTR
    pub fn try_clone_port(&self) -> Result<Box<dyn SerialPort>> {
        self.port.try_clone().map_err(SerialError::CloneFailed)
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, data: &[u8]) -> ch9121_core::Result<()> {
        self.port.write_all(data).map_err(|e| {
            log::error!("serial: Write failed: {}", e);
            Error::TransportUnavailable
        })?;
        self.port.flush().map_err(|e| {
            log::error!("serial: Flush failed: {}", e);
            Error::TransportUnavailable
        })
    }

    fn bytes_available(&mut self) -> ch9121_core::Result<usize> {
        self.port
            .bytes_to_read()
            .map(|n| n as usize)
            .map_err(|e| {
                log::error!("serial: Failed to query receive buffer: {}", e);
                Error::TransportUnavailable
            })
    }

    fn read_available(&mut self, buf: &mut [u8]) -> ch9121_core::Result<usize> {
        let available = self.bytes_available()?;
        let len = available.min(buf.len());
        if len == 0 {
            return Ok(0);
        }

        match self.port.read(&mut buf[..len]) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(e) => {
                log::error!("serial: Read failed: {}", e);
                Err(Error::TransportUnavailable)
            }
        }
    }
}
