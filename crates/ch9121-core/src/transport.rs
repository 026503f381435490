//! Transport layer abstraction for the configuration serial line
//!
//! The core never opens a serial port itself. Backends implement
//! [`Transport`] over whatever the host offers (a `serialport` handle, a
//! HAL UART, an in-memory emulator).

use crate::error::Result;

/// Byte channel to the chip's configuration UART
pub trait Transport {
    /// Send bytes on the serial line
    ///
    /// Either the whole buffer is transmitted or an error is returned.
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Number of received bytes waiting to be read (non-blocking)
    fn bytes_available(&mut self) -> Result<usize>;

    /// Read whatever is currently buffered, up to `buf.len()` bytes
    ///
    /// Never blocks. Returns the number of bytes copied into `buf`, which
    /// may be zero.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        T::write(self, data)
    }

    fn bytes_available(&mut self) -> Result<usize> {
        T::bytes_available(self)
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        T::read_available(self, buf)
    }
}
