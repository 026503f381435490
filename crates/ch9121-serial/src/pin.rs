//! CFG0 mode pin drivers
//!
//! On a USB serial adapter the CFG0 line is usually wired to RTS or DTR.
//! Those outputs are inverted: asserting the control signal drives the
//! physical line low. [`ModePin`] hides that, so `set_low` always means a
//! low level on the wire.

use embedded_hal::digital::{ErrorType, OutputPin};
use serialport::SerialPort;

use crate::error::PinError;

/// Which output drives CFG0
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinSource {
    /// Serial adapter RTS line
    Rts,
    /// Serial adapter DTR line
    Dtr,
    /// Linux GPIO line
    Gpio {
        /// GPIO chip device path
        chip: String,
        /// Line offset on the chip
        line: u32,
    },
}

/// CFG0 mode pin
pub enum ModePin {
    /// Driven through the serial port's RTS line
    Rts(Box<dyn SerialPort>),
    /// Driven through the serial port's DTR line
    Dtr(Box<dyn SerialPort>),
    /// Driven through a Linux GPIO line
    #[cfg(feature = "linux-gpio")]
    Gpio(GpioLine),
}

impl ModePin {
    fn set_level(&mut self, high: bool) -> Result<(), PinError> {
        match self {
            // Asserted control signal = low line
            ModePin::Rts(port) => port.write_request_to_send(!high)?,
            ModePin::Dtr(port) => port.write_data_terminal_ready(!high)?,
            #[cfg(feature = "linux-gpio")]
            ModePin::Gpio(line) => line.set(high)?,
        }
        log::trace!("mode pin: {}", if high { "high" } else { "low" });
        Ok(())
    }
}

impl ErrorType for ModePin {
    type Error = PinError;
}

impl OutputPin for ModePin {
    fn set_low(&mut self) -> Result<(), PinError> {
        self.set_level(false)
    }

    fn set_high(&mut self) -> Result<(), PinError> {
        self.set_level(true)
    }
}

#[cfg(feature = "linux-gpio")]
pub use gpio::GpioLine;

#[cfg(feature = "linux-gpio")]
mod gpio {
    //! gpiocdev-backed output line

    use gpiocdev::line::{Offset, Value};
    use gpiocdev::request::{Config, Request};

    use crate::error::{Result, SerialError};

    /// A single requested GPIO output line
    pub struct GpioLine {
        request: Request,
        offset: Offset,
    }

    impl GpioLine {
        /// Request `line` on `chip` as an output, initially high (idle)
        pub fn open(chip: &str, line: Offset) -> Result<Self> {
            let mut config = Config::default();
            config.with_line(line).as_output(Value::Active);

            let request = Request::from_config(config)
                .on_chip(chip)
                .with_consumer("ch9121")
                .request()
                .map_err(|source| SerialError::LineRequestFailed {
                    chip: chip.to_string(),
                    line,
                    source,
                })?;

            log::info!("Requested GPIO line {} on {} for CFG0", line, chip);

            Ok(Self {
                request,
                offset: line,
            })
        }

        pub(crate) fn set(&mut self, high: bool) -> std::result::Result<(), gpiocdev::Error> {
            let value = if high { Value::Active } else { Value::Inactive };
            self.request.set_value(self.offset, value).map(|_| ())
        }
    }
}
