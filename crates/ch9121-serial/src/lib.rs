//! ch9121-serial - Host serial port backend
//!
//! This crate connects the CH9121 configuration core to a USB serial adapter
//! using the `serialport` crate. The chip's CFG0 pin is driven from the
//! adapter's RTS or DTR line, or (with the `linux-gpio` feature) from a
//! Linux GPIO line through gpiocdev.
//!
//! # Example
//!
//! ```no_run
//! use ch9121_core::{ConfigReader, SessionConfig};
//! use ch9121_serial::{open_link, parse_options};
//!
//! let options = parse_options(&[("dev", "/dev/ttyUSB0"), ("pin", "rts")])?;
//! let link = open_link(&options)?;
//! let config = SessionConfig::default().with_active_low(options.active_low);
//!
//! let mut reader = ConfigReader::new(link.transport, link.pin, link.delay, config);
//! println!("{}", reader.summary()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Wiring
//!
//! | CH9121 | Adapter | Description |
//! |--------|---------|-------------|
//! | RXD    | TXD     | Configuration UART (9600 8N1) |
//! | TXD    | RXD     | |
//! | CFG0   | RTS/DTR | Low = configuration mode |
//! | GND    | GND     | |

pub mod error;
pub mod pin;
pub mod transport;

use std::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

pub use error::{PinError, Result, SerialError};
pub use pin::{ModePin, PinSource};
pub use transport::{SerialTransport, DEFAULT_BAUD};

/// Delay backed by `std::thread::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns as u64));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms as u64));
    }
}

/// Options for opening a serial link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialOptions {
    /// Serial device path (e.g., "/dev/ttyUSB0" or "COM3")
    pub device: String,
    /// Baud rate (None for the chip's configuration default)
    pub baud: Option<u32>,
    /// Output wired to CFG0
    pub pin: PinSource,
    /// CFG0 selects configuration mode when low
    pub active_low: bool,
}

/// Everything a configuration session needs
pub struct SerialLink {
    /// Configuration UART
    pub transport: SerialTransport,
    /// CFG0 driver
    pub pin: ModePin,
    /// Sleep source
    pub delay: StdDelay,
}

/// Parse backend options
///
/// # Options
///
/// - `dev=/dev/ttyUSB0` - serial device (required)
/// - `baud=9600` - baud rate (optional, default 9600)
/// - `pin=rts|dtr|gpio` - CFG0 driver (optional, default rts)
/// - `gpiochip=0` or `gpiochip=/dev/gpiochip0` - GPIO chip (pin=gpio only)
/// - `line=14` - GPIO line offset (pin=gpio only)
/// - `active=low|high` - CFG0 level selecting configuration mode (default low)
pub fn parse_options(options: &[(&str, &str)]) -> Result<SerialOptions> {
    let mut device: Option<String> = None;
    let mut baud = None;
    let mut pin_kind = "rts";
    let mut gpiochip: Option<String> = None;
    let mut line: Option<u32> = None;
    let mut active_low = true;

    for (key, value) in options {
        match *key {
            "dev" => device = Some(value.to_string()),
            "baud" => {
                baud = Some(value.parse().map_err(|_| {
                    SerialError::InvalidParameter(format!("Invalid baud rate: {}", value))
                })?);
            }
            "pin" => pin_kind = *value,
            "gpiochip" => {
                let path = if value.chars().all(|c| c.is_ascii_digit()) {
                    format!("/dev/gpiochip{}", value)
                } else {
                    value.to_string()
                };
                gpiochip = Some(path);
            }
            "line" => {
                line = Some(value.parse().map_err(|_| {
                    SerialError::InvalidParameter(format!("Invalid line value: {}", value))
                })?);
            }
            "active" => {
                active_low = match *value {
                    "low" => true,
                    "high" => false,
                    _ => {
                        return Err(SerialError::InvalidParameter(format!(
                            "Invalid active level: {} (use low or high)",
                            value
                        )))
                    }
                };
            }
            _ => {
                log::warn!("serial: Ignoring unknown option: {}={}", key, value);
            }
        }
    }

    let device = device.ok_or(SerialError::MissingParameter("dev"))?;

    let pin = match pin_kind {
        "rts" => PinSource::Rts,
        "dtr" => PinSource::Dtr,
        "gpio" => PinSource::Gpio {
            chip: gpiochip.ok_or(SerialError::MissingParameter("gpiochip"))?,
            line: line.ok_or(SerialError::MissingParameter("line"))?,
        },
        other => {
            return Err(SerialError::InvalidParameter(format!(
                "Invalid pin: {} (use rts, dtr or gpio)",
                other
            )))
        }
    };

    Ok(SerialOptions {
        device,
        baud,
        pin,
        active_low,
    })
}

/// Open the serial port and the CFG0 driver
///
/// Opening a tty usually asserts RTS and DTR, so the pin is driven to its
/// idle level before the link is handed out.
pub fn open_link(options: &SerialOptions) -> Result<SerialLink> {
    let transport = SerialTransport::open(&options.device, options.baud)?;

    let mut pin = match &options.pin {
        PinSource::Rts => ModePin::Rts(transport.try_clone_port()?),
        PinSource::Dtr => ModePin::Dtr(transport.try_clone_port()?),
        #[cfg(feature = "linux-gpio")]
        PinSource::Gpio { chip, line } => ModePin::Gpio(pin::GpioLine::open(chip, *line)?),
        #[cfg(not(feature = "linux-gpio"))]
        PinSource::Gpio { .. } => return Err(SerialError::GpioUnsupported),
    };

    if options.active_low {
        pin.set_high()?;
    } else {
        pin.set_low()?;
    }

    Ok(SerialLink {
        transport,
        pin,
        delay: StdDelay,
    })
}
