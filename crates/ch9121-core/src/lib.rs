//! ch9121-core - CH9121 configuration protocol core
//!
//! The CH9121 is a UART-to-Ethernet bridge. While its CFG0 pin is held in
//! configuration mode it stops bridging and instead answers register
//! commands on the serial line. This crate implements that exchange:
//!
//! - [`protocol`] - request framing, register table and response decoding
//! - [`session`] - the configuration-mode pin lifecycle and the
//!   request/response round trip
//! - [`reader`] - one accessor per readable setting, plus a full [`Summary`]
//! - [`writer`] - staged setting writes applied by a single commit
//!
//! The crate is `no_std`. The serial line is supplied through the
//! [`Transport`] trait, the mode pin through `embedded_hal`'s `OutputPin`
//! and all waits through `embedded_hal`'s `DelayNs`.
//!
//! # Features
//!
//! - `std` - implement `std::error::Error` for [`Error`]
//!
//! # Example
//!
//! ```ignore
//! use ch9121_core::{ConfigReader, Port, SessionConfig};
//!
//! let mut reader = ConfigReader::new(transport, cfg_pin, delay, SessionConfig::default());
//! reader.enter()?;
//! println!("IP: {}", reader.device_ip()?);
//! println!("UART 1 baud: {}", reader.baud_rate(Port::One)?);
//! reader.exit()?;
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod error;
pub mod port;
pub mod protocol;
pub mod reader;
pub mod session;
pub mod summary;
pub mod transport;
pub mod types;
pub mod writer;

#[cfg(test)]
pub(crate) mod mock;

pub use error::{Error, Result};
pub use port::{Port, PortRegisters, PortWriteRegisters};
pub use reader::ConfigReader;
pub use session::{ConfigSession, SessionConfig, SessionState};
pub use summary::{DeviceNetwork, PortSettings, Summary};
pub use transport::Transport;
pub use types::{MacAddress, NetworkMode, UartFraming};
pub use writer::{ConfigWriter, StagedWrite};
