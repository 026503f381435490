//! Error types for the serial backend

use thiserror::Error;

/// Serial backend errors
#[derive(Debug, Error)]
pub enum SerialError {
    /// Failed to open the serial port
    #[error("Failed to open serial port '{path}': {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: serialport::Error,
    },

    /// Failed to duplicate the port handle for the mode pin
    #[error("Failed to share serial port with mode pin: {0}")]
    CloneFailed(#[source] serialport::Error),

    /// Failed to request the GPIO line used as mode pin
    #[cfg(feature = "linux-gpio")]
    #[error("Failed to request GPIO line {line} on '{chip}': {source}")]
    LineRequestFailed {
        chip: String,
        line: u32,
        #[source]
        source: gpiocdev::Error,
    },

    /// Failed to put the mode pin in its idle level
    #[error("Failed to release mode pin: {0}")]
    ModePin(#[from] PinError),

    /// GPIO mode pin requested but support is not compiled in
    #[error("GPIO mode pin not supported (rebuild with the linux-gpio feature)")]
    GpioUnsupported,

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Missing required parameter
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
}

/// Result type for serial backend operations
pub type Result<T> = std::result::Result<T, SerialError>;

/// Failure to drive the mode pin
#[derive(Debug, Error)]
pub enum PinError {
    /// Setting the RTS/DTR control line failed
    #[error("Control line error: {0}")]
    ControlLine(#[from] serialport::Error),

    /// Setting the GPIO line failed
    #[cfg(feature = "linux-gpio")]
    #[error("GPIO error: {0}")]
    Gpio(#[from] gpiocdev::Error),
}

impl embedded_hal::digital::Error for PinError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}
