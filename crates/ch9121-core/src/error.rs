//! Error types for ch9121-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Response errors
    /// Response payload is shorter (or longer) than the decode rule allows
    MalformedResponse {
        /// Number of bytes the decode rule needs
        expected: usize,
        /// Number of bytes actually received
        actual: usize,
    },
    /// No response arrived within the configured bound
    ResponseTimeout {
        /// Command that was left unanswered
        command: u8,
    },
    /// The chip refused a write request
    Rejected {
        /// Command that was refused
        command: u8,
        /// Status byte returned instead of the acknowledgement
        status: u8,
    },

    // Transport errors
    /// The serial channel could not be read or written
    TransportUnavailable,
    /// The configuration-mode pin could not be driven
    ModePin,

    // Session errors
    /// A request was issued outside of configuration mode
    NotConfiguring,
    /// `enter()` was called on a session that is already configuring
    AlreadyConfiguring,
    /// No room left to stage another write
    StagingFull,
    /// Write payload does not fit in a request frame
    PayloadTooLong,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedResponse { expected, actual } => write!(
                f,
                "malformed response: expected {} bytes, got {}",
                expected, actual
            ),
            Self::ResponseTimeout { command } => {
                write!(f, "no response to command 0x{:02X}", command)
            }
            Self::Rejected { command, status } => write!(
                f,
                "command 0x{:02X} rejected with status 0x{:02X}",
                command, status
            ),
            Self::TransportUnavailable => write!(f, "serial transport unavailable"),
            Self::ModePin => write!(f, "failed to drive configuration-mode pin"),
            Self::NotConfiguring => write!(f, "session is not in configuration mode"),
            Self::AlreadyConfiguring => write!(f, "session is already in configuration mode"),
            Self::StagingFull => write!(f, "too many staged writes"),
            Self::PayloadTooLong => write!(f, "write payload too long"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
