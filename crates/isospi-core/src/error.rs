//! Error types for isospi-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate and by the transport crates at the trait boundary.

use core::fmt;

use crate::sequencer::Stage;

/// Details about a rejected request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentError {
    /// Board count is zero or above the supported chain length
    BoardCount {
        /// Requested board count
        count: usize,
    },
    /// SPI passthrough board count is above the supported chain length
    SpiBoards {
        /// Requested SPI board count
        count: usize,
    },
    /// More data words than fit in one main frame
    TooManyDataWords {
        /// Number of data words supplied
        count: usize,
    },
    /// Command code does not fit in 16 bits (PEC framing)
    CommandTooWide {
        /// Command value supplied
        value: u32,
    },
    /// Register payload does not fit in 48 bits (PEC framing)
    PayloadTooWide {
        /// Payload value supplied
        value: u64,
    },
}

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Request values are out of range; nothing was sent
    InvalidArguments(ArgumentError),
    /// The bus peripheral could not be initialized
    BusInitFailure,
    /// The SPI session could not be started
    BusSessionFailure,
    /// A configure, select or transfer call failed after the session began
    TransportFailure(Stage),
}

impl fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BoardCount { count } => write!(
                f,
                "board count {} out of range (1-{})",
                count,
                crate::request::MAX_BOARDS
            ),
            Self::SpiBoards { count } => write!(
                f,
                "SPI board count {} out of range (0-{})",
                count,
                crate::request::MAX_SPI_BOARDS
            ),
            Self::TooManyDataWords { count } => write!(
                f,
                "{} data words given, at most {} allowed",
                count,
                crate::request::MAX_DATA_WORDS
            ),
            Self::CommandTooWide { value } => {
                write!(f, "command 0x{:X} does not fit in 16 bits", value)
            }
            Self::PayloadTooWide { value } => {
                write!(f, "data word 0x{:X} does not fit in 48 bits", value)
            }
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArguments(reason) => write!(f, "invalid arguments: {}", reason),
            Self::BusInitFailure => write!(f, "INIT failed!"),
            Self::BusSessionFailure => write!(f, "SPI begin failed!"),
            Self::TransportFailure(stage) => write!(f, "SPI transfer failed during {}", stage),
        }
    }
}

impl From<ArgumentError> for Error {
    fn from(reason: ArgumentError) -> Self {
        Self::InvalidArguments(reason)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ArgumentError {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
