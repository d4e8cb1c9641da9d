//! isospi-core - Frame building and transaction sequencing for isoSPI chains
//!
//! This crate holds everything needed to talk to a daisy-chain of
//! isoSPI-connected battery-monitor boards except the bus driver itself:
//!
//! - [`request`] - the validated description of one transaction
//! - [`frame`] - big-endian packing of the command, data, execute and
//!   readback frames
//! - [`transport`] - the [`BusTransport`](transport::BusTransport) trait
//!   implemented by bus drivers, plus the fixed bus profile
//! - [`sequencer`] - the fixed init/wake-up/transfer/teardown sequence
//! - [`pec`], [`comm`], [`response`] - LTC6813/LTC3300 checksums, COMM
//!   register packing and response checking
//!
//! It is `no_std` but requires `alloc`, since frame sizes depend on the
//! request.
//!
//! # Features
//!
//! - `std` - Implement `std::error::Error` for [`Error`]
//!
//! # Example
//!
//! ```ignore
//! use isospi_core::{request::Request, sequencer, transport::ChipSelect};
//!
//! let request = Request::new(ChipSelect::Cs0, 0, 2, 0x0001_3d6e, vec![5]);
//! let outcome = sequencer::run(&mut bus, &request)?;
//! for byte in outcome.payload() {
//!     print!("{:02x}", byte);
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod comm;
pub mod error;
pub mod frame;
pub mod pec;
pub mod request;
pub mod response;
pub mod sequencer;
pub mod transport;

pub use error::{Error, Result};
