//! isospi-linux-spi - Linux spidev bus
//!
//! This crate drives an isoSPI transceiver (LTC6820 or similar) hanging off
//! a Linux SPI controller through the `/dev/spidevB.C` device interface.
//!
//! # Overview
//!
//! The Linux SPI driver exposes each chip-select line of a controller as its
//! own character device, `/dev/spidevB.C`, where B is the controller number
//! and C the chip select. The bus opens CS0 when the session starts and moves
//! to CS1 when the transaction selects it.
//!
//! # Example
//!
//! ```no_run
//! use isospi_core::request::Request;
//! use isospi_core::sequencer;
//! use isospi_core::transport::ChipSelect;
//! use isospi_linux_spi::{LinuxSpi, LinuxSpiConfig};
//!
//! let mut bus = LinuxSpi::new(LinuxSpiConfig::new(0));
//! let request = Request::new(ChipSelect::Cs0, 0, 1, 0x0002, vec![]);
//! let outcome = sequencer::run(&mut bus, &request)?;
//! println!("{:02x?}", outcome.payload());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Usage with isospi CLI
//!
//! ```bash
//! # Default controller (/dev/spidev0.0 and /dev/spidev0.1)
//! isospi 0 0 1 2
//!
//! # Second controller
//! isospi -p linux_spi:bus=1 1 0 4 2
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel with spidev support enabled (`CONFIG_SPI_SPIDEV`)
//! - Read/write access to `/dev/spidevB.C`
//! - On a Raspberry Pi, `dtparam=spi=on` in `config.txt`

pub mod device;
pub mod error;

// Re-exports
pub use device::{parse_options, LinuxSpi, LinuxSpiConfig, SpiModeFlags};
pub use error::{LinuxSpiError, Result};

use isospi_core::transport::BusTransport;

/// Create a Linux SPI bus and return it boxed for the CLI transport dispatch
///
/// The device is not touched until the sequencer calls `init`.
///
/// # Example Options
///
/// - `bus=1` - Optional: controller number (default: 0)
/// - `dev=/dev/spidev` - Optional: device node prefix
pub fn open_linux_spi(
    options: &[(&str, &str)],
) -> std::result::Result<Box<dyn BusTransport + Send>, Box<dyn std::error::Error>> {
    let config = parse_options(options)?;
    log::info!(
        "linux_spi: Using {} and {}",
        config.device_path(isospi_core::transport::ChipSelect::Cs0),
        config.device_path(isospi_core::transport::ChipSelect::Cs1)
    );
    Ok(Box::new(LinuxSpi::new(config)))
}
