//! Bus transport trait definitions

use alloc::boxed::Box;

use super::{BusConfig, ChipSelect};
use crate::error::Result;

/// SPI bus driver used by the transaction sequencer
///
/// The call order is fixed by [`crate::sequencer::run`]:
///
/// 1. `init` - acquire the peripheral
/// 2. `begin_session` - take over the SPI pins
/// 3. `configure` and `select_chip`
/// 4. any number of `transfer_byte`, `transfer_in_place` and `delay_ms`
/// 5. `end_session` then `close`
///
/// Transfers are full duplex: whatever the bus clocks in replaces the
/// bytes that were clocked out.
///
/// Implementations report failures with any core error; the sequencer maps
/// them to the error matching the stage that failed. Detailed causes should
/// be logged by the implementation.
pub trait BusTransport {
    /// Acquire the bus peripheral
    fn init(&mut self) -> Result<()>;

    /// Start an SPI session on the acquired peripheral
    fn begin_session(&mut self) -> Result<()>;

    /// Apply bit order, clock mode, clock speed and chip-select polarities
    fn configure(&mut self, config: &BusConfig) -> Result<()>;

    /// Route following transfers to the given chip-select line
    fn select_chip(&mut self, cs: ChipSelect) -> Result<()>;

    /// Clock out a single byte and return the byte clocked in
    fn transfer_byte(&mut self, byte: u8) -> Result<u8>;

    /// Clock out `buf` and overwrite it with the bytes clocked in
    fn transfer_in_place(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Delay for the specified number of milliseconds
    fn delay_ms(&mut self, ms: u32);

    /// End the SPI session and release the pins
    fn end_session(&mut self) -> Result<()>;

    /// Release the bus peripheral
    fn close(&mut self) -> Result<()>;
}

// Blanket impl for boxed transports so the CLI can pick one at runtime
impl BusTransport for Box<dyn BusTransport + Send> {
    fn init(&mut self) -> Result<()> {
        (**self).init()
    }

    fn begin_session(&mut self) -> Result<()> {
        (**self).begin_session()
    }

    fn configure(&mut self, config: &BusConfig) -> Result<()> {
        (**self).configure(config)
    }

    fn select_chip(&mut self, cs: ChipSelect) -> Result<()> {
        (**self).select_chip(cs)
    }

    fn transfer_byte(&mut self, byte: u8) -> Result<u8> {
        (**self).transfer_byte(byte)
    }

    fn transfer_in_place(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).transfer_in_place(buf)
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }

    fn end_session(&mut self) -> Result<()> {
        (**self).end_session()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}
