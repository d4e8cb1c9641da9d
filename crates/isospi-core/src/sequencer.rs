//! Transaction sequencer
//!
//! Runs one isoSPI transaction against a [`BusTransport`]:
//!
//! ```text
//! Init -> Begun -> Configured -> Woken -> MainSent -> [Passthrough] -> Teardown -> Done
//! ```
//!
//! Frames are built (and the request validated) before the bus is touched.
//! Once `init` succeeds the peripheral is owned by a guard that ends the
//! session and closes the handle when it goes out of scope, so every exit
//! path after acquisition releases the bus.

use alloc::vec::Vec;
use core::fmt;

use crate::error::{Error, Result};
use crate::frame::{Frames, COMMAND_LEN, HEADER_LEN};
use crate::request::Request;
use crate::transport::{BusConfig, BusTransport};

/// Delay after each wake-up pulse
pub const WAKE_UP_DELAY_MS: u32 = 1;

/// Byte clocked out as a wake-up pulse
pub const WAKE_UP_BYTE: u8 = 0x00;

/// Transaction stages, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Acquiring the peripheral
    Init,
    /// SPI session started
    Begun,
    /// Bus profile applied and chip selected
    Configured,
    /// Wake-up pulses sent
    Woken,
    /// Main frame transferred
    MainSent,
    /// Execute and readback frames transferred
    Passthrough,
    /// Session ended, peripheral released
    Teardown,
    /// Transaction complete
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Begun => "session begin",
            Self::Configured => "configuration",
            Self::Woken => "wake-up",
            Self::MainSent => "main frame transfer",
            Self::Passthrough => "passthrough execute/readback",
            Self::Teardown => "teardown",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// What came back from the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Main frame as clocked in during the main transfer
    pub main: Vec<u8>,
    /// Readback frame as clocked in, if the passthrough cycle ran
    pub readback: Option<Vec<u8>>,
}

impl Outcome {
    /// Bytes reported to the user
    ///
    /// The readback body when the passthrough cycle ran, otherwise the main
    /// frame without its command bytes.
    pub fn payload(&self) -> &[u8] {
        match &self.readback {
            Some(readback) => &readback[HEADER_LEN..],
            None => &self.main[COMMAND_LEN..],
        }
    }
}

/// Owns an initialized peripheral until dropped
struct BusGuard<'a, T: BusTransport + ?Sized> {
    bus: &'a mut T,
    in_session: bool,
}

impl<'a, T: BusTransport + ?Sized> BusGuard<'a, T> {
    fn init(bus: &'a mut T) -> Result<Self> {
        bus.init().map_err(|_| Error::BusInitFailure)?;
        log::debug!("sequencer: {}", Stage::Init);
        Ok(Self {
            bus,
            in_session: false,
        })
    }

    fn begin_session(&mut self) -> Result<()> {
        self.bus
            .begin_session()
            .map_err(|_| Error::BusSessionFailure)?;
        self.in_session = true;
        log::debug!("sequencer: {}", Stage::Begun);
        Ok(())
    }
}

impl<T: BusTransport + ?Sized> Drop for BusGuard<'_, T> {
    fn drop(&mut self) {
        if self.in_session {
            if let Err(e) = self.bus.end_session() {
                log::warn!("sequencer: failed to end SPI session: {}", e);
            }
            self.in_session = false;
        }
        if let Err(e) = self.bus.close() {
            log::warn!("sequencer: failed to close bus: {}", e);
        }
        log::debug!("sequencer: {}", Stage::Teardown);
    }
}

/// Run one transaction
///
/// Returns [`Error::InvalidArguments`] without touching the bus if the
/// request is out of range, [`Error::BusInitFailure`] or
/// [`Error::BusSessionFailure`] if the bus cannot be brought up, and
/// [`Error::TransportFailure`] if a later call fails.
pub fn run<T: BusTransport + ?Sized>(bus: &mut T, request: &Request) -> Result<Outcome> {
    let Frames {
        mut main,
        mut execute,
        mut readback,
    } = Frames::build(request)?;

    let mut guard = BusGuard::init(bus)?;
    guard.begin_session()?;

    let config = BusConfig::ISOSPI;
    guard
        .bus
        .configure(&config)
        .map_err(|_| Error::TransportFailure(Stage::Configured))?;
    guard
        .bus
        .select_chip(request.chip_select)
        .map_err(|_| Error::TransportFailure(Stage::Configured))?;
    log::debug!(
        "sequencer: {} ({} Hz, {})",
        Stage::Configured,
        config.speed_hz(),
        request.chip_select
    );

    for _ in 0..request.board_count {
        guard
            .bus
            .transfer_byte(WAKE_UP_BYTE)
            .map_err(|_| Error::TransportFailure(Stage::Woken))?;
        guard.bus.delay_ms(WAKE_UP_DELAY_MS);
    }
    log::debug!(
        "sequencer: {} ({} boards)",
        Stage::Woken,
        request.board_count
    );

    log::trace!("sequencer: main frame out {:02x?}", main);
    guard
        .bus
        .transfer_in_place(&mut main)
        .map_err(|_| Error::TransportFailure(Stage::MainSent))?;
    log::debug!("sequencer: {} ({} bytes)", Stage::MainSent, main.len());

    let readback = if request.passthrough_enabled {
        guard
            .bus
            .transfer_in_place(&mut execute)
            .map_err(|_| Error::TransportFailure(Stage::Passthrough))?;
        guard
            .bus
            .transfer_in_place(&mut readback)
            .map_err(|_| Error::TransportFailure(Stage::Passthrough))?;
        log::trace!("sequencer: readback in {:02x?}", readback);
        log::debug!("sequencer: {}", Stage::Passthrough);
        Some(readback)
    } else {
        None
    };

    drop(guard);
    log::debug!("sequencer: {}", Stage::Done);

    Ok(Outcome { main, readback })
}
