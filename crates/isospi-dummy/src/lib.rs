//! isospi-dummy - Loopback isoSPI bus for testing
//!
//! This crate provides a bus that behaves like MOSI wired straight back to
//! MISO: every transfer returns the bytes that were sent. It records every
//! call so tests can check the exact sequence, can be told to answer the
//! readback frame with a canned response, and can be told to fail a given
//! step.
//!
//! # Usage with isospi CLI
//!
//! ```bash
//! # Dry run, no hardware needed
//! isospi -p dummy 0 0 2 1 5
//!
//! # Answer the readback frame with one board's register group
//! isospi -p dummy:readback=0000000000000000 0 1 1 0
//!
//! # Exercise the init failure path
//! isospi -p dummy:fail=init 0 0 1 0
//! ```

use isospi_core::error::{Error, Result};
use isospi_core::frame::{HEADER_LEN, READBACK_HEADER};
use isospi_core::sequencer::Stage;
use isospi_core::transport::{BusConfig, BusTransport, ChipSelect};

/// Step the dummy bus should fail at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    /// `init` reports failure
    Init,
    /// `begin_session` reports failure
    Begin,
    /// Every buffer transfer reports failure
    Transfer,
}

/// Configuration for the dummy bus
#[derive(Debug, Clone, Default)]
pub struct DummyConfig {
    /// Bytes placed in the readback frame body instead of the loopback data
    pub readback: Option<Vec<u8>>,
    /// Step to fail at, if any
    pub fail: Option<FailAt>,
}

/// One recorded bus call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    /// `init`
    Init,
    /// `begin_session`
    Begin,
    /// `configure`
    Configure(BusConfig),
    /// `select_chip`
    Select(ChipSelect),
    /// `transfer_byte` with the byte sent
    Byte(u8),
    /// `transfer_in_place` with the bytes sent
    Transfer(Vec<u8>),
    /// `delay_ms`
    Delay(u32),
    /// `end_session`
    End,
    /// `close`
    Close,
}

/// Loopback bus
#[derive(Debug, Default)]
pub struct DummyBus {
    config: DummyConfig,
    events: Vec<BusEvent>,
    open: bool,
    in_session: bool,
}

impl DummyBus {
    /// Create a new dummy bus with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Create a plain loopback bus
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Every call made so far, in order
    pub fn events(&self) -> &[BusEvent] {
        &self.events
    }

    /// Whether the peripheral is currently held
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Whether a session is currently running
    pub fn in_session(&self) -> bool {
        self.in_session
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }
}

impl BusTransport for DummyBus {
    fn init(&mut self) -> Result<()> {
        self.events.push(BusEvent::Init);
        if self.config.fail == Some(FailAt::Init) {
            log::debug!("dummy: failing init as configured");
            return Err(Error::BusInitFailure);
        }
        self.open = true;
        Ok(())
    }

    fn begin_session(&mut self) -> Result<()> {
        self.events.push(BusEvent::Begin);
        if self.config.fail == Some(FailAt::Begin) {
            log::debug!("dummy: failing session begin as configured");
            return Err(Error::BusSessionFailure);
        }
        self.in_session = true;
        Ok(())
    }

    fn configure(&mut self, config: &BusConfig) -> Result<()> {
        self.events.push(BusEvent::Configure(*config));
        log::debug!(
            "dummy: configured mode {} at {} Hz",
            config.data_mode.number(),
            config.speed_hz()
        );
        Ok(())
    }

    fn select_chip(&mut self, cs: ChipSelect) -> Result<()> {
        self.events.push(BusEvent::Select(cs));
        Ok(())
    }

    fn transfer_byte(&mut self, byte: u8) -> Result<u8> {
        self.events.push(BusEvent::Byte(byte));
        Ok(byte)
    }

    fn transfer_in_place(&mut self, buf: &mut [u8]) -> Result<()> {
        self.events.push(BusEvent::Transfer(buf.to_vec()));
        if self.config.fail == Some(FailAt::Transfer) {
            log::debug!("dummy: failing transfer as configured");
            return Err(Error::TransportFailure(Stage::MainSent));
        }

        if buf.starts_with(&READBACK_HEADER) {
            if let Some(response) = &self.config.readback {
                let body = &mut buf[HEADER_LEN..];
                let len = core::cmp::min(body.len(), response.len());
                body[..len].copy_from_slice(&response[..len]);
            }
        }
        Ok(())
    }

    fn delay_ms(&mut self, ms: u32) {
        self.events.push(BusEvent::Delay(ms));
    }

    fn end_session(&mut self) -> Result<()> {
        self.events.push(BusEvent::End);
        self.in_session = false;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.events.push(BusEvent::Close);
        self.open = false;
        Ok(())
    }
}

/// Parse a hex string such as `0a1B2c` into bytes
fn parse_hex_bytes(s: &str) -> std::result::Result<Vec<u8>, String> {
    if s.len() % 2 != 0 {
        return Err(format!("Odd number of hex digits: {}", s));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            s.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| format!("Invalid hex value: {}", s))
        })
        .collect()
}

/// Parse transport options from a list of key-value pairs
pub fn parse_options(options: &[(&str, &str)]) -> std::result::Result<DummyConfig, String> {
    let mut config = DummyConfig::default();

    for (key, value) in options {
        match *key {
            "readback" => {
                config.readback = Some(parse_hex_bytes(value)?);
            }
            "fail" => {
                config.fail = Some(match *value {
                    "init" => FailAt::Init,
                    "begin" => FailAt::Begin,
                    "transfer" => FailAt::Transfer,
                    _ => {
                        return Err(format!(
                            "Invalid fail value: {} (must be init, begin or transfer)",
                            value
                        ))
                    }
                });
            }
            _ => {
                log::warn!("dummy: Unknown option: {}={}", key, value);
            }
        }
    }

    Ok(config)
}

/// Open a dummy bus and return it boxed for the CLI transport dispatch
pub fn open_dummy(
    options: &[(&str, &str)],
) -> std::result::Result<Box<dyn BusTransport + Send>, Box<dyn std::error::Error>> {
    let config = parse_options(options)?;
    log::info!("dummy: Using loopback bus");
    Ok(Box::new(DummyBus::new(config)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use isospi_core::request::Request;
    use isospi_core::sequencer;

    #[test]
    fn test_loopback_echoes_data_words() {
        let mut bus = DummyBus::new_default();
        let req = Request::new(ChipSelect::Cs0, 0, 2, 1, vec![5]);

        let outcome = sequencer::run(&mut bus, &req).unwrap();
        assert_eq!(outcome.payload(), &[0u8, 0, 0, 0, 0, 0, 0, 5]);
        assert!(!bus.is_open());
        assert!(!bus.in_session());
    }

    #[test]
    fn test_event_sequence() {
        let mut bus = DummyBus::new_default();
        let req = Request::new(ChipSelect::Cs1, 1, 1, 0x0723, vec![]);

        sequencer::run(&mut bus, &req).unwrap();
        assert_eq!(
            bus.events(),
            &[
                BusEvent::Init,
                BusEvent::Begin,
                BusEvent::Configure(BusConfig::ISOSPI),
                BusEvent::Select(ChipSelect::Cs1),
                BusEvent::Byte(0),
                BusEvent::Delay(1),
                BusEvent::Transfer(vec![0x00, 0x00, 0x07, 0x23]),
                BusEvent::Transfer(vec![0x07, 0x23, 0xB9, 0xE4, 0, 0, 0]),
                BusEvent::Transfer(vec![0x07, 0x22, 0x32, 0xD6, 0, 0, 0, 0, 0, 0, 0, 0]),
                BusEvent::End,
                BusEvent::Close,
            ]
        );
    }

    #[test]
    fn test_canned_readback() {
        let response = vec![0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF, 0x11, 0x22];
        let mut bus = DummyBus::new(DummyConfig {
            readback: Some(response.clone()),
            fail: None,
        });
        let req = Request::new(ChipSelect::Cs0, 1, 1, 0x0722, vec![]);

        let outcome = sequencer::run(&mut bus, &req).unwrap();
        assert_eq!(outcome.payload(), &response[..]);
    }

    #[test]
    fn test_begin_failure_releases_bus() {
        let mut bus = DummyBus::new(DummyConfig {
            readback: None,
            fail: Some(FailAt::Begin),
        });
        let req = Request::new(ChipSelect::Cs0, 0, 1, 0, vec![]);

        assert_eq!(
            sequencer::run(&mut bus, &req),
            Err(Error::BusSessionFailure)
        );
        assert!(!bus.is_open());
        assert_eq!(bus.events().last(), Some(&BusEvent::Close));
    }

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[("readback", "00ff10"), ("fail", "transfer")]).unwrap();
        assert_eq!(config.readback, Some(vec![0x00, 0xFF, 0x10]));
        assert_eq!(config.fail, Some(FailAt::Transfer));

        assert!(parse_options(&[("readback", "abc")]).is_err());
        assert!(parse_options(&[("readback", "zz")]).is_err());
        assert!(parse_options(&[("fail", "never")]).is_err());
    }
}
