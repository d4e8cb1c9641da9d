//! isospi - Send one command frame to an isoSPI battery-monitor chain
//!
//! The command line describes a single transaction: wake the daisy chain,
//! clock out a command frame, optionally run the SPI passthrough
//! execute/readback cycle, and print what came back as a hex string.
//!
//! # Architecture
//!
//! - `isospi-core` builds frames and runs the transaction against any
//!   `BusTransport`
//! - Transport crates (`linux_spi`, `dummy`) provide the bus; they are
//!   selected with `-p` and compiled in through cargo features

mod cli;
mod output;
mod transports;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use cli::Cli;
use isospi_core::frame::DATA_WORD_LEN;
use isospi_core::response::{self, WordStatus};
use isospi_core::sequencer;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logger; stdout is reserved for the hex payload
    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    match cli.verbose {
        0 => {} // default (warn, or RUST_LOG)
        1 => {
            logger.filter_level(log::LevelFilter::Debug);
        }
        _ => {
            logger.filter_level(log::LevelFilter::Trace);
        }
    }
    logger.init();

    let request = match cli.to_request() {
        Ok(request) => request,
        Err(e) => Cli::command().error(ErrorKind::ValueValidation, e).exit(),
    };

    let mut bus = match transports::open_transport(&cli.transport) {
        Ok(bus) => bus,
        Err(e) => Cli::command().error(ErrorKind::InvalidValue, e).exit(),
    };

    let outcome = match sequencer::run(&mut bus, &request) {
        Ok(outcome) => outcome,
        Err(e) => {
            println!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.check_pec {
        check_response(outcome.payload());
    }

    if let Err(e) = output::write_hex(&mut std::io::stdout().lock(), outcome.payload()) {
        eprintln!("Failed to write output: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Log every response word whose PEC does not hold
fn check_response(payload: &[u8]) {
    let mut bad = 0;
    for (board, status) in response::check_words(payload) {
        match status {
            WordStatus::Valid => log::debug!("Board {}: PEC ok", board),
            WordStatus::LinkDown => {
                bad += 1;
                log::warn!("Board {}: {}, check the isoSPI connection", board, status);
            }
            WordStatus::PecMismatch => {
                bad += 1;
                log::warn!("Board {}: {}", board, status);
            }
        }
    }
    if payload.len() % DATA_WORD_LEN != 0 {
        log::warn!(
            "Response is {} bytes, trailing partial word not checked",
            payload.len()
        );
    }
    if bad == 0 {
        log::info!("All response words passed the PEC check");
    }
}
