//! Frame building
//!
//! All multi-byte values go out most significant byte first. The main frame
//! carries the 4-byte command followed by 8 bytes per data word. The execute
//! and readback frames start with fixed LTC6813 commands (STCOMM and RDCOMM,
//! each with its PEC) and are padded with zeros; the readback padding is
//! where the chain's answer lands.

use alloc::vec;
use alloc::vec::Vec;

use crate::error::Result;
use crate::request::Request;

/// Length of the command header in the main frame
pub const COMMAND_LEN: usize = 4;

/// Length of one serialized data word
pub const DATA_WORD_LEN: usize = 8;

/// Length of the fixed execute/readback headers
pub const HEADER_LEN: usize = 4;

/// Execute frame padding per SPI board
pub const EXECUTE_BYTES_PER_SPI_BOARD: usize = 3;

/// Readback frame body per board
pub const READBACK_BYTES_PER_BOARD: usize = 8;

/// STCOMM (0x0723) followed by its PEC
pub const EXECUTE_HEADER: [u8; HEADER_LEN] = [0x07, 0x23, 0xB9, 0xE4];

/// RDCOMM (0x0722) followed by its PEC
pub const READBACK_HEADER: [u8; HEADER_LEN] = [0x07, 0x22, 0x32, 0xD6];

/// Serialize the command header
pub fn encode_command(command: u32) -> [u8; COMMAND_LEN] {
    let mut bytes = [0u8; COMMAND_LEN];
    for (i, byte) in bytes.iter_mut().enumerate() {
        let shift = (COMMAND_LEN - 1 - i) * 8;
        *byte = ((command & (0xFF << shift)) >> shift) as u8;
    }
    bytes
}

/// Serialize one data word
pub fn encode_data_word(word: u64) -> [u8; DATA_WORD_LEN] {
    let mut bytes = [0u8; DATA_WORD_LEN];
    for (i, byte) in bytes.iter_mut().enumerate() {
        let shift = (DATA_WORD_LEN - 1 - i) * 8;
        *byte = ((word & (0xFF << shift)) >> shift) as u8;
    }
    bytes
}

/// Command header followed by every data word
pub fn main_frame(command: u32, data_words: &[u64]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(COMMAND_LEN + DATA_WORD_LEN * data_words.len());
    frame.extend_from_slice(&encode_command(command));
    for &word in data_words {
        frame.extend_from_slice(&encode_data_word(word));
    }
    frame
}

/// STCOMM header padded for `spi_boards` boards
pub fn execute_frame(spi_boards: usize) -> Vec<u8> {
    padded(&EXECUTE_HEADER, EXECUTE_BYTES_PER_SPI_BOARD * spi_boards)
}

/// RDCOMM header padded for `board_count` boards
pub fn readback_frame(board_count: usize) -> Vec<u8> {
    padded(&READBACK_HEADER, READBACK_BYTES_PER_BOARD * board_count)
}

fn padded(header: &[u8; HEADER_LEN], body_len: usize) -> Vec<u8> {
    let mut frame = vec![0u8; HEADER_LEN + body_len];
    frame[..HEADER_LEN].copy_from_slice(header);
    frame
}

/// The three frames of one transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frames {
    /// Command and data, always sent
    pub main: Vec<u8>,
    /// Sent only when passthrough is enabled
    pub execute: Vec<u8>,
    /// Sent only when passthrough is enabled; receives the answer
    pub readback: Vec<u8>,
}

impl Frames {
    /// Validate the request and build its frames
    pub fn build(request: &Request) -> Result<Self> {
        request.validate()?;

        Ok(Self {
            main: main_frame(request.command, &request.data_words),
            execute: execute_frame(request.spi_boards),
            readback: readback_frame(request.board_count),
        })
    }
}
