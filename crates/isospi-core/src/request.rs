//! Validated transaction request
//!
//! A [`Request`] is what the command line decodes into: which chip select to
//! use, how many boards sit on the chain, whether the SPI passthrough
//! execute/readback cycle runs, and the command frame contents.

use alloc::vec::Vec;

use crate::error::{ArgumentError, Result};
use crate::pec;
use crate::transport::ChipSelect;

/// Longest supported daisy chain
pub const MAX_BOARDS: usize = 64;

/// Most SPI boards addressable through the passthrough execute frame
pub const MAX_SPI_BOARDS: usize = 64;

/// Most data words in one main frame
pub const MAX_DATA_WORDS: usize = 64;

/// One isoSPI transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Chip-select line the chain hangs off
    pub chip_select: ChipSelect,
    /// Run the execute/readback cycle after the main frame
    pub passthrough_enabled: bool,
    /// Sizes the execute frame padding (3 bytes per board)
    pub spi_boards: usize,
    /// Wake-up pulses to send and readback size (8 bytes per board)
    pub board_count: usize,
    /// 32-bit command header
    pub command: u32,
    /// Data words following the command, in order
    pub data_words: Vec<u64>,
}

impl Request {
    /// Build a request the way the command line describes it: a nonzero
    /// `spi_boards` enables the passthrough cycle
    pub fn new(
        chip_select: ChipSelect,
        spi_boards: usize,
        board_count: usize,
        command: u32,
        data_words: Vec<u64>,
    ) -> Self {
        Self {
            chip_select,
            passthrough_enabled: spi_boards != 0,
            spi_boards,
            board_count,
            command,
            data_words,
        }
    }

    /// Build a request with CRC15 PEC framing applied
    ///
    /// `code` is a 16-bit LTC6813 command code and each data word a 48-bit
    /// register payload; both get their PEC appended.
    pub fn with_pec(
        chip_select: ChipSelect,
        spi_boards: usize,
        board_count: usize,
        code: u32,
        payloads: &[u64],
    ) -> Result<Self> {
        let code = u16::try_from(code).map_err(|_| ArgumentError::CommandTooWide { value: code })?;
        let data_words = payloads
            .iter()
            .map(|&payload| pec::data_word_with_pec(payload))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(
            chip_select,
            spi_boards,
            board_count,
            pec::command_with_pec(code),
            data_words,
        ))
    }

    /// Check every count that sizes a buffer
    pub fn validate(&self) -> Result<()> {
        if self.board_count == 0 || self.board_count > MAX_BOARDS {
            return Err(ArgumentError::BoardCount {
                count: self.board_count,
            }
            .into());
        }
        if self.spi_boards > MAX_SPI_BOARDS {
            return Err(ArgumentError::SpiBoards {
                count: self.spi_boards,
            }
            .into());
        }
        if self.data_words.len() > MAX_DATA_WORDS {
            return Err(ArgumentError::TooManyDataWords {
                count: self.data_words.len(),
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use alloc::vec;

    #[test]
    fn test_passthrough_follows_spi_boards() {
        let req = Request::new(ChipSelect::Cs0, 0, 2, 256, vec![]);
        assert!(!req.passthrough_enabled);

        let req = Request::new(ChipSelect::Cs1, 1, 3, 0, vec![]);
        assert!(req.passthrough_enabled);
        assert_eq!(req.spi_boards, 1);
    }

    #[test]
    fn test_validate_ranges() {
        assert!(Request::new(ChipSelect::Cs0, 0, 1, 0, vec![]).validate().is_ok());
        assert!(Request::new(ChipSelect::Cs0, 64, 64, 0, vec![0; 64])
            .validate()
            .is_ok());

        assert_eq!(
            Request::new(ChipSelect::Cs0, 0, 0, 0, vec![]).validate(),
            Err(Error::InvalidArguments(ArgumentError::BoardCount { count: 0 }))
        );
        assert_eq!(
            Request::new(ChipSelect::Cs0, 0, 65, 0, vec![]).validate(),
            Err(Error::InvalidArguments(ArgumentError::BoardCount { count: 65 }))
        );
        assert_eq!(
            Request::new(ChipSelect::Cs0, 65, 1, 0, vec![]).validate(),
            Err(Error::InvalidArguments(ArgumentError::SpiBoards { count: 65 }))
        );
        assert_eq!(
            Request::new(ChipSelect::Cs0, 0, 1, 0, vec![0; 65]).validate(),
            Err(Error::InvalidArguments(ArgumentError::TooManyDataWords {
                count: 65
            }))
        );
    }

    #[test]
    fn test_with_pec() {
        // WRCFGA with one all-zero register group
        let req = Request::with_pec(ChipSelect::Cs0, 0, 1, 0x0001, &[0]).unwrap();
        assert_eq!(req.command, 0x0001_3D6E);
        assert_eq!(req.data_words, vec![0x0000_0000_0000_C212]);
    }

    #[test]
    fn test_with_pec_rejects_wide_values() {
        assert_eq!(
            Request::with_pec(ChipSelect::Cs0, 0, 1, 0x1_0000, &[]),
            Err(Error::InvalidArguments(ArgumentError::CommandTooWide {
                value: 0x1_0000
            }))
        );
        assert_eq!(
            Request::with_pec(ChipSelect::Cs0, 0, 1, 0x0001, &[1 << 48]),
            Err(Error::InvalidArguments(ArgumentError::PayloadTooWide {
                value: 1 << 48
            }))
        );
    }
}
