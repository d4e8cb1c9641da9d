//! Response checking
//!
//! Register reads return one 8-byte word per board: six payload bytes and
//! their PEC. A board that does not drive the line leaves MISO pulled up, so
//! an all-ones word means the isoSPI link is broken at or before that board.

use core::fmt;

use crate::frame::DATA_WORD_LEN;
use crate::pec;

/// Verdict for one 8-byte response word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordStatus {
    /// PEC matches
    Valid,
    /// PEC does not match the payload
    PecMismatch,
    /// Every bit is set: nothing answered
    LinkDown,
}

impl fmt::Display for WordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "valid"),
            Self::PecMismatch => write!(f, "PEC mismatch"),
            Self::LinkDown => write!(f, "no answer (link down)"),
        }
    }
}

/// Classify one response word
pub fn check_word(word: &[u8]) -> WordStatus {
    if word.iter().all(|&b| b == 0xFF) {
        WordStatus::LinkDown
    } else if pec::pec15_check(word) {
        WordStatus::Valid
    } else {
        WordStatus::PecMismatch
    }
}

/// Classify every complete 8-byte word of a response payload
///
/// Yields `(board index, status)`; a trailing partial word is ignored.
pub fn check_words(payload: &[u8]) -> impl Iterator<Item = (usize, WordStatus)> + '_ {
    payload
        .chunks_exact(DATA_WORD_LEN)
        .map(check_word)
        .enumerate()
}

/// Payload bytes of a valid word (the word without its PEC)
pub fn register_payload(word: &[u8]) -> Option<&[u8]> {
    if word.len() != DATA_WORD_LEN || check_word(word) != WordStatus::Valid {
        return None;
    }
    Some(&word[..pec::REGISTER_PAYLOAD_LEN])
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn valid_word(payload: u64) -> [u8; 8] {
        pec::data_word_with_pec(payload).unwrap().to_be_bytes()
    }

    #[test]
    fn test_check_word() {
        assert_eq!(check_word(&valid_word(0x1234_5678_9ABC)), WordStatus::Valid);
        assert_eq!(check_word(&[0xFF; 8]), WordStatus::LinkDown);

        let mut corrupted = valid_word(0x1234_5678_9ABC);
        corrupted[2] ^= 0x01;
        assert_eq!(check_word(&corrupted), WordStatus::PecMismatch);
    }

    #[test]
    fn test_check_words() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&valid_word(1));
        payload.extend_from_slice(&[0xFF; 8]);
        payload.extend_from_slice(&[0x00; 8]);
        payload.extend_from_slice(&[0x12, 0x34]); // partial word

        let statuses: Vec<_> = check_words(&payload).collect();
        assert_eq!(
            statuses,
            [
                (0, WordStatus::Valid),
                (1, WordStatus::LinkDown),
                (2, WordStatus::PecMismatch),
            ]
        );
    }

    #[test]
    fn test_register_payload() {
        let word = valid_word(0x0102_0304_0506);
        assert_eq!(register_payload(&word), Some(&[1u8, 2, 3, 4, 5, 6][..]));
        assert_eq!(register_payload(&[0xFF; 8]), None);
        assert_eq!(register_payload(&word[..4]), None);
    }
}
