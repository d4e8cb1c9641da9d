//! Packet error codes
//!
//! The LTC6813 protects every command and every 6-byte register group with a
//! 15-bit CRC (PEC), transmitted as two bytes with bit 0 cleared. The LTC3300
//! balancers behind the passthrough use a 4-bit inverted CRC over 12 data
//! bits and an even parity bit on the command byte.

use crate::error::{ArgumentError, Result};

/// PEC15 seed value
const PEC15_SEED: u16 = 0x0010;

/// PEC15 polynomial: x^15 + x^14 + x^10 + x^8 + x^7 + x^4 + x^3 + 1
const PEC15_POLY: u16 = 0x4599;

/// CRC4 polynomial: x^4 + x + 1
const CRC4_POLY: u8 = 0x13;

/// Bytes of register payload protected by one PEC
pub const REGISTER_PAYLOAD_LEN: usize = 6;

/// Largest payload that fits in one register group
pub const REGISTER_PAYLOAD_MAX: u64 = (1 << (REGISTER_PAYLOAD_LEN * 8)) - 1;

/// Compute the LTC6813 PEC over `data`
pub fn pec15(data: &[u8]) -> u16 {
    let mut remainder = PEC15_SEED;
    for &byte in data {
        for bit in (0..8).rev() {
            let din = u16::from((byte >> bit) & 1) ^ ((remainder >> 14) & 1);
            remainder = (remainder << 1) & 0x7FFF;
            if din != 0 {
                remainder ^= PEC15_POLY;
            }
        }
    }
    remainder << 1
}

/// Check a message whose last two bytes are the PEC of the bytes before it
pub fn pec15_check(message: &[u8]) -> bool {
    if message.len() < 3 {
        return false;
    }
    let (data, pec) = message.split_at(message.len() - 2);
    pec15(data) == u16::from_be_bytes([pec[0], pec[1]])
}

/// 16-bit command code followed by its PEC
pub fn command_with_pec(code: u16) -> u32 {
    (u32::from(code) << 16) | u32::from(pec15(&code.to_be_bytes()))
}

/// 48-bit register payload followed by its PEC
pub fn data_word_with_pec(payload: u64) -> Result<u64> {
    if payload > REGISTER_PAYLOAD_MAX {
        return Err(ArgumentError::PayloadTooWide { value: payload }.into());
    }
    let bytes = payload.to_be_bytes();
    let pec = pec15(&bytes[8 - REGISTER_PAYLOAD_LEN..]);
    Ok((payload << 16) | u64::from(pec))
}

/// LTC3300 inverted CRC4 over the low 12 bits of `data`
pub fn crc4(data: u16) -> u8 {
    let message = (data & 0x0FFF) << 4;
    let mut remainder: u8 = 0;
    for bit in (0..16).rev() {
        remainder = (remainder << 1) | ((message >> bit) & 1) as u8;
        if remainder & 0x10 != 0 {
            remainder ^= CRC4_POLY;
        }
    }
    0x0F - remainder
}

/// Check a 16-bit balancer word whose low nibble is the CRC4 of the rest
pub fn crc4_check(word: u16) -> bool {
    crc4(word >> 4) == (word & 0x0F) as u8
}

/// Parity bit that makes the number of ones in `byte` even
pub fn even_parity(byte: u8) -> u8 {
    (byte.count_ones() & 1) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_pec15_known_values() {
        assert_eq!(pec15(&[0x07, 0x23]), 0xB9E4); // STCOMM
        assert_eq!(pec15(&[0x07, 0x22]), 0x32D6); // RDCOMM
        assert_eq!(pec15(&[0x00, 0x01]), 0x3D6E); // WRCFGA
        assert_eq!(pec15(&[0xFF, 0x9B, 0xAA, 0xFF, 0xFA]), 0x2C68);
        assert_eq!(pec15(&[0; 6]), 0xC212);
    }

    #[test]
    fn test_pec15_check() {
        assert!(pec15_check(&[0xFF, 0x9B, 0xAA, 0xFF, 0xFA, 0x2C, 0x68]));
        assert!(!pec15_check(&[0xFF, 0x9B, 0xAA, 0xFF, 0xFA, 0x2C, 0x69]));
        assert!(!pec15_check(&[0x2C, 0x68]));
    }

    #[test]
    fn test_command_with_pec() {
        assert_eq!(command_with_pec(0x0723), 0x0723_B9E4);
        assert_eq!(command_with_pec(0x0001), 0x0001_3D6E);
    }

    #[test]
    fn test_data_word_with_pec() {
        assert_eq!(data_word_with_pec(0), Ok(0xC212));
        let word = data_word_with_pec(0x1234_5678_9ABC).unwrap();
        assert!(pec15_check(&word.to_be_bytes()));
        assert_eq!(word >> 16, 0x1234_5678_9ABC);
        assert_eq!(
            data_word_with_pec(REGISTER_PAYLOAD_MAX + 1),
            Err(Error::InvalidArguments(ArgumentError::PayloadTooWide {
                value: REGISTER_PAYLOAD_MAX + 1
            }))
        );
    }

    #[test]
    fn test_crc4() {
        assert_eq!(crc4(0b1100_0001_0000), 0x2);
        assert_eq!(crc4(0xABC), 0x5);
        assert_eq!(crc4(0), 0xF);
        assert!(crc4_check((0xABC << 4) | 0x5));
        assert!(!crc4_check((0xABC << 4) | 0x4));
    }

    #[test]
    fn test_even_parity() {
        assert_eq!(even_parity(0b1010_1000), 1);
        assert_eq!(even_parity(0b1010_1110), 1);
        assert_eq!(even_parity(0b1010_1100), 0);
        assert_eq!(even_parity(0), 0);
    }
}
