//! Hex output of the response payload

use std::io::{self, Write};

/// Write bytes as lowercase two-digit hex with no separators and no newline
pub fn write_hex<W: Write>(out: &mut W, bytes: &[u8]) -> io::Result<()> {
    for byte in bytes {
        write!(out, "{:02x}", byte)?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(bytes: &[u8]) -> String {
        let mut out = Vec::new();
        write_hex(&mut out, bytes).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_lowercase_zero_padded() {
        assert_eq!(hex(&[0x00, 0x0a, 0xAB, 0xff]), "000aabff");
    }

    #[test]
    fn test_empty_payload_prints_nothing() {
        assert_eq!(hex(&[]), "");
    }

    #[test]
    fn test_data_word() {
        assert_eq!(hex(&5u64.to_be_bytes()), "0000000000000005");
    }
}
