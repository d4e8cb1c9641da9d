//! COMM register packing for the SPI passthrough
//!
//! The LTC6813 forwards up to three bytes to an SPI device on its GPIO port
//! when it receives STCOMM. Those bytes live in the COMM register group
//! (written with WRCOMM), each wrapped in a 4-bit initial (ICOM) and final
//! (FCOM) control code:
//!
//! ```text
//! | ICOM0 | D0 | FCOM0 | ICOM1 | D1 | FCOM1 | ICOM2 | D2 | FCOM2 |
//! |  4b   | 8b |  4b   |  4b   | 8b |  4b   |  4b   | 8b |  4b   |
//! ```
//!
//! The helpers below also build the command and data bytes of the LTC3300
//! balancers that sit on that port.

use crate::pec;

/// WRCOMM command code
pub const WRCOMM: u16 = 0x0721;
/// RDCOMM command code
pub const RDCOMM: u16 = 0x0722;
/// STCOMM command code
pub const STCOMM: u16 = 0x0723;

/// Number of byte slots in the COMM register group
pub const SLOTS: usize = 3;

/// ICOM/FCOM control codes for the SPI master
pub mod control {
    /// Drive CSBM low (ICOM) / hold it low after the byte (FCOM)
    pub const CSBM_LOW: u8 = 0b1000;
    /// Drive CSBM high, then low (ICOM only)
    pub const CSBM_FALLING: u8 = 0b1010;
    /// Drive CSBM high (ICOM) / release it after the byte (FCOM)
    pub const CSBM_HIGH: u8 = 0b1001;
    /// Do not transmit; release the port and ignore the remaining slots
    pub const NO_TRANSMIT: u8 = 0b1111;
}

/// One byte of the COMM register group with its control codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommSlot {
    /// Initial control code
    pub icom: u8,
    /// Byte to transmit (or received byte on readback)
    pub data: u8,
    /// Final control code
    pub fcom: u8,
}

impl CommSlot {
    /// Create a slot
    pub const fn new(icom: u8, data: u8, fcom: u8) -> Self {
        Self { icom, data, fcom }
    }

    fn pack(self) -> u64 {
        (u64::from(self.icom & 0x0F) << 12) | (u64::from(self.data) << 4) | u64::from(self.fcom & 0x0F)
    }

    fn unpack(bits: u64) -> Self {
        Self {
            icom: ((bits >> 12) & 0x0F) as u8,
            data: ((bits >> 4) & 0xFF) as u8,
            fcom: (bits & 0x0F) as u8,
        }
    }
}

/// Pack three slots into the 48-bit COMM register payload
pub fn encode(slots: &[CommSlot; SLOTS]) -> u64 {
    slots
        .iter()
        .fold(0u64, |word, slot| (word << 16) | slot.pack())
}

/// Split a 48-bit COMM register payload into its slots
pub fn decode(word: u64) -> [CommSlot; SLOTS] {
    let mut slots = [CommSlot::new(0, 0, 0); SLOTS];
    for (i, slot) in slots.iter_mut().enumerate() {
        let shift = 16 * (SLOTS - 1 - i);
        *slot = CommSlot::unpack((word >> shift) & 0xFFFF);
    }
    slots
}

/// LTC3300 fixed device address (upper bits of the command byte)
pub const BALANCER_ADDRESS: u8 = 0b1010_1000;

/// LTC3300 commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BalanceCommand {
    /// Write balance command
    Write = 0b000,
    /// Read back balance command
    Readback = 0b010,
    /// Read balance status
    ReadStatus = 0b100,
    /// Execute balance command
    Execute = 0b110,
}

/// LTC3300 command byte, with the even parity bit when `parity` is set
pub fn balance_command_byte(command: BalanceCommand, parity: bool) -> u8 {
    let byte = BALANCER_ADDRESS | command as u8;
    if parity {
        byte | pec::even_parity(byte)
    } else {
        byte
    }
}

/// COMM payload carrying an LTC3300 command with no data
///
/// Only the first slot is transmitted; the remaining ones release the port.
pub fn balance_command(command: BalanceCommand, parity: bool) -> u64 {
    use control::*;

    encode(&[
        CommSlot::new(CSBM_LOW, balance_command_byte(command, parity), CSBM_HIGH),
        CommSlot::new(NO_TRANSMIT, 0xFF, CSBM_HIGH),
        CommSlot::new(CSBM_HIGH, 0xFF, CSBM_HIGH),
    ])
}

/// COMM payload carrying an LTC3300 command followed by 12 bits of balancer
/// control data and its CRC4
pub fn balance_write(command: BalanceCommand, data: u16, parity: bool) -> u64 {
    use control::*;

    let word = ((data & 0x0FFF) << 4) | u16::from(pec::crc4(data));
    let [high, low] = word.to_be_bytes();

    encode(&[
        CommSlot::new(CSBM_LOW, balance_command_byte(command, parity), CSBM_LOW),
        CommSlot::new(CSBM_LOW, high, CSBM_LOW),
        CommSlot::new(CSBM_LOW, low, CSBM_HIGH),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame;

    #[test]
    fn test_encode_layout() {
        let word = encode(&[
            CommSlot::new(0x8, 0xAB, 0x9),
            CommSlot::new(0xF, 0xCD, 0x8),
            CommSlot::new(0xA, 0xEF, 0x1),
        ]);
        assert_eq!(word, 0x8AB9_FCD8_AEF1);
        assert_eq!(word >> 48, 0);
    }

    #[test]
    fn test_decode_inverts_encode() {
        let slots = [
            CommSlot::new(control::CSBM_LOW, 0x12, control::CSBM_LOW),
            CommSlot::new(control::CSBM_LOW, 0x34, control::CSBM_LOW),
            CommSlot::new(control::CSBM_LOW, 0x56, control::CSBM_HIGH),
        ];
        assert_eq!(decode(encode(&slots)), slots);
    }

    #[test]
    fn test_balance_command_byte() {
        assert_eq!(balance_command_byte(BalanceCommand::Write, false), 0xA8);
        // 0xA8 has three ones, so parity sets bit 0
        assert_eq!(balance_command_byte(BalanceCommand::Write, true), 0xA9);
        // 0xAE has five ones
        assert_eq!(balance_command_byte(BalanceCommand::Execute, true), 0xAF);
        assert_eq!(balance_command_byte(BalanceCommand::Readback, false), 0xAA);
    }

    #[test]
    fn test_balance_command_payload() {
        let slots = decode(balance_command(BalanceCommand::Execute, false));
        assert_eq!(slots[0].icom, control::CSBM_LOW);
        assert_eq!(slots[0].data, 0xAE);
        assert_eq!(slots[0].fcom, control::CSBM_HIGH);
        assert_eq!(slots[1].icom, control::NO_TRANSMIT);
    }

    #[test]
    fn test_balance_write_payload() {
        let slots = decode(balance_write(BalanceCommand::Write, 0xABC, true));
        assert_eq!(slots[0].data, 0xA9);
        assert_eq!(slots[1].data, 0xAB);
        assert_eq!(slots[2].data, 0xC5);
        assert_eq!(slots[2].fcom, control::CSBM_HIGH);
        assert!(pec::crc4_check(u16::from_be_bytes([slots[1].data, slots[2].data])));
    }

    #[test]
    fn test_comm_codes_match_frame_headers() {
        assert_eq!(
            pec::command_with_pec(STCOMM).to_be_bytes(),
            frame::EXECUTE_HEADER
        );
        assert_eq!(
            pec::command_with_pec(RDCOMM).to_be_bytes(),
            frame::READBACK_HEADER
        );
        assert_eq!(WRCOMM, 0x0721);
    }
}
