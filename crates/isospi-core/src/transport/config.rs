//! Static bus configuration

use core::fmt;

/// One of the two hardware chip-select lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChipSelect {
    /// Chip select line 0
    Cs0,
    /// Chip select line 1
    Cs1,
}

impl ChipSelect {
    /// Map the numeric selector used on the command line (0 selects CS0,
    /// anything else selects CS1)
    pub const fn from_selector(selector: u32) -> Self {
        if selector == 0 {
            Self::Cs0
        } else {
            Self::Cs1
        }
    }

    /// Line index (0 or 1)
    pub const fn index(self) -> u8 {
        match self {
            Self::Cs0 => 0,
            Self::Cs1 => 1,
        }
    }
}

impl fmt::Display for ChipSelect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CS{}", self.index())
    }
}

/// Bit order on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOrder {
    /// Most significant bit first
    MsbFirst,
    /// Least significant bit first
    LsbFirst,
}

/// SPI clock polarity/phase mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataMode {
    /// CPOL=0, CPHA=0
    Mode0,
    /// CPOL=0, CPHA=1
    Mode1,
    /// CPOL=1, CPHA=0
    Mode2,
    /// CPOL=1, CPHA=1
    Mode3,
}

impl DataMode {
    /// Numeric mode (0-3)
    pub const fn number(self) -> u8 {
        match self {
            Self::Mode0 => 0,
            Self::Mode1 => 1,
            Self::Mode2 => 2,
            Self::Mode3 => 3,
        }
    }

    /// Clock polarity bit
    pub const fn cpol(self) -> bool {
        matches!(self, Self::Mode2 | Self::Mode3)
    }

    /// Clock phase bit
    pub const fn cpha(self) -> bool {
        matches!(self, Self::Mode1 | Self::Mode3)
    }
}

/// Chip-select polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsPolarity {
    /// Line is driven low while the chip is selected
    ActiveLow,
    /// Line is driven high while the chip is selected
    ActiveHigh,
}

/// Fixed hardware profile applied before every transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    /// Bit order on the wire
    pub bit_order: BitOrder,
    /// Clock polarity/phase
    pub data_mode: DataMode,
    /// Divider applied to [`BusConfig::CORE_CLOCK_HZ`]
    pub clock_divider: u16,
    /// Polarity of CS0 and CS1
    pub cs_polarity: [CsPolarity; 2],
}

impl BusConfig {
    /// Clock feeding the SPI divider on the Raspberry Pi (BCM2835 core clock)
    pub const CORE_CLOCK_HZ: u32 = 250_000_000;

    /// Profile used for isoSPI links: MSB first, mode 0, divider 512
    /// (~488 kHz), both chip selects active low
    pub const ISOSPI: Self = Self {
        bit_order: BitOrder::MsbFirst,
        data_mode: DataMode::Mode0,
        clock_divider: 512,
        cs_polarity: [CsPolarity::ActiveLow, CsPolarity::ActiveLow],
    };

    /// Resulting SPI clock in Hz
    pub const fn speed_hz(&self) -> u32 {
        if self.clock_divider == 0 {
            return Self::CORE_CLOCK_HZ;
        }
        Self::CORE_CLOCK_HZ / self.clock_divider as u32
    }

    /// Polarity configured for the given line
    pub const fn polarity(&self, cs: ChipSelect) -> CsPolarity {
        self.cs_polarity[cs.index() as usize]
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self::ISOSPI
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isospi_profile() {
        let config = BusConfig::ISOSPI;
        assert_eq!(config.bit_order, BitOrder::MsbFirst);
        assert_eq!(config.data_mode, DataMode::Mode0);
        assert_eq!(config.speed_hz(), 488_281);
        assert_eq!(config.polarity(ChipSelect::Cs0), CsPolarity::ActiveLow);
        assert_eq!(config.polarity(ChipSelect::Cs1), CsPolarity::ActiveLow);
    }

    #[test]
    fn test_chip_select_from_selector() {
        assert_eq!(ChipSelect::from_selector(0), ChipSelect::Cs0);
        assert_eq!(ChipSelect::from_selector(1), ChipSelect::Cs1);
        assert_eq!(ChipSelect::from_selector(7), ChipSelect::Cs1);
    }

    #[test]
    fn test_data_mode_bits() {
        assert!(!DataMode::Mode0.cpol() && !DataMode::Mode0.cpha());
        assert!(DataMode::Mode3.cpol() && DataMode::Mode3.cpha());
        assert_eq!(DataMode::Mode2.number(), 2);
    }
}
