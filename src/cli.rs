//! CLI argument parsing

use crate::transports;
use clap::Parser;
use isospi_core::request::{Request, MAX_BOARDS, MAX_SPI_BOARDS};
use isospi_core::transport::ChipSelect;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Parse a string as a hex or decimal u64
fn parse_hex_u64(s: &str) -> Result<u64, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u64>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Generate dynamic help text for the transport argument
fn transport_help() -> String {
    format!(
        "Bus transport to use [available: {}]",
        transports::transport_names_short()
    )
}

#[derive(Parser, Debug)]
#[command(name = "isospi")]
#[command(
    author,
    version,
    about = "Send one command frame to a daisy-chain of isoSPI battery-monitor boards",
    long_about = "Send one command frame to a daisy-chain of isoSPI battery-monitor boards \
                  and print what came back as a lowercase hex string.\n\n\
                  With a nonzero SPI_BOARDS the execute/readback passthrough cycle runs after \
                  the main frame and the readback body is printed; otherwise the main frame \
                  without its command bytes is printed."
)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Bus transport, optionally with options (name:key=value,...)
    #[arg(short = 'p', long, default_value = "linux_spi", help = transport_help())]
    pub transport: String,

    /// Treat COMMAND as a 16-bit command code and each DATA_WORD as a 48-bit
    /// register payload, appending the CRC15 PEC to each
    #[arg(long)]
    pub pec: bool,

    /// Check the PEC of every 8-byte response word and warn about bad ones
    #[arg(long)]
    pub check_pec: bool,

    /// Chip-select line: 0 for CS0, anything else for CS1
    #[arg(value_name = "CHIP_SELECT")]
    pub chip_select: u32,

    /// SPI boards behind the passthrough; 0 skips the execute/readback cycle
    #[arg(value_name = "SPI_BOARDS", value_parser = clap::value_parser!(u32).range(0..=MAX_SPI_BOARDS as i64))]
    pub spi_boards: u32,

    /// Boards on the daisy chain (one wake-up pulse and one readback word each)
    #[arg(value_name = "BOARD_COUNT", value_parser = clap::value_parser!(u32).range(1..=MAX_BOARDS as i64))]
    pub board_count: u32,

    /// 32-bit command header (decimal or 0x-prefixed hex)
    #[arg(value_name = "COMMAND", value_parser = parse_hex_u32)]
    pub command: u32,

    /// 64-bit data words following the command (at most 64)
    #[arg(value_name = "DATA_WORD", value_parser = parse_hex_u64)]
    pub data_words: Vec<u64>,
}

impl Cli {
    /// Decode the positionals into a transaction request
    pub fn to_request(&self) -> isospi_core::Result<Request> {
        let chip_select = ChipSelect::from_selector(self.chip_select);
        let spi_boards = self.spi_boards as usize;
        let board_count = self.board_count as usize;

        let request = if self.pec {
            Request::with_pec(
                chip_select,
                spi_boards,
                board_count,
                self.command,
                &self.data_words,
            )?
        } else {
            Request::new(
                chip_select,
                spi_boards,
                board_count,
                self.command,
                self.data_words.clone(),
            )
        };

        request.validate()?;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use isospi_core::error::{ArgumentError, Error};

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("isospi").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_positionals() {
        let cli = parse(&["0", "0", "2", "256"]).unwrap();
        let req = cli.to_request().unwrap();
        assert_eq!(req.chip_select, ChipSelect::Cs0);
        assert!(!req.passthrough_enabled);
        assert_eq!(req.board_count, 2);
        assert_eq!(req.command, 256);
        assert!(req.data_words.is_empty());
        assert_eq!(cli.transport, "linux_spi");
    }

    #[test]
    fn test_data_words_keep_order() {
        let cli = parse(&["7", "1", "3", "0x0721", "5", "0xff", "18446744073709551615"]).unwrap();
        let req = cli.to_request().unwrap();
        assert_eq!(req.chip_select, ChipSelect::Cs1);
        assert!(req.passthrough_enabled);
        assert_eq!(req.command, 0x0721);
        assert_eq!(req.data_words, vec![5, 0xff, u64::MAX]);
    }

    #[test]
    fn test_too_few_positionals() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["0", "0", "2"]).is_err());
    }

    #[test]
    fn test_rejects_non_numeric_and_out_of_range() {
        assert!(parse(&["0", "0", "two", "1"]).is_err());
        assert!(parse(&["0", "0", "1", "4294967296"]).is_err());
        assert!(parse(&["0", "0", "1", "1", "18446744073709551616"]).is_err());
        assert!(parse(&["0", "0", "0", "1"]).is_err());
        assert!(parse(&["0", "0", "65", "1"]).is_err());
        assert!(parse(&["0", "65", "1", "1"]).is_err());
    }

    #[test]
    fn test_too_many_data_words() {
        let mut args = vec!["0", "0", "1", "1"];
        args.extend(std::iter::repeat("0").take(65));
        let cli = parse(&args).unwrap();
        assert_eq!(
            cli.to_request(),
            Err(Error::InvalidArguments(ArgumentError::TooManyDataWords {
                count: 65
            }))
        );
    }

    #[test]
    fn test_options() {
        let cli = parse(&["-vv", "-p", "dummy:readback=00", "--check-pec", "0", "1", "1", "0"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.transport, "dummy:readback=00");
        assert!(cli.check_pec);
        assert!(!cli.pec);
    }

    #[test]
    fn test_pec_framing() {
        let cli = parse(&["--pec", "0", "0", "1", "1"]).unwrap();
        let req = cli.to_request().unwrap();
        assert_eq!(req.command, 0x0001_3D6E);

        let cli = parse(&["--pec", "0", "0", "1", "0x10000"]).unwrap();
        assert_eq!(
            cli.to_request(),
            Err(Error::InvalidArguments(ArgumentError::CommandTooWide {
                value: 0x10000
            }))
        );
    }
}
