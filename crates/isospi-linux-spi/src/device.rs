//! Linux SPI bus implementation
//!
//! This module provides the `LinuxSpi` struct that implements the
//! `BusTransport` trait using Linux's spidev interface. Each chip-select line
//! of a controller is its own character device (`/dev/spidevB.C`), so
//! selecting a chip means switching to the matching device node.

use crate::error::{LinuxSpiError, Result};

use isospi_core::error::{Error as CoreError, Result as CoreResult};
use isospi_core::sequencer::Stage;
use isospi_core::transport::{BitOrder, BusConfig, BusTransport, ChipSelect, CsPolarity};

use bitflags::bitflags;
use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::path::Path;

/// Path to kernel spidev buffer size parameter
const BUF_SIZE_SYSFS: &str = "/sys/module/spidev/parameters/bufsiz";

/// Default device node prefix
const DEFAULT_DEVICE_PREFIX: &str = "/dev/spidev";

/// Bits per word (always 8)
const BITS_PER_WORD: u8 = 8;

bitflags! {
    /// spidev mode byte (SPI_IOC_WR_MODE)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SpiModeFlags: u8 {
        /// Clock phase
        const CPHA      = 0x01;
        /// Clock polarity
        const CPOL      = 0x02;
        /// Chip select active high
        const CS_HIGH   = 0x04;
        /// Least significant bit first
        const LSB_FIRST = 0x08;
    }
}

impl SpiModeFlags {
    /// Mode byte for a bus profile on a given chip-select line
    pub fn from_config(config: &BusConfig, cs: ChipSelect) -> Self {
        let mut flags = Self::empty();
        flags.set(Self::CPHA, config.data_mode.cpha());
        flags.set(Self::CPOL, config.data_mode.cpol());
        flags.set(Self::CS_HIGH, config.polarity(cs) == CsPolarity::ActiveHigh);
        flags.set(Self::LSB_FIRST, config.bit_order == BitOrder::LsbFirst);
        flags
    }
}

/// Linux spidev ioctl constants
mod ioctl {
    use nix::ioctl_write_ptr;

    // SPI ioctl magic number
    const SPI_IOC_MAGIC: u8 = b'k';

    // SPI ioctl type numbers
    const SPI_IOC_TYPE_MODE: u8 = 1;
    const SPI_IOC_TYPE_BITS_PER_WORD: u8 = 3;
    const SPI_IOC_TYPE_MAX_SPEED_HZ: u8 = 4;

    ioctl_write_ptr!(spi_ioc_wr_mode, SPI_IOC_MAGIC, SPI_IOC_TYPE_MODE, u8);
    ioctl_write_ptr!(
        spi_ioc_wr_bits_per_word,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_BITS_PER_WORD,
        u8
    );
    ioctl_write_ptr!(
        spi_ioc_wr_max_speed_hz,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_MAX_SPEED_HZ,
        u32
    );

    /// Size of spi_ioc_transfer struct
    pub const SPI_IOC_TRANSFER_SIZE: usize = 32;

    /// Calculate ioctl number for SPI_IOC_MESSAGE(n)
    ///
    /// SPI_IOC_MESSAGE(n) = _IOW(SPI_IOC_MAGIC, 0, char[n * sizeof(struct spi_ioc_transfer)])
    pub fn spi_ioc_message(n: u8) -> libc::c_ulong {
        let size = (n as usize) * SPI_IOC_TRANSFER_SIZE;
        // _IOC(dir, type, nr, size) = ((dir)<<30)|((size)<<16)|((type)<<8)|(nr), _IOC_WRITE = 1
        ((1u32 << 30) | ((size as u32) << 16) | ((SPI_IOC_MAGIC as u32) << 8)) as libc::c_ulong
    }
}

/// SPI transfer structure for ioctl
/// This must match the kernel's struct spi_ioc_transfer layout
#[repr(C)]
#[derive(Debug, Default, Clone)]
struct SpiIocTransfer {
    tx_buf: u64,          // __u64 tx_buf
    rx_buf: u64,          // __u64 rx_buf
    len: u32,             // __u32 len
    speed_hz: u32,        // __u32 speed_hz
    delay_usecs: u16,     // __u16 delay_usecs
    bits_per_word: u8,    // __u8 bits_per_word
    cs_change: u8,        // __u8 cs_change
    tx_nbits: u8,         // __u8 tx_nbits
    rx_nbits: u8,         // __u8 rx_nbits
    word_delay_usecs: u8, // __u8 word_delay_usecs
    _pad: u8,             // padding
}

/// Configuration for a Linux SPI bus
#[derive(Debug, Clone)]
pub struct LinuxSpiConfig {
    /// SPI controller number (the `B` in `/dev/spidevB.C`)
    pub bus: u8,
    /// Device node prefix (default: "/dev/spidev")
    pub device_prefix: String,
}

impl Default for LinuxSpiConfig {
    fn default() -> Self {
        Self {
            bus: 0,
            device_prefix: DEFAULT_DEVICE_PREFIX.to_string(),
        }
    }
}

impl LinuxSpiConfig {
    /// Create a new configuration for the given controller
    pub fn new(bus: u8) -> Self {
        Self {
            bus,
            ..Default::default()
        }
    }

    /// Use a different device node prefix
    pub fn with_device_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.device_prefix = prefix.into();
        self
    }

    /// Device node for a chip-select line
    pub fn device_path(&self, cs: ChipSelect) -> String {
        format!("{}{}.{}", self.device_prefix, self.bus, cs.index())
    }
}

/// Open device node and the chip select it belongs to
struct OpenDevice {
    file: File,
    cs: ChipSelect,
}

/// Linux SPI bus using the spidev interface
///
/// The session starts on CS0; `select_chip` switches device nodes and
/// reapplies the bus profile to the new one.
pub struct LinuxSpi {
    config: LinuxSpiConfig,
    /// Maximum kernel buffer size, known after `init`
    max_kernel_buf_size: usize,
    /// Profile applied by the last `configure`
    bus_config: Option<BusConfig>,
    device: Option<OpenDevice>,
}

impl LinuxSpi {
    /// Create a bus handle; nothing is opened until `init`/`begin_session`
    pub fn new(config: LinuxSpiConfig) -> Self {
        Self {
            config,
            max_kernel_buf_size: 0,
            bus_config: None,
            device: None,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &LinuxSpiConfig {
        &self.config
    }

    /// Check that the controller exists and read the kernel buffer size
    pub fn probe(&mut self) -> Result<()> {
        let path = self.config.device_path(ChipSelect::Cs0);
        if !Path::new(&path).exists() {
            return Err(LinuxSpiError::NoDevice { path });
        }

        self.max_kernel_buf_size = get_max_kernel_buf_size();
        log::debug!(
            "linux_spi: Max kernel buffer size: {} bytes",
            self.max_kernel_buf_size
        );
        Ok(())
    }

    /// Open the device node for a chip-select line
    fn open_device(&mut self, cs: ChipSelect) -> Result<()> {
        let path = self.config.device_path(cs);
        log::debug!("linux_spi: Opening device {}", path);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| LinuxSpiError::OpenFailed {
                path: path.clone(),
                source: e,
            })?;

        self.device = Some(OpenDevice { file, cs });

        if let Some(bus_config) = self.bus_config {
            self.apply(&bus_config)?;
        }
        Ok(())
    }

    /// Write mode, word size and speed to the open device
    fn apply(&mut self, bus_config: &BusConfig) -> Result<()> {
        let device = self.device.as_ref().ok_or(LinuxSpiError::NotOpen)?;
        let fd = device.file.as_raw_fd();

        let mode = SpiModeFlags::from_config(bus_config, device.cs).bits();
        unsafe {
            ioctl::spi_ioc_wr_mode(fd, &mode).map_err(|e| LinuxSpiError::SetModeFailed {
                mode,
                source: std::io::Error::from_raw_os_error(e as i32),
            })?;
        }

        let bits = BITS_PER_WORD;
        unsafe {
            ioctl::spi_ioc_wr_bits_per_word(fd, &bits).map_err(|e| {
                LinuxSpiError::SetBitsPerWordFailed {
                    bits,
                    source: std::io::Error::from_raw_os_error(e as i32),
                }
            })?;
        }

        let speed = bus_config.speed_hz();
        unsafe {
            ioctl::spi_ioc_wr_max_speed_hz(fd, &speed).map_err(|e| {
                LinuxSpiError::SetSpeedFailed {
                    speed,
                    source: std::io::Error::from_raw_os_error(e as i32),
                }
            })?;
        }

        log::info!(
            "linux_spi: Configured {} (mode=0x{:02x}, speed={} kHz)",
            self.config.device_path(device.cs),
            mode,
            speed / 1000
        );
        Ok(())
    }

    /// Perform a full-duplex transfer, replacing `buf` with the received bytes
    fn spi_transfer(&mut self, buf: &mut [u8]) -> Result<()> {
        if buf.is_empty() {
            return Err(LinuxSpiError::InvalidParameter(
                "Transfer buffer cannot be empty".into(),
            ));
        }
        if self.max_kernel_buf_size > 0 && buf.len() > self.max_kernel_buf_size {
            return Err(LinuxSpiError::TransferTooLarge {
                len: buf.len(),
                max: self.max_kernel_buf_size,
            });
        }

        let device = self.device.as_ref().ok_or(LinuxSpiError::NotOpen)?;
        let fd = device.file.as_raw_fd();
        let speed_hz = self
            .bus_config
            .map(|c| c.speed_hz())
            .unwrap_or_else(|| BusConfig::ISOSPI.speed_hz());

        let tx = buf.to_vec();
        let transfer = SpiIocTransfer {
            tx_buf: tx.as_ptr() as u64,
            rx_buf: buf.as_mut_ptr() as u64,
            len: buf.len() as u32,
            speed_hz,
            bits_per_word: BITS_PER_WORD,
            ..Default::default()
        };

        let ioctl_num = ioctl::spi_ioc_message(1);
        let ret = unsafe { libc::ioctl(fd, ioctl_num, &transfer as *const SpiIocTransfer) };

        if ret < 0 {
            return Err(LinuxSpiError::TransferFailed(
                std::io::Error::last_os_error(),
            ));
        }

        log::trace!("linux_spi: {:02x?} -> {:02x?}", tx, buf);
        Ok(())
    }
}

/// Log a driver error and hand the sequencer the matching core error
fn to_core(err: LinuxSpiError, core: CoreError) -> CoreError {
    log::error!("linux_spi: {}", err);
    core
}

impl BusTransport for LinuxSpi {
    fn init(&mut self) -> CoreResult<()> {
        self.probe()
            .map_err(|e| to_core(e, CoreError::BusInitFailure))
    }

    fn begin_session(&mut self) -> CoreResult<()> {
        self.open_device(ChipSelect::Cs0)
            .map_err(|e| to_core(e, CoreError::BusSessionFailure))
    }

    fn configure(&mut self, config: &BusConfig) -> CoreResult<()> {
        self.bus_config = Some(*config);
        self.apply(config)
            .map_err(|e| to_core(e, CoreError::TransportFailure(Stage::Configured)))
    }

    fn select_chip(&mut self, cs: ChipSelect) -> CoreResult<()> {
        if self.device.as_ref().map(|d| d.cs) == Some(cs) {
            return Ok(());
        }
        self.open_device(cs)
            .map_err(|e| to_core(e, CoreError::TransportFailure(Stage::Configured)))
    }

    fn transfer_byte(&mut self, byte: u8) -> CoreResult<u8> {
        let mut buf = [byte];
        self.spi_transfer(&mut buf)
            .map_err(|e| to_core(e, CoreError::TransportFailure(Stage::Woken)))?;
        Ok(buf[0])
    }

    fn transfer_in_place(&mut self, buf: &mut [u8]) -> CoreResult<()> {
        self.spi_transfer(buf)
            .map_err(|e| to_core(e, CoreError::TransportFailure(Stage::MainSent)))
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(ms as u64));
    }

    fn end_session(&mut self) -> CoreResult<()> {
        if let Some(device) = self.device.take() {
            log::debug!(
                "linux_spi: Closing {}",
                self.config.device_path(device.cs)
            );
        }
        Ok(())
    }

    fn close(&mut self) -> CoreResult<()> {
        self.device = None;
        self.bus_config = None;
        Ok(())
    }
}

/// Read the maximum kernel buffer size from sysfs, or use page size as fallback
fn get_max_kernel_buf_size() -> usize {
    if let Ok(content) = std::fs::read_to_string(BUF_SIZE_SYSFS) {
        if let Ok(size) = content.trim().parse::<usize>() {
            if size > 0 {
                log::debug!("linux_spi: Using buffer size {} from sysfs", size);
                return size;
            }
        }
        log::warn!("linux_spi: Invalid buffer size in {}", BUF_SIZE_SYSFS);
    } else {
        log::debug!("linux_spi: Cannot read {}, using page size", BUF_SIZE_SYSFS);
    }

    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
    log::debug!("linux_spi: Using page size {} as buffer size", page_size);
    page_size
}

/// Parse transport options from a list of key-value pairs
pub fn parse_options(options: &[(&str, &str)]) -> std::result::Result<LinuxSpiConfig, String> {
    let mut config = LinuxSpiConfig::default();

    for (key, value) in options {
        match *key {
            "bus" => {
                config.bus = value
                    .parse()
                    .map_err(|_| format!("Invalid bus value: {}", value))?;
            }
            "dev" => {
                if value.is_empty() {
                    return Err("Empty dev prefix".to_string());
                }
                config.device_prefix = value.to_string();
            }
            _ => {
                log::warn!("linux_spi: Unknown option: {}={}", key, value);
            }
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use isospi_core::transport::DataMode;

    #[test]
    fn test_mode_flags_for_isospi_profile() {
        let flags = SpiModeFlags::from_config(&BusConfig::ISOSPI, ChipSelect::Cs0);
        assert!(flags.is_empty());
    }

    #[test]
    fn test_mode_flags_per_line() {
        let config = BusConfig {
            bit_order: BitOrder::LsbFirst,
            data_mode: DataMode::Mode3,
            clock_divider: 256,
            cs_polarity: [CsPolarity::ActiveLow, CsPolarity::ActiveHigh],
        };
        assert_eq!(
            SpiModeFlags::from_config(&config, ChipSelect::Cs0),
            SpiModeFlags::CPHA | SpiModeFlags::CPOL | SpiModeFlags::LSB_FIRST
        );
        assert!(SpiModeFlags::from_config(&config, ChipSelect::Cs1).contains(SpiModeFlags::CS_HIGH));
    }

    #[test]
    fn test_device_path() {
        let config = LinuxSpiConfig::new(1);
        assert_eq!(config.device_path(ChipSelect::Cs0), "/dev/spidev1.0");
        assert_eq!(config.device_path(ChipSelect::Cs1), "/dev/spidev1.1");
    }

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[("bus", "2"), ("dev", "/tmp/spidev")]).unwrap();
        assert_eq!(config.device_path(ChipSelect::Cs1), "/tmp/spidev2.1");

        assert!(parse_options(&[("bus", "x")]).is_err());
        assert!(parse_options(&[("dev", "")]).is_err());
    }

    #[test]
    fn test_missing_device_fails_init() {
        let mut spi = LinuxSpi::new(
            LinuxSpiConfig::new(0).with_device_prefix("/nonexistent/isospi-test/spidev"),
        );
        assert_eq!(spi.init(), Err(CoreError::BusInitFailure));
    }

    #[test]
    fn test_transfer_without_session_fails() {
        let mut spi = LinuxSpi::new(LinuxSpiConfig::default());
        let mut buf = [0u8; 4];
        assert!(matches!(
            spi.spi_transfer(&mut buf),
            Err(LinuxSpiError::NotOpen)
        ));
    }

    #[test]
    fn test_transfer_struct_size() {
        assert_eq!(
            std::mem::size_of::<SpiIocTransfer>(),
            ioctl::SPI_IOC_TRANSFER_SIZE
        );
    }
}
