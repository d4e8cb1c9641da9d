//! Bus transport traits and the fixed bus profile
//!
//! This module defines the trait every SPI bus driver implements and the
//! static configuration the transaction sequencer hands to it.

mod config;
mod traits;

pub use config::*;
pub use traits::*;
