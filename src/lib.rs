//! Driver for the NXP NTAG I2C dynamic NFC tag, over `embedded-hal` I2C.

mod block_io;
mod config;
mod emulator;
mod error;
pub mod layout;
pub mod menu;
pub mod report;

pub use block_io::NtagI2c;
pub use config::Config;
pub use emulator::{ReadRecord, TagEmulator};
pub use error::Error;
pub use report::{format_hex, format_hex_ascii};
