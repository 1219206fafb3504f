use crate::layout::DEFAULT_ADDRESS;

/// Driver configuration, fixed for the lifetime of an [`NtagI2c`](crate::NtagI2c).
#[derive(Debug, Clone, Copy, PartialEq, Eq, bon::Builder)]
pub struct Config {
    /// 7-bit I2C address of the tag.
    #[builder(default = DEFAULT_ADDRESS)]
    pub(crate) address: u8,
    /// Wait after each block write for the EEPROM write cycle.
    #[builder(default = 5)]
    pub(crate) write_cycle_ms: u32,
    /// Wait after each single-byte session register read.
    #[builder(default = 10)]
    pub(crate) session_read_ms: u32,
    /// Wait in [`NtagI2c::init`](crate::NtagI2c::init) before first use.
    #[builder(default = 100)]
    pub(crate) power_up_ms: u32,
}

impl Config {
    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn write_cycle_ms(&self) -> u32 {
        self.write_cycle_ms
    }

    pub fn session_read_ms(&self) -> u32 {
        self.session_read_ms
    }

    pub fn power_up_ms(&self) -> u32 {
        self.power_up_ms
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::builder().build()
    }
}
