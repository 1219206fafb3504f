//! NTAG I2C 1k memory map as seen from the I2C side.
//!
//! Addresses are block addresses (MEMA). See the NT3H1101 datasheet,
//! section 8.3, for the full memory organization.

use std::ops::RangeInclusive;

/// Size of a single block in bytes.
pub const BLOCK_SIZE: usize = 16;

/// Default 7-bit I2C address of a factory-fresh tag.
pub const DEFAULT_ADDRESS: u8 = 0x55;

/// Serial number, static lock bytes and capability container.
pub const SERIAL_NUMBER_BLOCK: u8 = 0x00;
/// First user memory block.
pub const USER_MEMORY_BLOCK: u8 = 0x01;
/// Last user memory block. Its upper 8 bytes hold the dynamic lock bytes.
pub const DYNAMIC_LOCK_BLOCK: u8 = 0x38;
/// Configuration register block.
pub const CONFIGURATION_BLOCK: u8 = 0x3A;
/// First block of the SRAM mirror.
pub const SRAM_BLOCK: u8 = 0xF8;
/// Session register block.
pub const SESSION_BLOCK: u8 = 0xFE;

/// User memory blocks, dynamic lock block included.
pub const USER_MEMORY: RangeInclusive<u8> = USER_MEMORY_BLOCK..=DYNAMIC_LOCK_BLOCK;

/// Length of the serial number at the start of block 0.
pub const SERIAL_NUMBER_LEN: usize = 7;
/// Offset of the two static lock bytes in block 0.
pub const STATIC_LOCK_OFFSET: usize = 10;
/// Offset of the four capability container bytes in block 0.
pub const CAPABILITY_CONTAINER_OFFSET: usize = 12;
/// Number of meaningful bytes in the configuration and session registers.
pub const REGISTER_LEN: usize = 8;

/// Manufacturer code found in byte 0 of the serial number.
pub const NXP_MANUFACTURER_CODE: u8 = 0x04;

/// Configuration block written by
/// [`NtagI2c::enable_sram_mirroring`](crate::NtagI2c::enable_sram_mirroring).
pub const SRAM_MIRROR_CONFIGURATION: [u8; BLOCK_SIZE] = [
    0x01, 0x00, 0x01, 0x48, 0x08, 0x01, 0x00, 0x00, //
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Session register write switching SRAM mirroring on:
/// block, register offset, mask, value.
// 0x03 is the expected register value with bit 1 set over the default 0x01.
pub const SRAM_MIRROR_SESSION_WRITE: [u8; 4] = [SESSION_BLOCK, 0x00, 0x02, 0x03];

/// One static lock bit and the memory area it locks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockBit {
    /// Index into the two static lock bytes.
    pub byte: usize,
    /// Bit position within that byte.
    pub bit: usize,
    /// Page or page range the bit covers, as labelled in the datasheet.
    pub label: &'static str,
}

const fn lock(byte: usize, bit: usize, label: &'static str) -> LockBit {
    LockBit { byte, bit, label }
}

/// Page lock bits, in table column order.
pub const PAGE_LOCK_BITS: [LockBit; 13] = [
    lock(0, 3, "C-C"),
    lock(0, 4, "4"),
    lock(0, 5, "5"),
    lock(0, 6, "6"),
    lock(0, 7, "7"),
    lock(1, 0, "8"),
    lock(1, 1, "9"),
    lock(1, 2, "10"),
    lock(1, 3, "11"),
    lock(1, 4, "12"),
    lock(1, 5, "13"),
    lock(1, 6, "14"),
    lock(1, 7, "15"),
];

/// Block lock bits, which freeze the page lock bits of their range.
pub const BLOCK_LOCK_BITS: [LockBit; 3] = [
    lock(0, 0, "C-C"),
    lock(0, 1, "4-9"),
    lock(0, 2, "10-15"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_tables_cover_each_bit_once() {
        let mut seen = [0u8; 2];
        for bit in PAGE_LOCK_BITS.iter().chain(BLOCK_LOCK_BITS.iter()) {
            assert_eq!(seen[bit.byte] & (1 << bit.bit), 0, "{bit:?} listed twice");
            seen[bit.byte] |= 1 << bit.bit;
        }
        assert_eq!(seen, [0xFF, 0xFF]);
    }

    #[test]
    fn user_memory_spans_56_blocks() {
        assert_eq!(USER_MEMORY.count(), 56);
    }
}
