//! Human-readable dumps of the tag's fixed regions.
//!
//! Every report writes into any [`core::fmt::Write`] sink. Reads that fail on
//! the bus are logged and shown as zero bytes so a report always completes.

use std::fmt::Write;

use bit_field::BitField;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::warn;

use crate::layout::{
    LockBit, BLOCK_LOCK_BITS, BLOCK_SIZE, CAPABILITY_CONTAINER_OFFSET, CONFIGURATION_BLOCK,
    NXP_MANUFACTURER_CODE, PAGE_LOCK_BITS, REGISTER_LEN, SERIAL_NUMBER_BLOCK, SERIAL_NUMBER_LEN,
    STATIC_LOCK_OFFSET,
};
use crate::{Error, NtagI2c};

const RULE: &str = "------------------------------------------------------------------";

/// Last user memory block read as a full block by [`NtagI2c::dump_user_memory`].
const DUMP_LAST_FULL_BLOCK: u8 = 54;
/// Block read as a half block at the end of the dump.
const DUMP_TAIL_BLOCK: u8 = 56;
const DUMP_TAIL_LEN: usize = 8;

/// Render `bytes` as space-terminated upper-case hex tokens, e.g. `"0x04 0x9F "`.
pub fn format_hex(bytes: &[u8], with_prefix: bool) -> String {
    let prefix = if with_prefix { "0x" } else { "" };
    bytes
        .iter()
        .map(|byte| format!("{prefix}{byte:02X} "))
        .collect()
}

/// Render `bytes` as a hex dump line with an ASCII column.
///
/// Short lines are padded so the ASCII column lines up with full blocks.
pub fn format_hex_ascii(bytes: &[u8]) -> String {
    let mut text = format_hex(bytes, false);
    let missing = BLOCK_SIZE.saturating_sub(bytes.len());
    text.extend(std::iter::repeat(' ').take(missing * 3));
    text.push_str("  [");
    text.extend(bytes.iter().map(|&byte| match byte {
        20..=127 => char::from(byte),
        _ => '.',
    }));
    text.push(']');
    text
}

fn center(label: &str, width: usize) -> String {
    let pad = width.saturating_sub(label.len());
    let left = (pad + 1) / 2;
    format!("{}{label}{}", " ".repeat(left), " ".repeat(pad - left))
}

fn write_lock_table(
    out: &mut impl Write,
    title: &str,
    bits: &[LockBit],
    width: usize,
    lock_bytes: [u8; 2],
) -> std::fmt::Result {
    let mut border = String::from("+------------+");
    let mut header = format!("|{title}|");
    let mut status = String::from("|   Status   |");
    for lock in bits {
        border.push_str(&"-".repeat(width));
        border.push('+');
        header.push_str(&center(lock.label, width));
        header.push('|');
        let locked = lock_bytes[lock.byte].get_bit(lock.bit);
        status.push_str(&center(if locked { "1" } else { "0" }, width));
        status.push('|');
    }
    writeln!(out, "{border}")?;
    writeln!(out, "{header}")?;
    writeln!(out, "{border}")?;
    writeln!(out, "{status}")?;
    writeln!(out, "{border}")
}

impl<I2C, D> NtagI2c<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    pub fn read_serial_number(&mut self) -> [u8; SERIAL_NUMBER_LEN] {
        let mut serial = [0u8; SERIAL_NUMBER_LEN];
        serial.copy_from_slice(&self.read_block_or_zeroed(SERIAL_NUMBER_BLOCK, SERIAL_NUMBER_LEN));
        serial
    }

    pub fn read_static_lock_bytes(&mut self) -> [u8; 2] {
        let block = self.read_block_or_zeroed(SERIAL_NUMBER_BLOCK, BLOCK_SIZE);
        [block[STATIC_LOCK_OFFSET], block[STATIC_LOCK_OFFSET + 1]]
    }

    pub fn read_capability_container(&mut self) -> [u8; 4] {
        let block = self.read_block_or_zeroed(SERIAL_NUMBER_BLOCK, BLOCK_SIZE);
        let mut cc = [0u8; 4];
        cc.copy_from_slice(&block[CAPABILITY_CONTAINER_OFFSET..][..4]);
        cc
    }

    pub fn read_configuration_register(&mut self) -> [u8; REGISTER_LEN] {
        let mut register = [0u8; REGISTER_LEN];
        register.copy_from_slice(&self.read_block_or_zeroed(CONFIGURATION_BLOCK, REGISTER_LEN));
        register
    }

    /// Read the session register one byte per exchange, as the tag requires.
    pub fn read_session_register(&mut self) -> [u8; REGISTER_LEN] {
        let mut register = [0u8; REGISTER_LEN];
        for (offset, byte) in (0u8..).zip(register.iter_mut()) {
            *byte = self.read_session_byte(offset).unwrap_or_else(|_| {
                warn!("Read of session register byte {offset} failed, using 0x00");
                0
            });
        }
        register
    }

    pub fn serial_number(&mut self, out: &mut impl Write) -> Result<(), Error<I2C::Error>> {
        let serial = self.read_serial_number();
        writeln!(out)?;
        writeln!(out, "{RULE}")?;
        writeln!(out, "   NTAG I2C Serial Number : {}", format_hex(&serial, true))?;
        writeln!(out)?;
        writeln!(
            out,
            "First byte is manufacturer code (NXP = {NXP_MANUFACTURER_CODE:#04X})"
        )?;
        writeln!(out, "{RULE}")?;
        Ok(())
    }

    pub fn static_lock_status(&mut self, out: &mut impl Write) -> Result<(), Error<I2C::Error>> {
        let lock_bytes = self.read_static_lock_bytes();
        writeln!(out)?;
        writeln!(out, "{RULE}")?;
        writeln!(
            out,
            "                 Static Lock Bytes :{}",
            format_hex(&lock_bytes, true)
        )?;
        writeln!(out)?;
        write_lock_table(out, "Locked pages", &PAGE_LOCK_BITS, 3, lock_bytes)?;
        writeln!(out)?;
        writeln!(out, "                  Static Block Lock Bytes")?;
        writeln!(out)?;
        write_lock_table(out, "Block Locker", &BLOCK_LOCK_BITS, 5, lock_bytes)?;
        Ok(())
    }

    pub fn capability_container(&mut self, out: &mut impl Write) -> Result<(), Error<I2C::Error>> {
        let cc = self.read_capability_container();
        writeln!(out, "{RULE}")?;
        writeln!(out, "Capability Container : {}", format_hex(&cc, true))?;
        writeln!(out)?;
        Ok(())
    }

    pub fn configuration_status(&mut self, out: &mut impl Write) -> Result<(), Error<I2C::Error>> {
        let register = self.read_configuration_register();
        writeln!(out, "{RULE}")?;
        writeln!(out, "Configuration Register : {}", format_hex(&register, true))?;
        writeln!(out)?;
        Ok(())
    }

    pub fn session_status(&mut self, out: &mut impl Write) -> Result<(), Error<I2C::Error>> {
        let register = self.read_session_register();
        writeln!(out, "{RULE}")?;
        writeln!(out, "Session Register : {}", format_hex(&register, true))?;
        writeln!(out)?;
        Ok(())
    }

    /// Serial number, capability container, lock, configuration and session
    /// reports, in that order.
    pub fn full_report(&mut self, out: &mut impl Write) -> Result<(), Error<I2C::Error>> {
        self.serial_number(out)?;
        self.capability_container(out)?;
        self.static_lock_status(out)?;
        self.configuration_status(out)?;
        self.session_status(out)
    }

    /// Hex dump of user memory: blocks 1 to 54, then the first half of block 56.
    pub fn dump_user_memory(&mut self, out: &mut impl Write) -> Result<(), Error<I2C::Error>> {
        // Block 55 is not part of the dump.
        for address in 1..=DUMP_LAST_FULL_BLOCK {
            let block = self.read_block_or_zeroed(address, BLOCK_SIZE);
            writeln!(out, "{}", format_hex_ascii(&block))?;
        }
        let tail = self.read_block_or_zeroed(DUMP_TAIL_BLOCK, DUMP_TAIL_LEN);
        writeln!(out, "{}", format_hex_ascii(&tail))?;
        writeln!(out)?;
        Ok(())
    }
}
