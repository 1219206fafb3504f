//! In-memory NTAG I2C 1k that answers on the [`I2c`] trait.
//!
//! Useful for running the driver and its reports without hardware. Only the
//! I2C side of the tag is modelled: there is no RF field, no write
//! protection and no pass-through mode.

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use log::{debug, trace};

use crate::layout::{
    BLOCK_SIZE, CONFIGURATION_BLOCK, DEFAULT_ADDRESS, REGISTER_LEN, SERIAL_NUMBER_BLOCK,
    SESSION_BLOCK,
};

/// Factory content of block 0: serial number, internal bytes, static lock
/// bytes and capability container.
const FACTORY_BLOCK_0: [u8; BLOCK_SIZE] = [
    0x04, 0x5A, 0x2B, 0x8C, 0x71, 0x3F, 0x80, 0x80, 0x00, 0x00, 0x00, 0x00, 0xE1, 0x10, 0x6D,
    0x00,
];

const FACTORY_CONFIGURATION: [u8; REGISTER_LEN] = [0x01, 0x00, 0xF8, 0x48, 0x08, 0x01, 0x00, 0x00];

/// Where the next read is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pointer {
    Block(u8),
    Register(u8),
}

/// One read served by the emulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRecord {
    pub block: u8,
    /// Register offset for session register reads.
    pub register: Option<u8>,
    pub length: usize,
}

#[derive(Debug, Clone)]
pub struct TagEmulator {
    address: u8,
    memory: Box<[[u8; BLOCK_SIZE]; 256]>,
    session: [u8; REGISTER_LEN],
    pointer: Pointer,
    reads: Vec<ReadRecord>,
}

impl Default for TagEmulator {
    fn default() -> Self {
        Self::new(DEFAULT_ADDRESS)
    }
}

impl TagEmulator {
    /// A factory-fresh tag answering at `address`.
    pub fn new(address: u8) -> Self {
        let mut memory = Box::new([[0u8; BLOCK_SIZE]; 256]);
        memory[usize::from(SERIAL_NUMBER_BLOCK)] = FACTORY_BLOCK_0;
        memory[usize::from(CONFIGURATION_BLOCK)][..REGISTER_LEN]
            .copy_from_slice(&FACTORY_CONFIGURATION);
        Self {
            address,
            memory,
            session: FACTORY_CONFIGURATION,
            pointer: Pointer::Block(0),
            reads: Vec::new(),
        }
    }

    pub fn block(&self, address: u8) -> &[u8; BLOCK_SIZE] {
        &self.memory[usize::from(address)]
    }

    pub fn set_block(&mut self, address: u8, data: [u8; BLOCK_SIZE]) {
        self.memory[usize::from(address)] = data;
    }

    pub fn session_register(&self) -> &[u8; REGISTER_LEN] {
        &self.session
    }

    /// Every read served so far, oldest first.
    pub fn reads(&self) -> &[ReadRecord] {
        &self.reads
    }

    fn handle_write(&mut self, frame: &[u8]) -> Result<(), ErrorKind> {
        match *frame {
            [] => Ok(()),
            [SESSION_BLOCK, register] => {
                self.pointer = Pointer::Register(register);
                Ok(())
            }
            [block] => {
                self.pointer = Pointer::Block(block);
                Ok(())
            }
            [block @ (SESSION_BLOCK | CONFIGURATION_BLOCK), register, mask, value] => {
                let register = usize::from(register);
                if register >= REGISTER_LEN {
                    return Err(ErrorKind::Other);
                }
                let target = if block == SESSION_BLOCK {
                    &mut self.session[register]
                } else {
                    &mut self.memory[usize::from(block)][register]
                };
                *target = (*target & !mask) | (value & mask);
                debug!("Masked write {block:#04X}[{register}] = {:#04X}", *target);
                Ok(())
            }
            [block, ref data @ ..] if data.len() == BLOCK_SIZE => {
                self.memory[usize::from(block)].copy_from_slice(data);
                self.pointer = Pointer::Block(block);
                trace!("Block {block:#04X} <- {data:02X?}");
                Ok(())
            }
            _ => Err(ErrorKind::Other),
        }
    }

    fn handle_read(&mut self, buffer: &mut [u8]) -> Result<(), ErrorKind> {
        let (source, record): (&[u8], _) = match self.pointer {
            Pointer::Block(block) => (
                &self.memory[usize::from(block)][..],
                ReadRecord {
                    block,
                    register: None,
                    length: buffer.len(),
                },
            ),
            Pointer::Register(register) => (
                self.session.get(usize::from(register)..).unwrap_or_default(),
                ReadRecord {
                    block: SESSION_BLOCK,
                    register: Some(register),
                    length: buffer.len(),
                },
            ),
        };
        let Some(data) = source.get(..buffer.len()) else {
            return Err(ErrorKind::Other);
        };
        buffer.copy_from_slice(data);
        self.reads.push(record);
        Ok(())
    }
}

impl ErrorType for TagEmulator {
    type Error = ErrorKind;
}

impl I2c for TagEmulator {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != self.address {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        for operation in operations {
            match operation {
                Operation::Write(frame) => self.handle_write(frame)?,
                Operation::Read(buffer) => self.handle_read(buffer)?,
            }
        }
        Ok(())
    }
}
