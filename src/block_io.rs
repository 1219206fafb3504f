use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{debug, trace, warn};

use crate::layout::{
    BLOCK_SIZE, CONFIGURATION_BLOCK, DYNAMIC_LOCK_BLOCK, SESSION_BLOCK, SRAM_BLOCK,
    SRAM_MIRROR_CONFIGURATION, SRAM_MIRROR_SESSION_WRITE, USER_MEMORY_BLOCK,
};
use crate::{Config, Error};

/// Blocks cleared by [`NtagI2c::clean_user_memory`] before the dynamic lock block.
const CLEANED_BLOCKS: usize = 55;

/// NTAG I2C driver. Owns the bus and a delay source.
pub struct NtagI2c<I2C, D> {
    i2c: I2C,
    delay: D,
    config: Config,
}

impl<I2C, D> NtagI2c<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    pub fn new(i2c: I2C, delay: D, config: Config) -> Self {
        Self { i2c, delay, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Give the bus and delay back.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    /// Wait for the tag to power up.
    pub fn init(&mut self) {
        debug!("Waiting {} ms for tag power-up", self.config.power_up_ms);
        self.delay.delay_ms(self.config.power_up_ms);
    }

    /// Read up to one block from `address`.
    ///
    /// Requests longer than [`BLOCK_SIZE`] are cut down to a single block.
    pub fn read_block(
        &mut self,
        address: u8,
        max_length: usize,
    ) -> Result<Vec<u8>, Error<I2C::Error>> {
        let length = max_length.min(BLOCK_SIZE);
        if length < max_length {
            debug!("Read of {max_length} bytes at {address:#04X} truncated to {length}");
        }
        debug!("Read block {address:#04X} r:{length}");

        let mut buffer = vec![0u8; length];
        self.i2c.write(self.config.address, &[address]).map_err(Error::Bus)?;
        self.i2c.read(self.config.address, &mut buffer).map_err(Error::Bus)?;
        trace!("{address:#04X}: {buffer:02X?}");
        Ok(buffer)
    }

    /// Like [`read_block`](Self::read_block), but fails instead of truncating.
    pub fn try_read_block(
        &mut self,
        address: u8,
        length: usize,
    ) -> Result<Vec<u8>, Error<I2C::Error>> {
        if length > BLOCK_SIZE {
            return Err(Error::Truncated {
                requested: length,
                limit: BLOCK_SIZE,
            });
        }
        self.read_block(address, length)
    }

    /// Read a block, substituting zero bytes if the transaction fails.
    pub(crate) fn read_block_or_zeroed(&mut self, address: u8, length: usize) -> Vec<u8> {
        self.read_block(address, length).unwrap_or_else(|_| {
            warn!("Read of block {address:#04X} failed, using zeroed data");
            vec![0u8; length.min(BLOCK_SIZE)]
        })
    }

    /// Write one block. `data` beyond [`BLOCK_SIZE`] is dropped and a short
    /// `data` is zero-padded, as the tag only accepts whole blocks.
    pub fn write_block(&mut self, address: u8, data: &[u8]) -> Result<(), Error<I2C::Error>> {
        let data = &data[..data.len().min(BLOCK_SIZE)];
        debug!("Write block {address:#04X} w:{}", data.len());
        trace!("{address:#04X}: {data:02X?}");

        let mut frame = [0u8; BLOCK_SIZE + 1];
        frame[0] = address;
        frame[1..=data.len()].copy_from_slice(data);
        self.i2c.write(self.config.address, &frame).map_err(Error::Bus)?;
        self.delay.delay_ms(self.config.write_cycle_ms);
        Ok(())
    }

    /// Like [`write_block`](Self::write_block), but fails instead of truncating.
    pub fn try_write_block(&mut self, address: u8, data: &[u8]) -> Result<(), Error<I2C::Error>> {
        if data.len() > BLOCK_SIZE {
            return Err(Error::Truncated {
                requested: data.len(),
                limit: BLOCK_SIZE,
            });
        }
        self.write_block(address, data)
    }

    pub fn clear_block(&mut self, address: u8) -> Result<(), Error<I2C::Error>> {
        self.write_block(address, &[0u8; BLOCK_SIZE])
    }

    /// Zero `block_count` blocks starting at `first_block`.
    ///
    /// Every block is attempted; the first failure is returned at the end.
    pub fn clear_region(
        &mut self,
        first_block: u8,
        block_count: usize,
    ) -> Result<(), Error<I2C::Error>> {
        check_region(first_block, block_count)?;
        let mut result = Ok(());
        for address in block_addresses(first_block, block_count) {
            let res = self.clear_block(address);
            result = keep_first_error(result, res, address);
        }
        result
    }

    /// Zero the whole user memory, dynamic lock bytes included.
    pub fn clean_user_memory(&mut self) -> Result<(), Error<I2C::Error>> {
        let region = self.clear_region(USER_MEMORY_BLOCK, CLEANED_BLOCKS);
        let lock = self.clear_block(DYNAMIC_LOCK_BLOCK);
        region.and(lock)
    }

    /// Spread `data` over consecutive blocks from `base_address`.
    ///
    /// Writes `len / 16` full blocks, then one last block with the
    /// remaining `len % 16` bytes, which may be none.
    ///
    /// Every block is attempted; the first failure is returned at the end.
    pub fn write_region(&mut self, base_address: u8, data: &[u8]) -> Result<(), Error<I2C::Error>> {
        let full_blocks = data.len() / BLOCK_SIZE;
        let remainder = data.len() % BLOCK_SIZE;
        check_region(base_address, full_blocks + 1)?;
        debug!("Write region {base_address:#04X}: {full_blocks} blocks + {remainder} bytes");

        let mut result = Ok(());
        let blocks = block_addresses(base_address, full_blocks).zip(data.chunks_exact(BLOCK_SIZE));
        for (address, chunk) in blocks {
            let res = self.write_block(address, chunk);
            result = keep_first_error(result, res, address);
        }
        // Bounded by check_region above.
        let last = base_address + full_blocks as u8;
        let res = self.write_block(last, &data[full_blocks * BLOCK_SIZE..]);
        keep_first_error(result, res, last)
    }

    /// Write `data` into user memory from block 0x01.
    pub fn write_user_memory(&mut self, data: &[u8]) -> Result<(), Error<I2C::Error>> {
        self.write_region(USER_MEMORY_BLOCK, data)
    }

    /// Write `data` into the SRAM mirror from block 0xF8.
    pub fn write_sram(&mut self, data: &[u8]) -> Result<(), Error<I2C::Error>> {
        self.write_region(SRAM_BLOCK, data)
    }

    /// Turn on SRAM mirroring.
    ///
    /// Rewrites the configuration block, then sets the mirror bit of the
    /// session register with a single masked register write.
    pub fn enable_sram_mirroring(&mut self) -> Result<(), Error<I2C::Error>> {
        debug!("Enabling SRAM mirroring");
        let configuration = self.write_block(CONFIGURATION_BLOCK, &SRAM_MIRROR_CONFIGURATION);
        if configuration.is_err() {
            warn!("Configuration block write failed, still setting the session register");
        }
        let session = self
            .i2c
            .write(self.config.address, &SRAM_MIRROR_SESSION_WRITE)
            .map_err(Error::Bus);
        configuration.and(session)
    }

    /// Read one byte of the session register.
    ///
    /// The read is issued even when setting the register pointer fails.
    pub fn read_session_byte(&mut self, offset: u8) -> Result<u8, Error<I2C::Error>> {
        let mut buffer = [0u8; 1];
        let pointer = self.i2c.write(self.config.address, &[SESSION_BLOCK, offset]);
        let read = self.i2c.read(self.config.address, &mut buffer);
        self.delay.delay_ms(self.config.session_read_ms);
        pointer.and(read).map_err(Error::Bus)?;
        trace!("Session register {offset}: {:#04X}", buffer[0]);
        Ok(buffer[0])
    }
}

fn check_region<E>(base: u8, blocks: usize) -> Result<(), Error<E>> {
    let end = usize::from(base).checked_add(blocks);
    if end.map_or(true, |end| end > 0x100) {
        return Err(Error::AddressOverflow { base, blocks });
    }
    Ok(())
}

/// `count` consecutive block addresses from `base`. Callers check the
/// region with [`check_region`] first.
fn block_addresses(base: u8, count: usize) -> impl Iterator<Item = u8> {
    (usize::from(base)..usize::from(base) + count).map(|address| address as u8)
}

fn keep_first_error<E>(
    previous: Result<(), Error<E>>,
    current: Result<(), Error<E>>,
    address: u8,
) -> Result<(), Error<E>> {
    if current.is_err() {
        warn!("Write of block {address:#04X} failed, continuing");
    }
    previous.and(current)
}

#[cfg(test)]
mod tests {
    use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};

    use super::*;

    const ADDR: u8 = 0x55;

    fn tag(expectations: &[Transaction]) -> (NtagI2c<I2cMock, NoopDelay>, I2cMock) {
        let i2c = I2cMock::new(expectations);
        let tag = NtagI2c::new(i2c.clone(), NoopDelay::new(), Config::default());
        (tag, i2c)
    }

    fn block_frame(address: u8, data: &[u8]) -> Vec<u8> {
        let mut frame = vec![address];
        frame.extend_from_slice(data);
        frame.resize(BLOCK_SIZE + 1, 0);
        frame
    }

    #[test]
    fn read_block_truncates_to_one_block() {
        let data: Vec<u8> = (0..16).collect();
        let (mut tag, mut i2c) = tag(&[
            Transaction::write(ADDR, vec![0x10]),
            Transaction::read(ADDR, data.clone()),
        ]);
        assert_eq!(tag.read_block(0x10, 40).unwrap(), data);
        i2c.done();
    }

    #[test]
    fn read_block_reads_requested_length() {
        let (mut tag, mut i2c) = tag(&[
            Transaction::write(ADDR, vec![0x3A]),
            Transaction::read(ADDR, vec![1, 0, 0xF8, 0x48, 8, 1, 0, 0]),
        ]);
        assert_eq!(tag.read_block(0x3A, 8).unwrap().len(), 8);
        i2c.done();
    }

    #[test]
    fn try_read_block_rejects_oversized_request() {
        let (mut tag, mut i2c) = tag(&[]);
        let err = tag.try_read_block(0x01, 17).unwrap_err();
        assert_eq!(
            err,
            Error::Truncated {
                requested: 17,
                limit: 16
            }
        );
        i2c.done();
    }

    #[test]
    fn read_block_reports_nack() {
        let nack = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address);
        let (mut tag, mut i2c) = tag(&[Transaction::write(ADDR, vec![0x00]).with_error(nack)]);
        let err = tag.read_block(0x00, 16).unwrap_err();
        assert_eq!(err.bus(), Some(&nack));
        assert_eq!(err, Error::Bus(nack));
        i2c.done();
    }

    #[test]
    fn write_block_pads_short_data() {
        let (mut tag, mut i2c) = tag(&[Transaction::write(
            ADDR,
            block_frame(0x05, &[0xDE, 0xAD]),
        )]);
        tag.write_block(0x05, &[0xDE, 0xAD]).unwrap();
        i2c.done();
    }

    #[test]
    fn write_block_drops_bytes_past_the_block() {
        let data = [0xAB; 20];
        let (mut tag, mut i2c) = tag(&[Transaction::write(ADDR, block_frame(0x05, &[0xAB; 16]))]);
        tag.write_block(0x05, &data).unwrap();
        i2c.done();

        let (mut tag, mut i2c) = self::tag(&[]);
        assert!(matches!(
            tag.try_write_block(0x05, &data),
            Err(Error::Truncated { requested: 20, .. })
        ));
        i2c.done();
    }

    #[test]
    fn clear_region_zeroes_each_block() {
        let expectations: Vec<_> = (0x10..0x13)
            .map(|address| Transaction::write(ADDR, block_frame(address, &[])))
            .collect();
        let (mut tag, mut i2c) = tag(&expectations);
        tag.clear_region(0x10, 3).unwrap();
        i2c.done();
    }

    #[test]
    fn clean_user_memory_covers_blocks_1_to_56() {
        let expectations: Vec<_> = (1..=55)
            .chain([DYNAMIC_LOCK_BLOCK])
            .map(|address| Transaction::write(ADDR, block_frame(address, &[])))
            .collect();
        let (mut tag, mut i2c) = tag(&expectations);
        tag.clean_user_memory().unwrap();
        i2c.done();
    }

    #[test]
    fn write_region_splits_into_blocks() {
        let data: Vec<u8> = (0..33).collect();
        let (mut tag, mut i2c) = tag(&[
            Transaction::write(ADDR, block_frame(1, &data[..16])),
            Transaction::write(ADDR, block_frame(2, &data[16..32])),
            Transaction::write(ADDR, block_frame(3, &data[32..])),
        ]);
        tag.write_region(1, &data).unwrap();
        i2c.done();
    }

    #[test]
    fn write_region_ends_with_empty_block_on_exact_fit() {
        let data = [0x11; 16];
        let (mut tag, mut i2c) = tag(&[
            Transaction::write(ADDR, block_frame(0xF8, &data)),
            Transaction::write(ADDR, block_frame(0xF9, &[])),
        ]);
        tag.write_sram(&data).unwrap();
        i2c.done();
    }

    #[test]
    fn write_region_keeps_going_after_a_failed_block() {
        let data = [0x22; 20];
        let (mut tag, mut i2c) = tag(&[
            Transaction::write(ADDR, block_frame(1, &data[..16])).with_error(ErrorKind::Bus),
            Transaction::write(ADDR, block_frame(2, &data[16..])),
        ]);
        assert_eq!(tag.write_user_memory(&data), Err(Error::Bus(ErrorKind::Bus)));
        i2c.done();
    }

    #[test]
    fn write_region_rejects_overflow_before_writing() {
        let (mut tag, mut i2c) = tag(&[]);
        assert_eq!(
            tag.write_region(0xFF, &[0; 16]),
            Err(Error::AddressOverflow {
                base: 0xFF,
                blocks: 2
            })
        );
        i2c.done();
    }

    #[test]
    fn enable_sram_mirroring_sends_fixed_sequence() {
        let (mut tag, mut i2c) = tag(&[
            Transaction::write(ADDR, block_frame(0x3A, &SRAM_MIRROR_CONFIGURATION)),
            Transaction::write(ADDR, vec![0xFE, 0x00, 0x02, 0x03]),
        ]);
        tag.enable_sram_mirroring().unwrap();
        i2c.done();
    }

    #[test]
    fn enable_sram_mirroring_sets_session_bit_after_failed_configuration() {
        let (mut tag, mut i2c) = tag(&[
            Transaction::write(ADDR, block_frame(0x3A, &SRAM_MIRROR_CONFIGURATION))
                .with_error(ErrorKind::Bus),
            Transaction::write(ADDR, vec![0xFE, 0x00, 0x02, 0x03]),
        ]);
        assert_eq!(tag.enable_sram_mirroring(), Err(Error::Bus(ErrorKind::Bus)));
        i2c.done();
    }

    #[test]
    fn session_byte_is_read_after_failed_pointer_write() {
        let (mut tag, mut i2c) = tag(&[
            Transaction::write(ADDR, vec![0xFE, 5]).with_error(ErrorKind::Bus),
            Transaction::read(ADDR, vec![0x00]),
        ]);
        assert_eq!(tag.read_session_byte(5), Err(Error::Bus(ErrorKind::Bus)));
        i2c.done();
    }

    #[test]
    fn clear_region_rejects_huge_block_count() {
        let (mut tag, mut i2c) = tag(&[]);
        assert_eq!(
            tag.clear_region(1, usize::MAX),
            Err(Error::AddressOverflow {
                base: 1,
                blocks: usize::MAX
            })
        );
        i2c.done();
    }

    #[test]
    fn uses_configured_address() {
        let i2c = I2cMock::new(&[
            Transaction::write(0x2A, vec![0xFE, 3]),
            Transaction::read(0x2A, vec![0x7F]),
        ]);
        let config = Config::builder().address(0x2A).build();
        let mut tag = NtagI2c::new(i2c, NoopDelay::new(), config);
        assert_eq!(tag.config().address(), 0x2A);
        assert_eq!(tag.read_session_byte(3).unwrap(), 0x7F);
        let (mut i2c, _) = tag.release();
        i2c.done();
    }
}
