use std::sync::{
    Mutex, MutexGuard, PoisonError,
    atomic::{AtomicUsize, Ordering},
};

use embedded_hal::i2c::{I2c, SevenBitAddress};

use crate::{BusFault, BusOp, Error};

/// Largest block a single [`Transaction::read_block`] transfers.
pub const MAX_BLOCK_LEN: usize = 32;

/// An I2C bus shared between any number of device drivers.
///
/// The bus hands out one [`Transaction`] at a time. The lock covers the whole bus,
/// not a single address, since the wire itself is the contended resource.
#[derive(Debug)]
pub struct Bus<I> {
    i2c: Mutex<I>,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Number of transactions begun and ended on a [`Bus`].
pub struct BusStats {
    /// Transactions that acquired the bus.
    pub opened: usize,
    /// Transactions that released the bus.
    pub closed: usize,
}

impl<I> Bus<I> {
    /// Wrap an I2C implementation.
    pub fn new(i2c: I) -> Self {
        Self {
            i2c: Mutex::new(i2c),
            opened: AtomicUsize::new(0),
            closed: AtomicUsize::new(0),
        }
    }

    /// Transaction counters since the bus was created.
    pub fn stats(&self) -> BusStats {
        BusStats {
            opened: self.opened.load(Ordering::Acquire),
            closed: self.closed.load(Ordering::Acquire),
        }
    }

    /// Release the underlying I2C implementation.
    pub fn into_inner(self) -> I {
        self.i2c.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
impl<I> Bus<I> {
    /// Reach the I2C implementation outside of a transaction.
    pub(crate) fn with_inner<R>(&self, f: impl FnOnce(&mut I) -> R) -> R {
        f(&mut self.i2c.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl<I: I2c<SevenBitAddress>> Bus<I> {
    /// Take exclusive ownership of the bus and address the device at `address`.
    ///
    /// Blocks until every other transaction on this bus has ended.
    /// The bus is released when the returned [`Transaction`] is dropped or [ended](Transaction::end).
    ///
    /// # Errors
    /// [`Error::InvalidAddress`] if `address` does not fit in 7 bits. The bus is released before returning.
    pub fn begin(&self, address: u8) -> Result<Transaction<'_, I>, Error<I::Error>> {
        // a panicking holder leaves the handle itself intact
        let i2c = self.i2c.lock().unwrap_or_else(PoisonError::into_inner);
        self.opened.fetch_add(1, Ordering::AcqRel);
        let tx = Transaction {
            bus: self,
            i2c,
            address,
        };
        if address > 0x7f {
            log::error!("Cannot address device 0x{address:02x}: not a 7-bit address");
            return Err(Error::InvalidAddress(address));
        }
        Ok(tx)
    }
}

/// Exclusive access to a [`Bus`], bound to one device address.
#[derive(Debug)]
pub struct Transaction<'a, I> {
    bus: &'a Bus<I>,
    i2c: MutexGuard<'a, I>,
    address: u8,
}

impl<I> Transaction<'_, I> {
    /// The device address this transaction talks to.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// End the transaction, releasing the bus.
    pub fn end(self) {}
}

impl<I> Drop for Transaction<'_, I> {
    fn drop(&mut self) {
        self.bus.closed.fetch_add(1, Ordering::AcqRel);
    }
}

impl<I: I2c<SevenBitAddress>> Transaction<'_, I> {
    /// Read a single register.
    pub fn read_byte(&mut self, register: u8) -> Result<u8, BusFault<I::Error>> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[register], &mut buf)
            .map_err(|e| BusFault::new(BusOp::ReadByte, register, e))?;
        Ok(buf[0])
    }

    /// Write a single register.
    pub fn write_byte(&mut self, register: u8, value: u8) -> Result<(), BusFault<I::Error>> {
        self.i2c
            .write(self.address, &[register, value])
            .map_err(|e| BusFault::new(BusOp::WriteByte, register, e))
    }

    /// Read consecutive registers starting at `register` into `buf`.
    ///
    /// At most [`MAX_BLOCK_LEN`] bytes are transferred, longer buffers are only partially filled.
    ///
    /// # Returns
    /// The number of bytes read. Check it before trusting the contents of `buf`.
    pub fn read_block(&mut self, register: u8, buf: &mut [u8]) -> Result<usize, BusFault<I::Error>> {
        let len = buf.len().min(MAX_BLOCK_LEN);
        self.i2c
            .write_read(self.address, &[register], &mut buf[..len])
            .map_err(|e| BusFault::new(BusOp::ReadBlock, register, e))?;
        Ok(len)
    }

    /// Read a 16-bit register pair in SMBus word order (low byte first).
    pub fn read_word(&mut self, register: u8) -> Result<u16, BusFault<I::Error>> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[register], &mut buf)
            .map_err(|e| BusFault::new(BusOp::ReadWord, register, e))?;
        Ok(u16::from_le_bytes(buf))
    }
}
