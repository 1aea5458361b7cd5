use std::fmt;

use embedded_hal::i2c::ErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The bus primitive that was running when a [`BusFault`] occurred.
pub enum BusOp {
    /// Opening the bus character device.
    Open,
    /// Single byte register read.
    ReadByte,
    /// Single byte register write.
    WriteByte,
    /// Contiguous register block read.
    ReadBlock,
    /// 16-bit register read.
    ReadWord,
}

#[derive(Debug)]
/// A failure reported by the underlying bus, with the operation that failed.
pub struct BusFault<E> {
    /// The operation that failed.
    pub op: BusOp,
    /// The register addressed by the operation, if any.
    pub register: Option<u8>,
    /// The error reported by the bus implementation.
    pub source: E,
}

impl<E> BusFault<E> {
    pub(crate) fn new(op: BusOp, register: u8, source: E) -> Self {
        Self {
            op,
            register: Some(register),
            source,
        }
    }
}

impl<E: embedded_hal::i2c::Error> BusFault<E> {
    /// The generic classification of the bus error.
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

impl<E: fmt::Debug> fmt::Display for BusFault<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.register {
            Some(reg) => write!(f, "{:?} of register 0x{reg:02x} failed: {:?}", self.op, self.source),
            None => write!(f, "{:?} failed: {:?}", self.op, self.source),
        }
    }
}

impl<E: fmt::Debug> std::error::Error for BusFault<E> {}

#[derive(Debug)]
/// Represents errors that can occur while interacting with the BME280 sensor.
pub enum Error<E> {
    /// An error occurred while communicating with the I2C bus.
    Bus(BusFault<E>),
    /// The slave address does not fit in 7 bits.
    InvalidAddress(u8),
    /// The identity register holds an unknown chip ID.
    InvalidId(u8),
    /// A block read returned fewer bytes than the measurement needs.
    ShortRead {
        /// First register of the block.
        register: u8,
        /// Bytes needed.
        expected: usize,
        /// Bytes delivered by the bus.
        actual: usize,
    },
    /// Attempted to write to a register that is not writable.
    ReadOnly,
    /// The operation is not possible in the current state of the driver.
    InvalidOperation,
    /// The sensor did not leave a busy state in time.
    Timeout,
}

impl<E> From<BusFault<E>> for Error<E> {
    fn from(e: BusFault<E>) -> Self {
        Error::Bus(e)
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Bus(fault) => write!(f, "bus fault: {fault}"),
            Error::InvalidAddress(addr) => write!(f, "invalid slave address 0x{addr:02x}"),
            Error::InvalidId(id) => write!(f, "unknown chip ID 0x{id:02x}"),
            Error::ShortRead {
                register,
                expected,
                actual,
            } => write!(
                f,
                "short read at register 0x{register:02x}: {actual} of {expected} bytes"
            ),
            Error::ReadOnly => write!(f, "register is read-only"),
            Error::InvalidOperation => write!(f, "invalid operation"),
            Error::Timeout => write!(f, "timed out"),
        }
    }
}

impl<E: fmt::Debug> std::error::Error for Error<E> {}
