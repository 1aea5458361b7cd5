//! Access to the sensor through a Linux `/dev/i2c-N` character device.
use std::path::Path;

pub use i2cdev::linux::LinuxI2CError;
pub use linux_embedded_hal::{Delay, I2cdev};

use crate::{Bus, BusFault, BusOp};

/// Open the I2C bus at `path` (e.g. `/dev/i2c-1`).
///
/// # Errors
/// A [`BusFault`] with [`BusOp::Open`] carrying the OS error when the device cannot be opened.
pub fn open<P: AsRef<Path>>(path: P) -> Result<Bus<I2cdev>, BusFault<LinuxI2CError>> {
    let path = path.as_ref();
    let i2c = I2cdev::new(path).map_err(|source| BusFault {
        op: BusOp::Open,
        register: None,
        source,
    })?;
    log::info!("[BUS] {}> Opened", path.display());
    Ok(Bus::new(i2c))
}
