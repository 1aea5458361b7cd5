#![deny(missing_docs)]
//!# BME280 - Driver for the Bosch BME280 Humidity, Pressure and Temperature Sensor
//! This crate provides a driver for the BME280 sensor (and the humidity-less BMP280) on an I2C bus
//! shared between threads. Every register exchange with the sensor runs inside a [`Transaction`]
//! that holds the whole [`Bus`] until it is dropped.
//!
//! Raw readings are compensated with the factory calibration of each sensor into °C, %RH and hPa.
//! Dew point and frost point are derived from temperature and humidity.
mod address;
mod bus;
mod calibration;
mod core;
mod error;
#[cfg(feature = "linux")]
pub mod linux;
mod psychrometry;
mod register;
#[cfg(test)]
mod sim;

pub use address::SlaveAddress;
pub use bus::{Bus, BusStats, MAX_BLOCK_LEN, Transaction};
pub use calibration::{Calibration, h4_from_bytes, h5_from_bytes};
pub use self::core::{Bme280, Bme280Builder};
pub use error::{BusFault, BusOp, Error};
pub use psychrometry::{dew_point, frost_point};
pub use register::{Chip, Filter, Mode, Oversampling, Standby};
