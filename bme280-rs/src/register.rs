use bitfield_struct::bitfield;
use embedded_hal::i2c::{I2c, SevenBitAddress};

use crate::{Error, Transaction};

pub(crate) const BME280_CHIP_ID: u8 = 0x60;
pub(crate) const BMP280_CHIP_ID: u8 = 0x58;
pub(crate) const SOFT_RESET_CMD: u8 = 0xB6;

pub(crate) const REG_DIG_T1: u8 = 0x88;
pub(crate) const REG_DIG_T2: u8 = 0x8A;
pub(crate) const REG_DIG_T3: u8 = 0x8C;
pub(crate) const REG_DIG_P1: u8 = 0x8E;
pub(crate) const REG_DIG_P2: u8 = 0x90;
pub(crate) const REG_DIG_P3: u8 = 0x92;
pub(crate) const REG_DIG_P4: u8 = 0x94;
pub(crate) const REG_DIG_P5: u8 = 0x96;
pub(crate) const REG_DIG_P6: u8 = 0x98;
pub(crate) const REG_DIG_P7: u8 = 0x9A;
pub(crate) const REG_DIG_P8: u8 = 0x9C;
pub(crate) const REG_DIG_P9: u8 = 0x9E;
pub(crate) const REG_DIG_H1: u8 = 0xA1;
pub(crate) const REG_DIG_H2: u8 = 0xE1;
pub(crate) const REG_DIG_H3: u8 = 0xE3;
// H4 and H5 share 0xE5, each taking one nibble
pub(crate) const REG_DIG_H4: u8 = 0xE4;
pub(crate) const REG_DIG_H5: u8 = 0xE5;
pub(crate) const REG_DIG_H6: u8 = 0xE7;

pub(crate) const REG_CHIP_ID: u8 = 0xD0;
pub(crate) const REG_SOFT_RESET: u8 = 0xE0;
pub(crate) const REG_CTRL_HUM: u8 = 0xF2;
pub(crate) const REG_STATUS: u8 = 0xF3;
pub(crate) const REG_CTRL_MEAS: u8 = 0xF4;
pub(crate) const REG_CONFIG: u8 = 0xF5;
pub(crate) const REG_PRESSURE_MSB: u8 = 0xF7;
pub(crate) const REG_TEMPERATURE_MSB: u8 = 0xFA;
pub(crate) const REG_HUMIDITY_MSB: u8 = 0xFD;

pub(crate) trait Bme280Register: Default {
    const ADDRESS: u8;

    fn read<I: I2c<SevenBitAddress>>(
        &mut self,
        tx: &mut Transaction<'_, I>,
    ) -> Result<(), Error<I::Error>>;
    fn write<I: I2c<SevenBitAddress>>(
        &mut self,
        _tx: &mut Transaction<'_, I>,
    ) -> Result<(), Error<I::Error>> {
        Err(Error::ReadOnly)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// The sensor variants answering on the bus.
pub enum Chip {
    #[default]
    /// Temperature, pressure and humidity.
    Bme280,
    /// Temperature and pressure only.
    Bmp280,
}

impl Chip {
    /// Identify the chip from the content of its ID register.
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            BME280_CHIP_ID => Some(Chip::Bme280),
            BMP280_CHIP_ID => Some(Chip::Bmp280),
            _ => None,
        }
    }

    /// Whether the chip carries a humidity sensor.
    pub const fn has_humidity(self) -> bool {
        matches!(self, Chip::Bme280)
    }
}

#[derive(Debug, Default)]
pub(crate) struct ChipId(pub(crate) Chip);

impl Bme280Register for ChipId {
    const ADDRESS: u8 = REG_CHIP_ID;

    fn read<I: I2c<SevenBitAddress>>(
        &mut self,
        tx: &mut Transaction<'_, I>,
    ) -> Result<(), Error<I::Error>> {
        let id = tx.read_byte(Self::ADDRESS)?;
        self.0 = Chip::from_id(id).ok_or(Error::InvalidId(id))?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(crate) struct SoftReset;

impl Bme280Register for SoftReset {
    const ADDRESS: u8 = REG_SOFT_RESET;

    // the register always reads back as zero
    fn read<I: I2c<SevenBitAddress>>(
        &mut self,
        tx: &mut Transaction<'_, I>,
    ) -> Result<(), Error<I::Error>> {
        tx.read_byte(Self::ADDRESS)?;
        Ok(())
    }

    fn write<I: I2c<SevenBitAddress>>(
        &mut self,
        tx: &mut Transaction<'_, I>,
    ) -> Result<(), Error<I::Error>> {
        tx.write_byte(Self::ADDRESS, SOFT_RESET_CMD)?;
        Ok(())
    }
}

#[bitfield(u8)]
pub(crate) struct CtrlHum {
    #[bits(3, default = Oversampling::Skipped)]
    pub oversampling: Oversampling,
    #[bits(5, default = 0, access = RO)]
    rsvd: u8,
}

impl Bme280Register for CtrlHum {
    const ADDRESS: u8 = REG_CTRL_HUM;

    fn read<I: I2c<SevenBitAddress>>(
        &mut self,
        tx: &mut Transaction<'_, I>,
    ) -> Result<(), Error<I::Error>> {
        *self = tx.read_byte(Self::ADDRESS)?.into();
        Ok(())
    }

    fn write<I: I2c<SevenBitAddress>>(
        &mut self,
        tx: &mut Transaction<'_, I>,
    ) -> Result<(), Error<I::Error>> {
        tx.write_byte(Self::ADDRESS, self.into_bits())?;
        Ok(())
    }
}

#[bitfield(u8)]
pub(crate) struct Status {
    /// NVM data are being copied to the image registers.
    #[bits(1, access = RO)]
    pub im_update: bool,
    #[bits(2, default = 0, access = RO)]
    rsvd: u8,
    /// A conversion is running.
    #[bits(1, access = RO)]
    pub measuring: bool,
    #[bits(4, default = 0, access = RO)]
    rsvd2: u8,
}

impl Bme280Register for Status {
    const ADDRESS: u8 = REG_STATUS;

    fn read<I: I2c<SevenBitAddress>>(
        &mut self,
        tx: &mut Transaction<'_, I>,
    ) -> Result<(), Error<I::Error>> {
        *self = tx.read_byte(Self::ADDRESS)?.into();
        Ok(())
    }
}

#[bitfield(u8)]
pub(crate) struct CtrlMeas {
    #[bits(2, default = Mode::Sleep)]
    pub mode: Mode,
    #[bits(3, default = Oversampling::Skipped)]
    pub pressure_oversampling: Oversampling,
    #[bits(3, default = Oversampling::Skipped)]
    pub temperature_oversampling: Oversampling,
}

impl Bme280Register for CtrlMeas {
    const ADDRESS: u8 = REG_CTRL_MEAS;

    fn read<I: I2c<SevenBitAddress>>(
        &mut self,
        tx: &mut Transaction<'_, I>,
    ) -> Result<(), Error<I::Error>> {
        *self = tx.read_byte(Self::ADDRESS)?.into();
        Ok(())
    }

    fn write<I: I2c<SevenBitAddress>>(
        &mut self,
        tx: &mut Transaction<'_, I>,
    ) -> Result<(), Error<I::Error>> {
        tx.write_byte(Self::ADDRESS, self.into_bits())?;
        Ok(())
    }
}

#[bitfield(u8)]
pub(crate) struct Config {
    #[bits(1, default = false)]
    pub spi3w_enable: bool,
    #[bits(1, default = false, access = RO)]
    rsvd: bool,
    #[bits(3, default = Filter::Off)]
    pub filter: Filter,
    #[bits(3, default = Standby::Ms0_5)]
    pub standby: Standby,
}

impl Bme280Register for Config {
    const ADDRESS: u8 = REG_CONFIG;

    fn read<I: I2c<SevenBitAddress>>(
        &mut self,
        tx: &mut Transaction<'_, I>,
    ) -> Result<(), Error<I::Error>> {
        *self = tx.read_byte(Self::ADDRESS)?.into();
        Ok(())
    }

    fn write<I: I2c<SevenBitAddress>>(
        &mut self,
        tx: &mut Transaction<'_, I>,
    ) -> Result<(), Error<I::Error>> {
        tx.write_byte(Self::ADDRESS, self.into_bits())?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
/// Number of samples averaged into one reported measurement.
pub enum Oversampling {
    /// The channel is not measured.
    Skipped = 0b000,
    #[default]
    /// One sample.
    X1 = 0b001,
    /// Two samples.
    X2 = 0b010,
    /// Four samples.
    X4 = 0b011,
    /// Eight samples.
    X8 = 0b100,
    /// Sixteen samples.
    X16 = 0b101,
}

impl Oversampling {
    pub(crate) const fn from_bits(bits: u8) -> Self {
        match bits {
            0b000 => Oversampling::Skipped,
            0b001 => Oversampling::X1,
            0b010 => Oversampling::X2,
            0b011 => Oversampling::X4,
            0b100 => Oversampling::X8,
            // 0b110 and 0b111 also select 16 samples
            _ => Oversampling::X16,
        }
    }

    pub(crate) const fn into_bits(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
/// IIR filter coefficient applied to temperature and pressure.
pub enum Filter {
    #[default]
    /// Filter disabled.
    Off = 0b000,
    /// Coefficient 2.
    X2 = 0b001,
    /// Coefficient 4.
    X4 = 0b010,
    /// Coefficient 8.
    X8 = 0b011,
    /// Coefficient 16.
    X16 = 0b100,
}

impl Filter {
    pub(crate) const fn from_bits(bits: u8) -> Self {
        match bits {
            0b000 => Filter::Off,
            0b001 => Filter::X2,
            0b010 => Filter::X4,
            0b011 => Filter::X8,
            _ => Filter::X16,
        }
    }

    pub(crate) const fn into_bits(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
/// Power mode of the sensor.
pub enum Mode {
    #[default]
    /// No measurements are taken.
    Sleep = 0b00,
    /// A single measurement is taken, then the sensor returns to sleep.
    Forced = 0b01,
    /// Measurements are taken continuously, separated by the standby time.
    Normal = 0b11,
}

impl Mode {
    pub(crate) const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Mode::Sleep,
            0b11 => Mode::Normal,
            _ => Mode::Forced,
        }
    }

    pub(crate) const fn into_bits(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
/// Inactive time between two measurements in [`Mode::Normal`].
pub enum Standby {
    #[default]
    /// 0.5 milliseconds.
    Ms0_5 = 0b000,
    /// 62.5 milliseconds.
    Ms62_5 = 0b001,
    /// 125 milliseconds.
    Ms125 = 0b010,
    /// 250 milliseconds.
    Ms250 = 0b011,
    /// 500 milliseconds.
    Ms500 = 0b100,
    /// 1 second.
    Ms1000 = 0b101,
    /// 10 milliseconds.
    Ms10 = 0b110,
    /// 20 milliseconds.
    Ms20 = 0b111,
}

impl Standby {
    pub(crate) const fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0b000 => Standby::Ms0_5,
            0b001 => Standby::Ms62_5,
            0b010 => Standby::Ms125,
            0b011 => Standby::Ms250,
            0b100 => Standby::Ms500,
            0b101 => Standby::Ms1000,
            0b110 => Standby::Ms10,
            _ => Standby::Ms20,
        }
    }

    pub(crate) const fn into_bits(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
#[allow(clippy::unusual_byte_groupings)]
mod tests {
    use super::*;

    #[test]
    fn ctrl_meas_layout() {
        let reg = CtrlMeas::new()
            .with_temperature_oversampling(Oversampling::X2)
            .with_pressure_oversampling(Oversampling::X16)
            .with_mode(Mode::Normal);
        assert_eq!(reg.into_bits(), 0b010_101_11);
    }

    #[test]
    fn config_filter_keeps_other_bits() {
        let mut reg = Config::from_bits(0b111_000_0_1);
        reg.set_filter(Filter::X4);
        assert_eq!(reg.into_bits(), 0b111_010_0_1);
        assert_eq!(reg.standby(), Standby::Ms20);
    }

    #[test]
    fn status_bits() {
        let status = Status::from_bits(0b0000_1001);
        assert!(status.im_update());
        assert!(status.measuring());
    }

    #[test]
    fn both_forced_encodings_decode_as_forced() {
        assert_eq!(CtrlMeas::from_bits(0b01).mode(), Mode::Forced);
        assert_eq!(CtrlMeas::from_bits(0b10).mode(), Mode::Forced);
    }

    #[test]
    fn chip_ids() {
        assert_eq!(Chip::from_id(0x60), Some(Chip::Bme280));
        assert_eq!(Chip::from_id(0x58), Some(Chip::Bmp280));
        assert_eq!(Chip::from_id(0x00), None);
        assert!(!Chip::Bmp280.has_humidity());
    }
}
