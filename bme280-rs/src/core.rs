use embedded_hal::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};

use crate::{
    Bus, Calibration, Chip, Error,
    address::SlaveAddress,
    calibration::adc20,
    psychrometry,
    register::{
        Bme280Register, ChipId, Config, CtrlHum, CtrlMeas, Filter, Mode, Oversampling,
        REG_HUMIDITY_MSB, REG_PRESSURE_MSB, REG_TEMPERATURE_MSB, SoftReset, Standby, Status,
    },
};

/// Power-up time before the sensor answers reliably.
const STARTUP_DELAY_MS: u32 = 2;
/// Interval between two polls of the calibration-loading flag.
const CALIBRATION_POLL_MS: u32 = 1;
/// Time for the first measurement cycle after configuration.
const SETTLE_DELAY_MS: u32 = 3;

/// Represents a BME280 (or BMP280) sensor on a shared [`Bus`].
pub struct Bme280<'a, I> {
    pub(crate) bus: &'a Bus<I>,
    pub(crate) address: u8,
    pub(crate) chip: Chip,
    pub(crate) calibration: Calibration,
    pub(crate) t_fine: Option<i32>,
}

#[derive(Debug, Default)]
/// Builder for a BME280 sensor.
pub struct Bme280Builder {
    pub(crate) address: SlaveAddress,
    pub(crate) tos: Oversampling,
    pub(crate) hos: Oversampling,
    pub(crate) pos: Oversampling,
    pub(crate) filter: Filter,
    pub(crate) standby: Option<Standby>,
    pub(crate) poll_limit: Option<u32>,
}

impl Bme280Builder {
    /// Set the address of the BME280 sensor.
    pub fn with_address(mut self, address: SlaveAddress) -> Self {
        self.address = address;
        self
    }

    /// Set the temperature oversampling. Defaults to [`Oversampling::X1`].
    pub fn with_temperature_oversampling(mut self, oversampling: Oversampling) -> Self {
        self.tos = oversampling;
        self
    }

    /// Set the humidity oversampling. Defaults to [`Oversampling::X1`].
    pub fn with_humidity_oversampling(mut self, oversampling: Oversampling) -> Self {
        self.hos = oversampling;
        self
    }

    /// Set the pressure oversampling. Defaults to [`Oversampling::X1`].
    pub fn with_pressure_oversampling(mut self, oversampling: Oversampling) -> Self {
        self.pos = oversampling;
        self
    }

    /// Set the IIR filter coefficient. Defaults to [`Filter::Off`].
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Set the standby time between measurements in normal mode.
    /// Left as found in the device when not set.
    pub fn with_standby(mut self, standby: Standby) -> Self {
        self.standby = Some(standby);
        self
    }

    /// Give up with [`Error::Timeout`] if the calibration image is still loading after `limit` polls,
    /// one millisecond apart.
    ///
    /// With `None`, the default, the builder waits for as long as the device reports loading.
    pub fn with_calibration_poll_limit(mut self, limit: Option<u32>) -> Self {
        self.poll_limit = limit;
        self
    }

    /// Build the BME280 sensor with the configured settings.
    ///
    /// Checks the chip ID, waits for the calibration image, reads the calibration constants,
    /// then configures the sensor in normal mode.
    pub fn build<'a, I: I2c<SevenBitAddress>, D: DelayNs>(
        self,
        bus: &'a Bus<I>,
        delay: &mut D,
    ) -> Result<Bme280<'a, I>, Error<I::Error>> {
        let address = self.address.into_bits();
        delay.delay_ms(STARTUP_DELAY_MS);
        // Check if the device is present by reading its ID register
        let mut id = ChipId::default();
        if let Err(e) = id.read(&mut bus.begin(address)?) {
            log::warn!("[BME] 0x{address:02x}: identity check failed: {e}");
            return Err(e);
        }
        let mut dev = Bme280 {
            bus,
            address,
            chip: id.0,
            calibration: Calibration::default(),
            t_fine: None,
        };
        log::debug!("[BME] 0x{address:02x}: found {:?}", dev.chip);

        let mut polls = 0u32;
        while dev.is_calibrating()? {
            if self.poll_limit.is_some_and(|limit| polls >= limit) {
                log::error!("[BME] 0x{address:02x}: calibration image still loading after {polls} polls");
                return Err(Error::Timeout);
            }
            polls += 1;
            delay.delay_ms(CALIBRATION_POLL_MS);
        }

        dev.calibration = Calibration::read(&mut bus.begin(address)?, dev.chip)?;
        log::debug!("[BME] 0x{address:02x}: {:?}", dev.calibration);

        dev.configure(self.tos, self.hos, self.pos, self.filter)?;
        if let Some(standby) = self.standby {
            dev.set_standby(standby)?;
        }
        delay.delay_ms(SETTLE_DELAY_MS);
        Ok(dev)
    }
}

impl<I> Bme280<'_, I> {
    /// Get the address of the device.
    pub fn get_address(&self) -> u8 {
        self.address
    }

    /// The chip variant found at construction.
    pub fn chip(&self) -> Chip {
        self.chip
    }

    /// The calibration constants read at construction.
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// The fine temperature computed by the last temperature read, if any.
    pub fn t_fine(&self) -> Option<i32> {
        self.t_fine
    }
}

impl<I: I2c<SevenBitAddress>> Bme280<'_, I> {
    /// Whether the device is still copying its calibration constants from NVM.
    pub fn is_calibrating(&self) -> Result<bool, Error<I::Error>> {
        let mut status = Status::default();
        status.read(&mut self.bus.begin(self.address)?)?;
        Ok(status.im_update())
    }

    /// Whether a conversion is running.
    pub fn is_measuring(&self) -> Result<bool, Error<I::Error>> {
        let mut status = Status::default();
        status.read(&mut self.bus.begin(self.address)?)?;
        Ok(status.measuring())
    }

    /// Set oversampling and filtering, and switch to [`Mode::Normal`].
    ///
    /// The humidity setting only takes effect on the following write of the measurement control
    /// register, so it is written first.
    pub fn configure(
        &self,
        temperature: Oversampling,
        humidity: Oversampling,
        pressure: Oversampling,
        filter: Filter,
    ) -> Result<(), Error<I::Error>> {
        let mut tx = self.bus.begin(self.address)?;
        CtrlHum::new().with_oversampling(humidity).write(&mut tx)?;
        let mut conf = Config::default();
        conf.read(&mut tx)?;
        conf.set_filter(filter);
        conf.write(&mut tx)?;
        CtrlMeas::new()
            .with_temperature_oversampling(temperature)
            .with_pressure_oversampling(pressure)
            .with_mode(Mode::Normal)
            .write(&mut tx)?;
        log::debug!(
            "[BME] 0x{:02x}: oversampling T {temperature:?} H {humidity:?} P {pressure:?}, filter {filter:?}",
            self.address
        );
        Ok(())
    }

    /// Set the standby time between measurements in normal mode.
    pub fn set_standby(&self, standby: Standby) -> Result<(), Error<I::Error>> {
        let mut tx = self.bus.begin(self.address)?;
        let mut conf = Config::default();
        conf.read(&mut tx)?;
        conf.set_standby(standby);
        conf.write(&mut tx)
    }

    /// Set the power mode, keeping the oversampling settings.
    pub fn set_mode(&self, mode: Mode) -> Result<(), Error<I::Error>> {
        let mut tx = self.bus.begin(self.address)?;
        let mut ctrl = CtrlMeas::default();
        ctrl.read(&mut tx)?;
        ctrl.set_mode(mode);
        ctrl.write(&mut tx)
    }

    /// Get the power mode.
    pub fn mode(&self) -> Result<Mode, Error<I::Error>> {
        let mut ctrl = CtrlMeas::default();
        ctrl.read(&mut self.bus.begin(self.address)?)?;
        Ok(ctrl.mode())
    }

    /// Perform a soft reset of the sensor.
    ///
    /// The sensor comes back in sleep mode with its power-on configuration.
    /// The calibration constants are unaffected.
    pub fn reset(&self) -> Result<(), Error<I::Error>> {
        SoftReset.write(&mut self.bus.begin(self.address)?)
    }

    /// Read the temperature in °C.
    ///
    /// Also refreshes the fine temperature used by [`read_humidity`](Self::read_humidity)
    /// and [`read_pressure`](Self::read_pressure).
    pub fn read_temperature(&mut self) -> Result<f32, Error<I::Error>> {
        let buf = self.read_adc::<3>(REG_TEMPERATURE_MSB)?;
        let (t_fine, celsius) = self.calibration.compensate_temperature(adc20(buf));
        self.t_fine = Some(t_fine);
        Ok(celsius)
    }

    /// Read the relative humidity in %RH.
    ///
    /// Compensated with the fine temperature of the last [`read_temperature`](Self::read_temperature).
    ///
    /// # Errors
    /// [`Error::InvalidOperation`] if no temperature was read yet, or the chip has no humidity sensor.
    pub fn read_humidity(&self) -> Result<f32, Error<I::Error>> {
        if !self.chip.has_humidity() {
            return Err(Error::InvalidOperation);
        }
        let t_fine = self.t_fine.ok_or(Error::InvalidOperation)?;
        let buf = self.read_adc::<2>(REG_HUMIDITY_MSB)?;
        Ok(self
            .calibration
            .compensate_humidity(u16::from_be_bytes(buf), t_fine))
    }

    /// Read the pressure in hPa.
    ///
    /// Compensated with the fine temperature of the last [`read_temperature`](Self::read_temperature).
    ///
    /// # Errors
    /// [`Error::InvalidOperation`] if no temperature was read yet.
    pub fn read_pressure(&self) -> Result<f32, Error<I::Error>> {
        let t_fine = self.t_fine.ok_or(Error::InvalidOperation)?;
        let buf = self.read_adc::<3>(REG_PRESSURE_MSB)?;
        Ok(self.calibration.compensate_pressure(adc20(buf), t_fine))
    }

    /// Read temperature and humidity, and compute the dew point in °C.
    pub fn dew_point(&mut self) -> Result<f32, Error<I::Error>> {
        let celsius = self.read_temperature()?;
        let rh = self.read_humidity()?;
        Ok(psychrometry::dew_point(celsius, rh))
    }

    /// Read temperature and dew point, and compute the frost point in °C.
    ///
    /// Only meaningful below 0 °C.
    pub fn frost_point(&mut self) -> Result<f32, Error<I::Error>> {
        let celsius = self.read_temperature()?;
        let dew = self.dew_point()?;
        Ok(psychrometry::frost_point(celsius, dew))
    }

    fn read_adc<const N: usize>(&self, register: u8) -> Result<[u8; N], Error<I::Error>> {
        let mut buf = [0u8; N];
        let actual = self.bus.begin(self.address)?.read_block(register, &mut buf)?;
        if actual != N {
            return Err(Error::ShortRead {
                register,
                expected: N,
                actual,
            });
        }
        Ok(buf)
    }
}
