//! Register-level stand-in for a BME280 on the bus, used by the unit tests.
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation, SevenBitAddress};

use crate::Calibration;
use crate::register::{
    REG_CHIP_ID, REG_DIG_H1, REG_DIG_H2, REG_DIG_H3, REG_DIG_H4, REG_DIG_H6, REG_DIG_P1,
    REG_DIG_T1, REG_HUMIDITY_MSB, REG_PRESSURE_MSB, REG_STATUS, REG_TEMPERATURE_MSB,
};

/// Datasheet sample temperature constants and the raw reading that yields 25.08 °C.
pub(crate) const DIG_T: (u16, i16, i16) = (27504, 26435, -1000);
pub(crate) const ADC_T: u32 = 519888;
/// Datasheet sample pressure constants and raw reading.
pub(crate) const DIG_P: (u16, [i16; 8]) = (36477, [-10685, 3024, 2855, 140, -7, 15500, -14600, 6000]);
pub(crate) const ADC_P: u32 = 415148;
/// Humidity constants seen on typical parts.
pub(crate) const DIG_H: (u8, i16, u8, i16, i16, i8) = (75, 362, 0, 313, 50, 30);
pub(crate) const ADC_H: u16 = 30000;

/// The constants [`RegisterFile::bme280`] holds, as the driver should decode them.
pub(crate) fn sample_calibration() -> Calibration {
    let (h1, h2, h3, h4, h5, h6) = DIG_H;
    let [p2, p3, p4, p5, p6, p7, p8, p9] = DIG_P.1;
    Calibration {
        t1: DIG_T.0,
        t2: DIG_T.1,
        t3: DIG_T.2,
        p1: DIG_P.0,
        p2,
        p3,
        p4,
        p5,
        p6,
        p7,
        p8,
        p9,
        h1,
        h2,
        h3,
        h4,
        h5,
        h6,
    }
}

#[derive(Debug)]
pub(crate) struct RegisterFile {
    pub(crate) regs: [u8; 256],
    address: u8,
    pointer: u8,
    /// Status reads left that report the calibration image as still loading.
    pub(crate) loading_reads: usize,
    /// Registers that NACK any access.
    pub(crate) broken: Option<u8>,
}

impl RegisterFile {
    pub(crate) fn new(address: u8) -> Self {
        Self {
            regs: [0; 256],
            address,
            pointer: 0,
            loading_reads: 0,
            broken: None,
        }
    }

    /// A BME280 holding the sample calibration and readings.
    pub(crate) fn bme280(address: u8) -> Self {
        let mut dev = Self::new(address);
        dev.regs[REG_CHIP_ID as usize] = 0x60;
        dev.put_u16(REG_DIG_T1, DIG_T.0);
        dev.put_u16(REG_DIG_T1 + 2, DIG_T.1 as u16);
        dev.put_u16(REG_DIG_T1 + 4, DIG_T.2 as u16);
        dev.put_u16(REG_DIG_P1, DIG_P.0);
        for (i, p) in DIG_P.1.iter().enumerate() {
            dev.put_u16(REG_DIG_P1 + 2 * (i as u8 + 1), *p as u16);
        }
        let (h1, h2, h3, h4, h5, h6) = DIG_H;
        dev.regs[REG_DIG_H1 as usize] = h1;
        dev.put_u16(REG_DIG_H2, h2 as u16);
        dev.regs[REG_DIG_H3 as usize] = h3;
        dev.regs[REG_DIG_H4 as usize] = (h4 >> 4) as u8;
        dev.regs[REG_DIG_H4 as usize + 1] = ((h5 as u8 & 0x0f) << 4) | (h4 as u8 & 0x0f);
        dev.regs[REG_DIG_H4 as usize + 2] = (h5 >> 4) as u8;
        dev.regs[REG_DIG_H6 as usize] = h6 as u8;
        dev.set_temperature(ADC_T);
        dev.set_adc20(REG_PRESSURE_MSB, ADC_P);
        dev.regs[REG_HUMIDITY_MSB as usize..][..2].copy_from_slice(&ADC_H.to_be_bytes());
        dev
    }

    pub(crate) fn set_temperature(&mut self, adc: u32) {
        self.set_adc20(REG_TEMPERATURE_MSB, adc);
    }

    fn set_adc20(&mut self, register: u8, adc: u32) {
        let r = register as usize;
        self.regs[r] = (adc >> 12) as u8;
        self.regs[r + 1] = (adc >> 4) as u8;
        self.regs[r + 2] = ((adc & 0x0f) << 4) as u8;
    }

    fn put_u16(&mut self, register: u8, value: u16) {
        self.regs[register as usize..][..2].copy_from_slice(&value.to_le_bytes());
    }

    fn check(&self, register: u8) -> Result<(), ErrorKind> {
        if self.broken == Some(register) {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
        }
        Ok(())
    }

    fn load(&mut self) -> u8 {
        let reg = self.pointer;
        self.pointer = self.pointer.wrapping_add(1);
        if reg == REG_STATUS && self.loading_reads > 0 {
            self.loading_reads -= 1;
            return self.regs[reg as usize] | 0x01;
        }
        self.regs[reg as usize]
    }
}

impl ErrorType for RegisterFile {
    type Error = ErrorKind;
}

impl I2c<SevenBitAddress> for RegisterFile {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != self.address {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    if let Some((reg, data)) = bytes.split_first() {
                        self.check(*reg)?;
                        self.pointer = *reg;
                        for b in data {
                            self.regs[self.pointer as usize] = *b;
                            self.pointer = self.pointer.wrapping_add(1);
                        }
                    }
                }
                Operation::Read(buf) => {
                    self.check(self.pointer)?;
                    for b in buf.iter_mut() {
                        *b = self.load();
                    }
                }
            }
        }
        Ok(())
    }
}
