use embedded_hal::i2c::{I2c, SevenBitAddress};

use crate::{
    Chip, Error, Transaction,
    register::{
        REG_DIG_H1, REG_DIG_H2, REG_DIG_H3, REG_DIG_H4, REG_DIG_H5, REG_DIG_H6, REG_DIG_P1,
        REG_DIG_P2, REG_DIG_P3, REG_DIG_P4, REG_DIG_P5, REG_DIG_P6, REG_DIG_P7, REG_DIG_P8,
        REG_DIG_P9, REG_DIG_T1, REG_DIG_T2, REG_DIG_T3,
    },
};

/// Upper bound of the humidity accumulator, 100 %RH in Q22.10 shifted left by 12.
const HUMIDITY_MAX: i64 = 419_430_400;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Factory trimming constants of one sensor.
///
/// The constants are burnt into the sensor NVM and copied to the image registers at power-up.
/// They are read once when the driver is built and never change afterwards.
/// Field `t1` holds the datasheet's `dig_T1`, and so on.
#[allow(missing_docs)]
pub struct Calibration {
    pub t1: u16,
    pub t2: i16,
    pub t3: i16,
    pub p1: u16,
    pub p2: i16,
    pub p3: i16,
    pub p4: i16,
    pub p5: i16,
    pub p6: i16,
    pub p7: i16,
    pub p8: i16,
    pub p9: i16,
    /// Zero on chips without a humidity sensor, as are the other `h` constants.
    pub h1: u8,
    pub h2: i16,
    pub h3: u8,
    pub h4: i16,
    pub h5: i16,
    pub h6: i8,
}

/// Assemble `dig_H4` from register 0xE4 (bits 11:4) and the low nibble of 0xE5 (bits 3:0).
pub const fn h4_from_bytes(e4: u8, e5: u8) -> i16 {
    ((e4 as i8 as i16) << 4) | (e5 & 0x0f) as i16
}

/// Assemble `dig_H5` from register 0xE6 (bits 11:4) and the high nibble of 0xE5 (bits 3:0).
pub const fn h5_from_bytes(e5: u8, e6: u8) -> i16 {
    ((e6 as i8 as i16) << 4) | (e5 >> 4) as i16
}

/// Raw 20-bit ADC value from the MSB, LSB and XLSB registers of temperature or pressure.
pub(crate) fn adc20(buf: [u8; 3]) -> u32 {
    (u32::from(buf[0]) << 12) | (u32::from(buf[1]) << 4) | ((u32::from(buf[2]) >> 4) & 0x0f)
}

impl Calibration {
    /// Read the constants of `chip`. Humidity constants are only read on chips that measure humidity.
    pub(crate) fn read<I: I2c<SevenBitAddress>>(
        tx: &mut Transaction<'_, I>,
        chip: Chip,
    ) -> Result<Self, Error<I::Error>> {
        let mut cal = Calibration {
            t1: tx.read_word(REG_DIG_T1)?,
            t2: tx.read_word(REG_DIG_T2)? as i16,
            t3: tx.read_word(REG_DIG_T3)? as i16,
            p1: tx.read_word(REG_DIG_P1)?,
            p2: tx.read_word(REG_DIG_P2)? as i16,
            p3: tx.read_word(REG_DIG_P3)? as i16,
            p4: tx.read_word(REG_DIG_P4)? as i16,
            p5: tx.read_word(REG_DIG_P5)? as i16,
            p6: tx.read_word(REG_DIG_P6)? as i16,
            p7: tx.read_word(REG_DIG_P7)? as i16,
            p8: tx.read_word(REG_DIG_P8)? as i16,
            p9: tx.read_word(REG_DIG_P9)? as i16,
            ..Default::default()
        };
        if chip.has_humidity() {
            cal.h1 = tx.read_byte(REG_DIG_H1)?;
            cal.h2 = tx.read_word(REG_DIG_H2)? as i16;
            cal.h3 = tx.read_byte(REG_DIG_H3)?;
            let e4 = tx.read_byte(REG_DIG_H4)?;
            let e5 = tx.read_byte(REG_DIG_H5)?;
            let e6 = tx.read_byte(REG_DIG_H5 + 1)?;
            cal.h4 = h4_from_bytes(e4, e5);
            cal.h5 = h5_from_bytes(e5, e6);
            cal.h6 = tx.read_byte(REG_DIG_H6)? as i8;
        }
        Ok(cal)
    }

    /// Compensate a raw temperature reading.
    ///
    /// # Returns
    /// The fine temperature `t_fine` needed by [`compensate_humidity`](Self::compensate_humidity)
    /// and [`compensate_pressure`](Self::compensate_pressure), and the temperature in °C.
    pub fn compensate_temperature(&self, adc_t: u32) -> (i32, f32) {
        let adc = i64::from(adc_t);
        let t1 = i64::from(self.t1);
        let t2 = i64::from(self.t2);
        let t3 = i64::from(self.t3);

        let var1 = (((adc >> 3) - (t1 << 1)) * t2) >> 11;
        let var2 = (((((adc >> 4) - t1) * ((adc >> 4) - t1)) >> 12) * t3) >> 14;
        let t_fine = (var1 + var2) as i32;

        let centi = (i64::from(t_fine) * 5 + 128) >> 8;
        (t_fine, centi as f32 / 100.0)
    }

    /// Compensate a raw humidity reading, in %RH.
    ///
    /// The result is always within `0.0..=100.0`.
    pub fn compensate_humidity(&self, adc_h: u16, t_fine: i32) -> f32 {
        let adc = i64::from(adc_h);
        let h1 = i64::from(self.h1);
        let h2 = i64::from(self.h2);
        let h3 = i64::from(self.h3);
        let h4 = i64::from(self.h4);
        let h5 = i64::from(self.h5);
        let h6 = i64::from(self.h6);

        let v = i64::from(t_fine) - 76800;
        let v = ((((adc << 14) - (h4 << 20) - (h5 * v)) + 16384) >> 15)
            * (((((((v * h6) >> 10) * (((v * h3) >> 11) + 32768)) >> 10) + 2_097_152) * h2
                + 8192)
                >> 14);
        let v = v - (((((v >> 15) * (v >> 15)) >> 7) * h1) >> 4);
        let v = v.clamp(0, HUMIDITY_MAX);
        (v >> 12) as f32 / 1024.0
    }

    /// Pressure in Pa as unsigned Q24.8, or `None` when the first stage collapses to zero.
    pub(crate) fn pressure_q24_8(&self, adc_p: u32, t_fine: i32) -> Option<i64> {
        let p1 = i64::from(self.p1);
        let p2 = i64::from(self.p2);
        let p3 = i64::from(self.p3);
        let p4 = i64::from(self.p4);
        let p5 = i64::from(self.p5);
        let p6 = i64::from(self.p6);
        let p7 = i64::from(self.p7);
        let p8 = i64::from(self.p8);
        let p9 = i64::from(self.p9);

        let var1 = i64::from(t_fine) - 128_000;
        let var2 = var1 * var1 * p6;
        let var2 = var2 + ((var1 * p5) << 17);
        let var2 = var2 + (p4 << 35);
        let var1 = ((var1 * var1 * p3) >> 8) + ((var1 * p2) << 12);
        let var1 = (((1i64 << 47) + var1) * p1) >> 33;
        if var1 == 0 {
            return None;
        }
        let p = 1_048_576 - i64::from(adc_p);
        let p = (((p << 31) - var2) * 3125) / var1;
        let var1 = (p9 * (p >> 13) * (p >> 13)) >> 25;
        let var2 = (p8 * p) >> 19;
        Some(((p + var1 + var2) >> 8) + (p7 << 4))
    }

    /// Compensate a raw pressure reading, in hPa.
    ///
    /// Returns `0.0` when the calibration would lead to a division by zero.
    pub fn compensate_pressure(&self, adc_p: u32, t_fine: i32) -> f32 {
        match self.pressure_q24_8(adc_p, t_fine) {
            Some(p) => (p as f64 / 25600.0) as f32,
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{ADC_H, ADC_P, ADC_T, sample_calibration as sample};

    #[test]
    fn temperature_datasheet_sample() {
        let (t_fine, celsius) = sample().compensate_temperature(ADC_T);
        assert_eq!(t_fine, 128422);
        assert!((celsius - 25.08).abs() < 0.01);
    }

    #[test]
    fn pressure_datasheet_sample() {
        let cal = sample();
        assert_eq!(cal.pressure_q24_8(ADC_P, 128422), Some(25767233));
        assert!((cal.compensate_pressure(ADC_P, 128422) - 1006.5325).abs() < 0.001);
    }

    #[test]
    fn pressure_zero_first_stage() {
        let cal = Calibration { p1: 0, ..sample() };
        assert_eq!(cal.pressure_q24_8(ADC_P, 128422), None);
        assert_eq!(cal.compensate_pressure(ADC_P, 128422), 0.0);
    }

    #[test]
    fn humidity_sample() {
        let rh = sample().compensate_humidity(ADC_H, 128422);
        assert!((rh - 54.99707).abs() < 1e-4);
    }

    #[test]
    fn humidity_is_clamped() {
        let cal = sample();
        assert_eq!(cal.compensate_humidity(0, 128422), 0.0);
        assert_eq!(cal.compensate_humidity(u16::MAX, 128422), 100.0);
        for adc in (0..=u16::MAX).step_by(257) {
            for t_fine in [-200_000, 0, 128422, 300_000] {
                let rh = cal.compensate_humidity(adc, t_fine);
                assert!((0.0..=100.0).contains(&rh), "{adc} {t_fine} -> {rh}");
            }
        }
    }

    #[test]
    fn packed_humidity_constants() {
        assert_eq!(h4_from_bytes(0x13, 0x29), 313);
        assert_eq!(h5_from_bytes(0x29, 0x03), 50);
        // the MSB byte is signed
        assert_eq!(h4_from_bytes(0xff, 0x0f), -1);
        assert_eq!(h4_from_bytes(0x80, 0x00), -2048);
        assert_eq!(h5_from_bytes(0x00, 0xfe), -32);
    }

    #[test]
    fn adc20_drops_xlsb_low_nibble() {
        assert_eq!(adc20([0x7e, 0xed, 0x0f]), ADC_T);
        assert_eq!(adc20([0x65, 0x5a, 0xc0]), ADC_P);
    }
}
