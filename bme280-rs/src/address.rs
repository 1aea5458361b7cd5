use bitfield_struct::bitfield;

#[bitfield(u8)]
/// Represents the slave address for the BME280 sensor.
/// The address is 7 bits long. The least significant bit follows the level of the SDO pin,
/// so the sensor answers at 0x76 (SDO low) or 0x77 (SDO high).
/// The default address is 0x77, the usual breakout board wiring.
pub struct SlaveAddress {
    #[bits(1, default = true)]
    pub sdo: bool,
    #[bits(6, default = 0x76 >> 1)]
    base: u8,
    #[bits(1, default = false)]
    reserved: bool,
}

#[cfg(test)]
mod tests {
    use super::SlaveAddress;

    #[test]
    fn default_is_sdo_high() {
        assert_eq!(SlaveAddress::default().into_bits(), 0x77);
    }

    #[test]
    fn sdo_low() {
        assert_eq!(SlaveAddress::default().with_sdo(false).into_bits(), 0x76);
    }
}
