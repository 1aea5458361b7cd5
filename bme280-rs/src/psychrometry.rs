//! Derived humidity quantities.

const MAGNUS_A: f32 = 17.27;
const MAGNUS_B: f32 = 237.7;
const KELVIN: f32 = 273.15;

/// Dew point in °C from the air temperature in °C and the relative humidity in %RH.
///
/// Uses the Magnus-Tetens approximation. The dew point is the temperature to which the air
/// must be cooled, at constant pressure and humidity, for water to condense.
/// A relative humidity of zero yields NaN.
pub fn dew_point(celsius: f32, relative_humidity: f32) -> f32 {
    let z = (MAGNUS_A * celsius) / (MAGNUS_B + celsius) + (relative_humidity / 100.0).ln();
    MAGNUS_B * z / (MAGNUS_A - z)
}

/// Frost point in °C from the air temperature and the dew point, both in °C.
///
/// The frost point is the temperature at which the air saturates with respect to ice.
/// Only meaningful below 0 °C.
pub fn frost_point(celsius: f32, dew_point: f32) -> f32 {
    let t_air = celsius + KELVIN;
    let z1 = 2954.61 / t_air + 2.193665 * t_air.ln() - 13.3448;
    let z2 = (dew_point + KELVIN) - t_air;
    z2 + 2671.02 / z1 - KELVIN
}
