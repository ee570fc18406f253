//! Scaling between raw register values and physical units.
//!
//! Angles travel as signed hundredths of a degree, temperatures as unsigned
//! tenths of a degree Celsius.

use crate::types::InvalidValue;

/// Raw angle units per degree.
pub const ANGLE_SCALE: f64 = 100.0;
/// Raw temperature units per degree Celsius.
pub const TEMPERATURE_SCALE: f32 = 10.0;
/// Mechanical limit of both axes, in degrees either side of zero.
pub const ANGLE_LIMIT_DEG: f64 = 60.0;

// Products closer than this to a whole number of hundredths are treated as exact.
const SNAP_TOLERANCE: f64 = 1e-6;

/// Convert degrees into the raw value of a target register.
///
/// The scaled value is truncated toward zero, so `12.349` becomes `1234`.
pub fn degrees_to_raw(degrees: f64) -> Result<u16, InvalidValue> {
    if !(-ANGLE_LIMIT_DEG..=ANGLE_LIMIT_DEG).contains(&degrees) {
        return Err(InvalidValue::Angle(degrees));
    }
    let scaled = degrees * ANGLE_SCALE;
    let nearest = scaled.round();
    let hundredths = if (scaled - nearest).abs() < SNAP_TOLERANCE {
        nearest
    } else {
        scaled.trunc()
    };
    Ok(hundredths as i16 as u16)
}

/// Convert the raw value of a position register into degrees.
pub fn raw_to_degrees(raw: u16) -> f64 {
    raw as i16 as f64 / ANGLE_SCALE
}

/// Convert the raw value of a temperature register into degrees Celsius.
pub fn raw_to_celsius(raw: u16) -> f32 {
    raw as f32 / TEMPERATURE_SCALE
}
