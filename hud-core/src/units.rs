//! Type-safe wrappers for physical units
//!
//! This module provides newtype wrappers around f32 to ensure
//! type safety and prevent unit confusion between telemetry topics.
//!
//! All unit types serialize with 4 decimal places to reduce JSON payload size.

use serde::{Deserialize, Serialize};

/// Round f32 to 4 decimal places for compact JSON serialization
fn round4<S: serde::Serializer>(val: &f32, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f32((*val * 10000.0).round() / 10000.0)
}

/// Meters
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Meters(#[serde(serialize_with = "round4")] pub f32);

impl Meters {
    pub fn as_feet(&self) -> f32 {
        self.0 * 3.280_84
    }
}

/// Meters per second
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct MetersPerSecond(#[serde(serialize_with = "round4")] pub f32);

impl MetersPerSecond {
    pub fn as_kph(&self) -> f32 {
        self.0 * 3.6
    }

    pub fn as_mph(&self) -> f32 {
        self.0 * 2.236_936_3
    }

    /// Display speed in the unit system the driver selected
    pub fn display(&self, is_metric: bool) -> f32 {
        if is_metric {
            self.as_kph()
        } else {
            self.as_mph()
        }
    }
}

/// Meters per second squared (acceleration)
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct MetersPerSecondSquared(#[serde(serialize_with = "round4")] pub f32);

/// Radians
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Radians(#[serde(serialize_with = "round4")] pub f32);

/// Degrees (steering wheel angle is reported in degrees)
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Degrees(#[serde(serialize_with = "round4")] pub f32);

impl Degrees {
    pub fn to_radians(&self) -> Radians {
        Radians(self.0.to_radians())
    }
}

/// Revolutions per minute
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Rpm(#[serde(serialize_with = "round4")] pub f32);

/// Celsius
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Celsius(#[serde(serialize_with = "round4")] pub f32);

impl Celsius {
    pub fn as_fahrenheit(&self) -> f32 {
        self.0 * 1.8 + 32.0
    }
}

/// Newton-meters (torque)
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct NewtonMeters(#[serde(serialize_with = "round4")] pub f32);

/// Volts (electrical)
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Volts(#[serde(serialize_with = "round4")] pub f32);

/// Amperes (electrical)
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amperes(#[serde(serialize_with = "round4")] pub f32);

/// Percentage (0.0 to 1.0)
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Percentage(#[serde(serialize_with = "round4")] pub f32);

impl Percentage {
    /// Create a new percentage, clamping to [0.0, 1.0]
    pub fn new(value: f32) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    /// Get as percentage (0-100)
    pub fn as_percent(&self) -> f32 {
        self.0 * 100.0
    }
}

/// Seconds (timestamps, durations)
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Seconds(#[serde(serialize_with = "round4")] pub f32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_clamp() {
        assert_eq!(Percentage::new(1.5).0, 1.0);
        assert_eq!(Percentage::new(-0.5).0, 0.0);
        assert_eq!(Percentage::new(0.5).0, 0.5);
    }

    #[test]
    fn test_percentage_as_percent() {
        let p = Percentage::new(0.75);
        assert!((p.as_percent() - 75.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_speed_display_units() {
        let v = MetersPerSecond(10.0);
        assert!((v.display(true) - 36.0).abs() < 1e-4);
        assert!((v.display(false) - 22.369363).abs() < 1e-4);
    }

    #[test]
    fn test_unit_serializes_rounded() {
        let json = serde_json::to_string(&Meters(1.234_567)).unwrap();
        assert_eq!(json, "1.2346");
    }

    #[test]
    fn test_celsius_to_fahrenheit() {
        assert!((Celsius(100.0).as_fahrenheit() - 212.0).abs() < 1e-4);
    }
}
