//! Length units
//!
//! The geometry model is unit-agnostic: it operates on whatever unit it is
//! handed, as long as every length uses the same one. Units only matter when
//! seeding defaults and when talking to a host that works in its own internal
//! unit.

use serde::{Deserialize, Serialize};

/// A unit of length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LengthUnit {
    /// Millimeters
    #[default]
    Millimeter,
    /// Centimeters
    Centimeter,
    /// Inches
    Inch,
}

impl LengthUnit {
    /// Size of one unit in millimeters
    pub fn millimeters(self) -> f64 {
        match self {
            LengthUnit::Millimeter => 1.0,
            LengthUnit::Centimeter => 10.0,
            LengthUnit::Inch => 25.4,
        }
    }

    /// Convert `value` expressed in `self` into `target`
    pub fn convert(self, value: f64, target: LengthUnit) -> f64 {
        if self == target {
            return value;
        }
        value * self.millimeters() / target.millimeters()
    }

    /// Short symbol used for display
    pub fn symbol(self) -> &'static str {
        match self {
            LengthUnit::Millimeter => "mm",
            LengthUnit::Centimeter => "cm",
            LengthUnit::Inch => "in",
        }
    }
}

impl std::fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

impl std::str::FromStr for LengthUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mm" | "millimeter" | "millimeters" => Ok(LengthUnit::Millimeter),
            "cm" | "centimeter" | "centimeters" => Ok(LengthUnit::Centimeter),
            "in" | "inch" | "inches" => Ok(LengthUnit::Inch),
            other => Err(format!("unknown length unit '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_inch_to_millimeter() {
        let mm = LengthUnit::Inch.convert(1.0 / 16.0, LengthUnit::Millimeter);
        assert_relative_eq!(mm, 1.5875, epsilon = 1e-12);
    }

    #[test]
    fn test_millimeter_to_centimeter() {
        assert_relative_eq!(
            LengthUnit::Millimeter.convert(15.0, LengthUnit::Centimeter),
            1.5
        );
    }

    #[test]
    fn test_same_unit_is_identity() {
        let value = 0.1 + 0.2;
        assert_eq!(LengthUnit::Inch.convert(value, LengthUnit::Inch), value);
    }

    #[test]
    fn test_parse_unit() {
        assert_eq!("MM".parse::<LengthUnit>(), Ok(LengthUnit::Millimeter));
        assert_eq!("inch".parse::<LengthUnit>(), Ok(LengthUnit::Inch));
        assert!("furlong".parse::<LengthUnit>().is_err());
    }
}
