//! Telemetry line format
//!
//! One line per loop iteration: `roll,pitch,height` with angles in degrees
//! (two decimals) and height in metres (three decimals), e.g.
//! `1.25,-3.40,0.512`. The line carries no terminator.

use core::fmt::{self, Write};
use core::str::FromStr;
use heapless::String;

/// Capacity of a formatted line
pub const TELEMETRY_LINE_LEN: usize = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TelemetryError {
    /// Line does not have exactly three fields
    FieldCount,
    /// A field is not a number
    InvalidNumber,
}

impl TelemetryError {
    pub fn as_str(&self) -> &'static str {
        match self {
            TelemetryError::FieldCount => "expected 3 comma-separated fields",
            TelemetryError::InvalidNumber => "field is not a number",
        }
    }
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fused output sample as streamed to the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryFrame {
    pub roll: f32,
    pub pitch: f32,
    pub height_m: f32,
}

impl TelemetryFrame {
    /// Build from the filter outputs, converting the distance to metres
    pub fn from_outputs(roll: f32, pitch: f32, distance_mm: u16) -> Self {
        Self {
            roll,
            pitch,
            height_m: f32::from(distance_mm) / 1000.0,
        }
    }

    /// Format into a fixed-capacity line
    ///
    /// Fails only if the rendered numbers exceed [`TELEMETRY_LINE_LEN`].
    pub fn format_line(&self) -> Result<String<TELEMETRY_LINE_LEN>, fmt::Error> {
        let mut line = String::new();
        write!(line, "{}", self)?;
        Ok(line)
    }

    /// Parse a line produced by [`TelemetryFrame::format_line`]
    ///
    /// Surrounding whitespace, including a trailing line terminator, is
    /// ignored.
    pub fn parse(line: &str) -> Result<Self, TelemetryError> {
        let mut fields = line.trim().split(',');
        let mut next = || -> Result<f32, TelemetryError> {
            let field = fields.next().ok_or(TelemetryError::FieldCount)?;
            field
                .trim()
                .parse::<f32>()
                .map_err(|_| TelemetryError::InvalidNumber)
        };

        let roll = next()?;
        let pitch = next()?;
        let height_m = next()?;
        if fields.next().is_some() {
            return Err(TelemetryError::FieldCount);
        }

        Ok(Self {
            roll,
            pitch,
            height_m,
        })
    }
}

impl fmt::Display for TelemetryFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2},{:.2},{:.3}", self.roll, self.pitch, self.height_m)
    }
}

impl FromStr for TelemetryFrame {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_line() {
        let frame = TelemetryFrame::from_outputs(1.254, -3.4, 512);
        assert_eq!(frame.format_line().unwrap().as_str(), "1.25,-3.40,0.512");
    }

    #[test]
    fn test_height_in_metres() {
        let frame = TelemetryFrame::from_outputs(0.0, 0.0, 2000);
        assert!((frame.height_m - 2.0).abs() < 1e-6);
        assert_eq!(frame.format_line().unwrap().as_str(), "0.00,0.00,2.000");
    }

    #[test]
    fn test_parse_line() {
        let frame = TelemetryFrame::parse("12.50,-0.75,1.234\r\n").unwrap();
        assert!((frame.roll - 12.5).abs() < 1e-6);
        assert!((frame.pitch + 0.75).abs() < 1e-6);
        assert!((frame.height_m - 1.234).abs() < 1e-6);
    }

    #[test]
    fn test_parse_field_count() {
        assert_eq!(
            TelemetryFrame::parse("1.0,2.0"),
            Err(TelemetryError::FieldCount)
        );
        assert_eq!(
            TelemetryFrame::parse("1.0,2.0,3.0,4.0"),
            Err(TelemetryError::FieldCount)
        );
    }

    #[test]
    fn test_parse_invalid_number() {
        assert_eq!(
            "1.0,abc,3.0".parse::<TelemetryFrame>(),
            Err(TelemetryError::InvalidNumber)
        );
        assert_eq!(
            TelemetryFrame::parse(""),
            Err(TelemetryError::InvalidNumber)
        );
    }

    #[test]
    fn test_oversized_values_fail_to_format() {
        let frame = TelemetryFrame {
            roll: 1.0e30,
            pitch: 1.0e30,
            height_m: 0.0,
        };
        assert!(frame.format_line().is_err());
    }
}
