//! Frame decoder
//!
//! Turns comma-delimited telemetry text into a `TelemetryFrame` using a
//! `FrameLayout`. All positional knowledge stays in the layout.

use contracts::{FrameLayout, TelemetryFrame};
use thiserror::Error;

/// Field delimiter
pub const FIELD_DELIMITER: char = ',';

/// Frame decode failure; the frame is dropped by the caller
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// Too few fields for the layout
    #[error("frame has {found} fields, at least {expected} required")]
    FieldCount { expected: usize, found: usize },

    /// Mapped field is not a number
    #[error("field {index} ({field}) is not numeric: '{value}'")]
    InvalidField {
        index: usize,
        field: &'static str,
        value: String,
    },

    /// Mapped field is NaN or infinite
    #[error("field {index} ({field}) is not finite: {value}")]
    NonFinite {
        index: usize,
        field: &'static str,
        value: f64,
    },

    /// Integer field does not fit an `i32`
    #[error("field {index} ({field}) is out of range: {value}")]
    OutOfRange {
        index: usize,
        field: &'static str,
        value: f64,
    },
}

/// Positional frame decoder
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    layout: FrameLayout,
    min_fields: usize,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(FrameLayout::default())
    }
}

impl FrameDecoder {
    pub fn new(layout: FrameLayout) -> Self {
        let min_fields = layout.min_fields();
        Self { layout, min_fields }
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    /// Minimum field count accepted
    pub fn min_fields(&self) -> usize {
        self.min_fields
    }

    /// Decode one frame
    ///
    /// # Errors
    /// `FieldCount` for short frames, `InvalidField`/`NonFinite` for a mapped
    /// field that does not hold a finite number, `OutOfRange` for altitude or
    /// RPM beyond `i32`. Unmapped and surplus fields are never inspected.
    pub fn decode(&self, text: &str) -> Result<TelemetryFrame, DecodeError> {
        let fields: Vec<&str> = text.trim().split(FIELD_DELIMITER).map(str::trim).collect();
        if fields.len() < self.min_fields {
            return Err(DecodeError::FieldCount {
                expected: self.min_fields,
                found: fields.len(),
            });
        }

        let layout = &self.layout;
        let number = |field: &'static str, index: usize| parse_field(&fields, field, index);
        let integer = |field: &'static str, index: usize| {
            number(field, index).and_then(|value| truncate_field(field, index, value))
        };

        let fuel_quantity = layout
            .fuel_tanks
            .iter()
            .try_fold(0.0, |sum, &index| {
                Ok::<f64, DecodeError>(sum + number("fuel_tank", index)?)
            })?;

        Ok(TelemetryFrame {
            airspeed: number("airspeed", layout.airspeed)?,
            pitch: number("pitch", layout.pitch)?,
            roll: number("roll", layout.roll)?,
            heading: number("heading", layout.heading)?,
            altitude: integer("altitude", layout.altitude)?,
            rpm: integer("rpm", layout.rpm)?,
            oil_temperature: number("oil_temperature", layout.oil_temperature)?,
            oil_pressure: number("oil_pressure", layout.oil_pressure)?,
            egt: number("egt", layout.egt)?,
            fuel_flow: number("fuel_flow", layout.fuel_flow)?,
            fuel_quantity,
        })
    }
}

fn parse_field(fields: &[&str], field: &'static str, index: usize) -> Result<f64, DecodeError> {
    // min_fields covers every mapped index
    let raw = fields.get(index).copied().unwrap_or_default();
    let value: f64 = raw.parse().map_err(|_| DecodeError::InvalidField {
        index,
        field,
        value: raw.to_string(),
    })?;

    if !value.is_finite() {
        return Err(DecodeError::NonFinite {
            index,
            field,
            value,
        });
    }
    Ok(value)
}

/// Truncate toward zero; values outside `i32` are rejected, not saturated
fn truncate_field(field: &'static str, index: usize, value: f64) -> Result<i32, DecodeError> {
    let truncated = value.trunc();
    if truncated < f64::from(i32::MIN) || truncated > f64::from(i32::MAX) {
        return Err(DecodeError::OutOfRange {
            index,
            field,
            value,
        });
    }
    Ok(truncated as i32)
}

/// Encode a frame back into wire text using `layout`
///
/// Unmapped positions are written as `0`; the fuel quantity is split
/// evenly across the tank fields.
pub fn encode_frame(frame: &TelemetryFrame, layout: &FrameLayout) -> String {
    let mut fields = vec!["0".to_string(); layout.min_fields()];
    let mut put = |index: usize, value: String| fields[index] = value;

    put(layout.airspeed, format!("{:.2}", frame.airspeed));
    put(layout.pitch, format!("{:.2}", frame.pitch));
    put(layout.roll, format!("{:.2}", frame.roll));
    put(layout.heading, format!("{:.2}", frame.heading));
    put(layout.altitude, frame.altitude.to_string());
    put(layout.rpm, frame.rpm.to_string());
    put(layout.oil_temperature, format!("{:.2}", frame.oil_temperature));
    put(layout.oil_pressure, format!("{:.2}", frame.oil_pressure));
    put(layout.egt, format!("{:.2}", frame.egt));
    put(layout.fuel_flow, format!("{:.2}", frame.fuel_flow));

    let tanks = layout.fuel_tanks.len().max(1) as f64;
    for &index in &layout.fuel_tanks {
        put(index, format!("{:.3}", frame.fuel_quantity / tanks));
    }

    fields.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "120.5,3.2,-1.1,270.0,4500,0,0,2100.0,380.5,210.0,1250.0,7.5,15.2,10.0";

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_decode_sample_frame() {
        let frame = FrameDecoder::default().decode(SAMPLE).unwrap();

        assert_eq!(frame.airspeed, 120.5);
        assert_eq!(frame.pitch, 3.2);
        assert_eq!(frame.roll, -1.1);
        assert_eq!(frame.heading, 270.0);
        assert_eq!(frame.altitude, 4500);
        assert_eq!(frame.rpm, 2100);
        assert_eq!(frame.oil_temperature, 380.5);
        assert_eq!(frame.oil_pressure, 210.0);
        assert_eq!(frame.egt, 1250.0);
        assert_eq!(frame.fuel_flow, 7.5);
        assert!(approx(frame.fuel_quantity, 25.2));
    }

    #[test]
    fn test_integer_fields_truncate_toward_zero() {
        let text = "0,0,0,0,4500.9,0,0,2399.99,0,0,0,0,0,0";
        let frame = FrameDecoder::default().decode(text).unwrap();
        assert_eq!(frame.altitude, 4500);
        assert_eq!(frame.rpm, 2399);

        let text = "0,0,0,0,-20.7,0,0,0,0,0,0,0,0,0";
        assert_eq!(FrameDecoder::default().decode(text).unwrap().altitude, -20);
    }

    #[test]
    fn test_short_frame_is_rejected() {
        let err = FrameDecoder::default()
            .decode("120.5,3.2,-1.1,270.0,4500,0,0,2100.0,380.5,210.0,1250.0,7.5,15.2")
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::FieldCount {
                expected: 14,
                found: 13
            }
        );
    }

    #[test]
    fn test_empty_frame_is_rejected() {
        assert!(matches!(
            FrameDecoder::default().decode(""),
            Err(DecodeError::FieldCount { found: 1, .. })
        ));
    }

    #[test]
    fn test_non_numeric_field_is_rejected() {
        let text = "120.5,3.2,abc,270.0,4500,0,0,2100.0,380.5,210.0,1250.0,7.5,15.2,10.0";
        let err = FrameDecoder::default().decode(text).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidField {
                index: 2,
                field: "roll",
                value: "abc".to_string()
            }
        );
    }

    #[test]
    fn test_non_numeric_tank_is_rejected() {
        let text = "120.5,3.2,-1.1,270.0,4500,0,0,2100.0,380.5,210.0,1250.0,7.5,15.2,";
        assert!(matches!(
            FrameDecoder::default().decode(text),
            Err(DecodeError::InvalidField { index: 13, .. })
        ));
    }

    #[test]
    fn test_non_finite_field_is_rejected() {
        let text = "120.5,3.2,-1.1,270.0,nan,0,0,2100.0,380.5,210.0,1250.0,7.5,15.2,10.0";
        assert!(matches!(
            FrameDecoder::default().decode(text),
            Err(DecodeError::NonFinite { index: 4, .. })
        ));

        let text = "inf,3.2,-1.1,270.0,4500,0,0,2100.0,380.5,210.0,1250.0,7.5,15.2,10.0";
        assert!(matches!(
            FrameDecoder::default().decode(text),
            Err(DecodeError::NonFinite { index: 0, .. })
        ));
    }

    #[test]
    fn test_integer_overflow_is_rejected() {
        let text = "120.5,3.2,-1.1,270.0,1e12,0,0,2100.0,380.5,210.0,1250.0,7.5,15.2,10.0";
        assert_eq!(
            FrameDecoder::default().decode(text).unwrap_err(),
            DecodeError::OutOfRange {
                index: 4,
                field: "altitude",
                value: 1e12
            }
        );

        let text = "120.5,3.2,-1.1,270.0,4500,0,0,9e18,380.5,210.0,1250.0,7.5,15.2,10.0";
        assert!(matches!(
            FrameDecoder::default().decode(text),
            Err(DecodeError::OutOfRange { index: 7, field: "rpm", .. })
        ));

        let text = "120.5,3.2,-1.1,270.0,-2147483649,0,0,2100.0,380.5,210.0,1250.0,7.5,15.2,10.0";
        assert!(matches!(
            FrameDecoder::default().decode(text),
            Err(DecodeError::OutOfRange { index: 4, .. })
        ));
    }

    #[test]
    fn test_integer_bounds_are_accepted() {
        let text = "0,0,0,0,2147483647.9,0,0,-2147483648.5,0,0,0,0,0,0";
        let frame = FrameDecoder::default().decode(text).unwrap();
        assert_eq!(frame.altitude, i32::MAX);
        assert_eq!(frame.rpm, i32::MIN);
    }

    #[test]
    fn test_unmapped_and_extra_fields_are_ignored() {
        let text = "120.5,3.2,-1.1,270.0,4500,junk,junk,2100.0,380.5,210.0,1250.0,7.5,15.2,10.0,extra,99";
        let frame = FrameDecoder::default().decode(text).unwrap();
        assert_eq!(frame.airspeed, 120.5);
        assert!(approx(frame.fuel_quantity, 25.2));
    }

    #[test]
    fn test_whitespace_and_line_terminator_tolerated() {
        let text = " 120.5, 3.2 ,-1.1,270.0,4500,0,0,2100.0,380.5,210.0,1250.0,7.5,15.2,10.0\r\n";
        let frame = FrameDecoder::default().decode(text).unwrap();
        assert_eq!(frame.airspeed, 120.5);
        assert_eq!(frame.pitch, 3.2);
    }

    #[test]
    fn test_custom_layout() {
        let layout = FrameLayout {
            airspeed: 13,
            fuel_tanks: vec![0],
            ..Default::default()
        };
        let decoder = FrameDecoder::new(layout);
        let frame = decoder.decode(SAMPLE).unwrap();
        assert_eq!(frame.airspeed, 10.0);
        assert_eq!(frame.fuel_quantity, 120.5);
    }

    #[test]
    fn test_encoded_frame_decodes() {
        let original = FrameDecoder::default().decode(SAMPLE).unwrap();
        let text = encode_frame(&original, &FrameLayout::default());
        assert_eq!(text.split(',').count(), 14);

        let decoded = FrameDecoder::default().decode(&text).unwrap();
        assert_eq!(decoded.altitude, 4500);
        assert!(approx(decoded.fuel_quantity, 25.2));
    }
}
