//! Telemetry frames - network ingestion types
//!
//! `RawFrame` is what travels through the queue; `TelemetryFrame` is what
//! the decoder produces from it. `FrameLayout` is the positional contract
//! between the simulator and the decoder.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::{Instrument, InstrumentUpdate};

/// One received datagram, not yet decoded
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Receive sequence number (per source, starts at 1)
    pub seq: u64,

    /// Arrival time at the receiver
    pub received_at: Instant,

    /// Datagram text
    pub text: String,
}

impl RawFrame {
    pub fn new(seq: u64, text: impl Into<String>) -> Self {
        Self {
            seq,
            received_at: Instant::now(),
            text: text.into(),
        }
    }
}

/// Decoded flight and engine values from one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryFrame {
    pub airspeed: f64,
    pub pitch: f64,
    pub roll: f64,
    pub heading: f64,
    /// Truncated toward zero
    pub altitude: i32,
    /// Truncated toward zero
    pub rpm: i32,
    pub oil_temperature: f64,
    pub oil_pressure: f64,
    pub egt: f64,
    pub fuel_flow: f64,
    /// Sum of all tank fields
    pub fuel_quantity: f64,
}

impl TelemetryFrame {
    /// Number of instrument updates produced per frame
    pub const UPDATE_COUNT: usize = 11;

    /// Instrument updates in application order
    ///
    /// airspeed, pitch, roll, heading, altitude, oil pressure, oil
    /// temperature, EGT, fuel flow, RPM, fuel quantity.
    pub fn updates(&self) -> [InstrumentUpdate; Self::UPDATE_COUNT] {
        [
            InstrumentUpdate::new(Instrument::Airspeed, self.airspeed),
            InstrumentUpdate::new(Instrument::PitchAngle, self.pitch),
            InstrumentUpdate::new(Instrument::RollAngle, self.roll),
            InstrumentUpdate::new(Instrument::Heading, self.heading),
            InstrumentUpdate::new(Instrument::Altitude, f64::from(self.altitude)),
            InstrumentUpdate::new(Instrument::OilPressure, self.oil_pressure),
            InstrumentUpdate::new(Instrument::OilTemperature, self.oil_temperature),
            InstrumentUpdate::new(Instrument::Egt, self.egt),
            InstrumentUpdate::new(Instrument::FuelFlow, self.fuel_flow),
            InstrumentUpdate::new(Instrument::Rpm, f64::from(self.rpm)),
            InstrumentUpdate::new(Instrument::FuelQuantity, self.fuel_quantity),
        ]
    }
}

/// Field positions inside a comma-delimited telemetry frame
///
/// Defaults match the FlightGear generic protocol output used by the
/// simulator feed: 14 fields, positions 5 and 6 unused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameLayout {
    pub airspeed: usize,
    pub pitch: usize,
    pub roll: usize,
    pub heading: usize,
    pub altitude: usize,
    pub rpm: usize,
    pub oil_temperature: usize,
    pub oil_pressure: usize,
    pub egt: usize,
    pub fuel_flow: usize,
    /// Tank quantities, summed into one fuel quantity value
    pub fuel_tanks: Vec<usize>,
}

impl Default for FrameLayout {
    fn default() -> Self {
        Self {
            airspeed: 0,
            pitch: 1,
            roll: 2,
            heading: 3,
            altitude: 4,
            rpm: 7,
            oil_temperature: 8,
            oil_pressure: 9,
            egt: 10,
            fuel_flow: 11,
            fuel_tanks: vec![12, 13],
        }
    }
}

impl FrameLayout {
    /// All mapped positions with their field names
    pub fn mapped_fields(&self) -> Vec<(&'static str, usize)> {
        let mut fields = vec![
            ("airspeed", self.airspeed),
            ("pitch", self.pitch),
            ("roll", self.roll),
            ("heading", self.heading),
            ("altitude", self.altitude),
            ("rpm", self.rpm),
            ("oil_temperature", self.oil_temperature),
            ("oil_pressure", self.oil_pressure),
            ("egt", self.egt),
            ("fuel_flow", self.fuel_flow),
        ];
        fields.extend(self.fuel_tanks.iter().map(|&idx| ("fuel_tank", idx)));
        fields
    }

    /// Minimum field count for a well-formed frame
    pub fn min_fields(&self) -> usize {
        self.mapped_fields()
            .into_iter()
            .map(|(_, idx)| idx + 1)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_needs_fourteen_fields() {
        assert_eq!(FrameLayout::default().min_fields(), 14);
    }

    #[test]
    fn test_layout_partial_override_keeps_defaults() {
        let layout: FrameLayout = toml::from_str("rpm = 20").unwrap();
        assert_eq!(layout.rpm, 20);
        assert_eq!(layout.airspeed, 0);
        assert_eq!(layout.fuel_tanks, vec![12, 13]);
        assert_eq!(layout.min_fields(), 21);
    }

    #[test]
    fn test_update_order() {
        let frame = TelemetryFrame {
            airspeed: 1.0,
            pitch: 2.0,
            roll: 3.0,
            heading: 4.0,
            altitude: 5,
            rpm: 6,
            oil_temperature: 7.0,
            oil_pressure: 8.0,
            egt: 9.0,
            fuel_flow: 10.0,
            fuel_quantity: 11.0,
        };

        let order: Vec<Instrument> = frame.updates().iter().map(|u| u.instrument).collect();
        assert_eq!(
            order,
            vec![
                Instrument::Airspeed,
                Instrument::PitchAngle,
                Instrument::RollAngle,
                Instrument::Heading,
                Instrument::Altitude,
                Instrument::OilPressure,
                Instrument::OilTemperature,
                Instrument::Egt,
                Instrument::FuelFlow,
                Instrument::Rpm,
                Instrument::FuelQuantity,
            ]
        );
        assert_eq!(frame.updates()[9].value, 6.0);
    }
}
