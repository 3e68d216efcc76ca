//! Instrument sinks - dispatch output interface
//!
//! The rendering layer owns the widgets; the dispatch core only sees this
//! capability set.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Panel instruments addressable by the dispatch core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instrument {
    /// Airspeed tape
    Airspeed,
    /// Attitude indicator, pitch axis
    PitchAngle,
    /// Attitude indicator, roll axis
    RollAngle,
    /// Heading tape
    Heading,
    /// Altimeter tape
    Altitude,
    /// MAP round gauge
    ManifoldPressure,
    /// RPM round gauge
    Rpm,
    OilPressure,
    OilTemperature,
    FuelQuantity,
    FuelFlow,
    MaxCht,
    Egt,
}

impl Instrument {
    /// Every instrument on the panel
    pub const ALL: [Instrument; 13] = [
        Self::Airspeed,
        Self::PitchAngle,
        Self::RollAngle,
        Self::Heading,
        Self::Altitude,
        Self::ManifoldPressure,
        Self::Rpm,
        Self::OilPressure,
        Self::OilTemperature,
        Self::FuelQuantity,
        Self::FuelFlow,
        Self::MaxCht,
        Self::Egt,
    ];

    /// Display label
    pub fn label(self) -> &'static str {
        match self {
            Self::Airspeed => "Airspeed",
            Self::PitchAngle => "Pitch",
            Self::RollAngle => "Roll",
            Self::Heading => "Heading",
            Self::Altitude => "Altitude",
            Self::ManifoldPressure => "MAP",
            Self::Rpm => "RPM",
            Self::OilPressure => "Oil Press",
            Self::OilTemperature => "Oil Temp",
            Self::FuelQuantity => "Fuel Qty",
            Self::FuelFlow => "Fuel Flow",
            Self::MaxCht => "Max CHT",
            Self::Egt => "Avg EGT",
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single value destined for one instrument
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstrumentUpdate {
    pub instrument: Instrument,
    pub value: f64,
}

impl InstrumentUpdate {
    pub fn new(instrument: Instrument, value: f64) -> Self {
        Self { instrument, value }
    }
}

/// Instrument sink trait
///
/// Anything that accepts a numeric value for display. Sinks are only ever
/// invoked from the dispatch loop, so implementations need no internal
/// locking for their own state.
pub trait InstrumentSink: Send {
    /// Sink name (used for logging)
    fn name(&self) -> &str;

    /// Apply a new value
    fn set_value(&mut self, value: f64);
}
