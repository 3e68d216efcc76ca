//! Parameter - bus producer output
//!
//! Named scalar values decoded by an avionics bus reader, and the source
//! trait the reader implements.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::ContractError;

/// Known bus parameter vocabulary
///
/// Bus producers identify values by name. Names outside this set are
/// ignored by the registry rather than treated as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParameterKind {
    RollAngle,
    PitchAngle,
    YawAngle,
    Heading,
    IndicatedAirspeed,
    IndicatedAltitude,
    VerticalSpeed,
    ManifoldPressure,
    EngineRpm,
    OilPressure,
    OilTemperature,
    FuelQuantity,
    FuelFlow,
    CylinderHeadTemperature,
    ExhaustGasTemperature,
}

impl ParameterKind {
    /// Every known kind, in vocabulary order
    pub const ALL: [ParameterKind; 15] = [
        Self::RollAngle,
        Self::PitchAngle,
        Self::YawAngle,
        Self::Heading,
        Self::IndicatedAirspeed,
        Self::IndicatedAltitude,
        Self::VerticalSpeed,
        Self::ManifoldPressure,
        Self::EngineRpm,
        Self::OilPressure,
        Self::OilTemperature,
        Self::FuelQuantity,
        Self::FuelFlow,
        Self::CylinderHeadTemperature,
        Self::ExhaustGasTemperature,
    ];

    /// Canonical bus name
    pub fn name(self) -> &'static str {
        match self {
            Self::RollAngle => "Roll Angle",
            Self::PitchAngle => "Pitch Angle",
            Self::YawAngle => "Yaw Angle",
            Self::Heading => "Heading",
            Self::IndicatedAirspeed => "Indicated Airspeed",
            Self::IndicatedAltitude => "Indicated Altitude",
            Self::VerticalSpeed => "Vertical Speed",
            Self::ManifoldPressure => "Manifold Pressure",
            Self::EngineRpm => "Engine RPM",
            Self::OilPressure => "Oil Pressure",
            Self::OilTemperature => "Oil Temperature",
            Self::FuelQuantity => "Fuel Quantity",
            Self::FuelFlow => "Fuel Flow",
            Self::CylinderHeadTemperature => "Cylinder Head Temperature",
            Self::ExhaustGasTemperature => "Exhaust Gas Temperature",
        }
    }

    /// Resolve a bus name, `None` for names outside the vocabulary
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Resolve a bus name, failing for unknown names
    pub fn parse_name(name: &str) -> Result<Self, ContractError> {
        Self::from_name(name).ok_or_else(|| ContractError::unknown_parameter(name))
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named value as delivered by a bus producer
#[derive(Debug, Clone)]
pub struct Parameter {
    /// Bus name, e.g. "Roll Angle"
    pub name: String,

    /// Decoded value
    pub value: f64,

    /// Arrival time
    pub received_at: Instant,
}

impl Parameter {
    /// Create a parameter stamped with the current instant
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            received_at: Instant::now(),
        }
    }

    /// Create a parameter from a known kind
    pub fn of(kind: ParameterKind, value: f64) -> Self {
        Self::new(kind.name(), value)
    }

    /// Resolve the parameter name against the vocabulary
    pub fn kind(&self) -> Option<ParameterKind> {
        ParameterKind::from_name(&self.name)
    }
}

/// Parameter callback type
///
/// Invoked from the producer's own thread for every decoded parameter.
pub type ParameterCallback = Arc<dyn Fn(Parameter) + Send + Sync>;

/// Bus parameter source trait
///
/// Abstracts an avionics bus reader that runs on its own execution context
/// and reports decoded parameters through a registered callback. The bus
/// wire protocol stays behind this trait.
pub trait ParameterSource: Send + Sync {
    /// Source name (used for logging)
    fn source_name(&self) -> &str;

    /// Register the parameter callback
    ///
    /// Replaces any previously registered callback.
    fn set_parameter_callback(&self, callback: ParameterCallback);

    /// Start producing parameters
    ///
    /// # Errors
    /// Returns an error if the source cannot acquire its device or was already started.
    fn start(&self) -> Result<(), ContractError>;

    /// Stop producing parameters; safe to call more than once
    fn stop(&self);

    /// Check if currently running
    fn is_running(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip_for_every_kind() {
        for kind in ParameterKind::ALL {
            assert_eq!(ParameterKind::from_name(kind.name()), Some(kind));
        }
    }

    #[test]
    fn test_unknown_name_is_none() {
        assert_eq!(ParameterKind::from_name("UnknownParam"), None);
        assert_eq!(ParameterKind::from_name("roll angle"), None);
    }

    #[test]
    fn test_parse_name_error_names_parameter() {
        let err = ParameterKind::parse_name("Flap Position").unwrap_err();
        assert!(err.to_string().contains("Flap Position"));
    }

    #[test]
    fn test_parameter_kind_lookup() {
        let param = Parameter::new("Pitch Angle", 2.5);
        assert_eq!(param.kind(), Some(ParameterKind::PitchAngle));
        assert_eq!(Parameter::of(ParameterKind::Heading, 90.0).name, "Heading");
    }
}
