//! EfisBlueprint - Config Loader output
//!
//! Describes a complete display session: operating mode, network feed,
//! queue policy, dispatch cadence, frame layout and bus bindings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ContractError, FrameLayout, Instrument, ParameterKind};

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Avionics bus parameters through the registry
    #[default]
    Normal,
    /// Network simulator feed through the telemetry queue
    Fgfs,
    /// Generated sweeps of every instrument
    Test,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Fgfs => "fgfs",
            Self::Test => "test",
        }
    }
}

/// Complete session configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EfisBlueprint {
    pub version: ConfigVersion,
    pub mode: Mode,
    pub network: NetworkConfig,
    pub queue: QueueConfig,
    pub dispatch: DispatchConfig,
    pub layout: FrameLayout,
    pub bus: BusConfig,
}

/// Network telemetry receiver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Bind address
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Largest datagram accepted; longer datagrams are truncated by the OS
    pub max_datagram_size: usize,

    /// Socket read timeout; bounds how long `stop()` takes to be observed
    pub read_timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            max_datagram_size: 1024,
            read_timeout_ms: 100,
        }
    }
}

impl NetworkConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Queue growth policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueuePolicy {
    /// Never drop, never block the producer
    #[default]
    Unbounded,
    /// Evict the oldest frame once `capacity` frames are waiting
    DropOldest { capacity: usize },
}

/// Policy selector as written in config files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueuePolicyKind {
    #[default]
    Unbounded,
    DropOldest,
}

/// Telemetry queue settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub policy: QueuePolicyKind,

    /// Only used by `drop_oldest`
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            policy: QueuePolicyKind::Unbounded,
            capacity: 256,
        }
    }
}

impl QueueConfig {
    pub fn to_policy(&self) -> QueuePolicy {
        match self.policy {
            QueuePolicyKind::Unbounded => QueuePolicy::Unbounded,
            QueuePolicyKind::DropOldest => QueuePolicy::DropOldest {
                capacity: self.capacity,
            },
        }
    }
}

/// Dispatch loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Tick cadence
    pub poll_interval_ms: u64,

    /// Progress log interval (0 = disabled)
    pub stats_interval_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1,
            stats_interval_secs: 5,
        }
    }
}

impl DispatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Avionics bus settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Bus adapter name
    pub adapter: String,

    /// Bus device name
    pub device: String,

    /// Parameter rate of the simulated bus (Hz)
    pub rate_hz: f64,

    /// Parameter -> instrument bindings (None = mode default)
    pub bindings: Option<Vec<BindingConfig>>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            adapter: "simulated".to_string(),
            device: "vcan0".to_string(),
            rate_hz: 50.0,
            bindings: None,
        }
    }
}

/// One configured registry binding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingConfig {
    /// Bus parameter name, e.g. "Roll Angle"
    pub parameter: String,
    pub instrument: Instrument,
}

impl BusConfig {
    /// Resolve configured bindings, falling back to the mode default
    ///
    /// # Errors
    /// Returns `UnknownParameter` for a binding whose name is outside the vocabulary.
    pub fn resolve_bindings(
        &self,
        mode: Mode,
    ) -> Result<Vec<(ParameterKind, Instrument)>, ContractError> {
        match &self.bindings {
            Some(bindings) => bindings
                .iter()
                .map(|b| Ok((ParameterKind::parse_name(&b.parameter)?, b.instrument)))
                .collect(),
            None => Ok(default_bindings(mode)),
        }
    }
}

/// Standard instrument for a parameter kind, if the panel has one
pub fn standard_instrument(kind: ParameterKind) -> Option<Instrument> {
    match kind {
        ParameterKind::RollAngle => Some(Instrument::RollAngle),
        ParameterKind::PitchAngle => Some(Instrument::PitchAngle),
        ParameterKind::Heading => Some(Instrument::Heading),
        ParameterKind::IndicatedAirspeed => Some(Instrument::Airspeed),
        ParameterKind::IndicatedAltitude => Some(Instrument::Altitude),
        ParameterKind::ManifoldPressure => Some(Instrument::ManifoldPressure),
        ParameterKind::EngineRpm => Some(Instrument::Rpm),
        ParameterKind::OilPressure => Some(Instrument::OilPressure),
        ParameterKind::OilTemperature => Some(Instrument::OilTemperature),
        ParameterKind::FuelQuantity => Some(Instrument::FuelQuantity),
        ParameterKind::FuelFlow => Some(Instrument::FuelFlow),
        ParameterKind::CylinderHeadTemperature => Some(Instrument::MaxCht),
        ParameterKind::ExhaustGasTemperature => Some(Instrument::Egt),
        ParameterKind::YawAngle | ParameterKind::VerticalSpeed => None,
    }
}

/// Default bindings per mode
///
/// Normal mode wires the attitude and heading parameters only; test mode
/// wires every parameter that has a standard instrument. Fgfs mode has no
/// bus producer.
pub fn default_bindings(mode: Mode) -> Vec<(ParameterKind, Instrument)> {
    match mode {
        Mode::Normal => vec![
            (ParameterKind::PitchAngle, Instrument::PitchAngle),
            (ParameterKind::RollAngle, Instrument::RollAngle),
            (ParameterKind::Heading, Instrument::Heading),
        ],
        Mode::Test => ParameterKind::ALL
            .into_iter()
            .filter_map(|kind| standard_instrument(kind).map(|inst| (kind, inst)))
            .collect(),
        Mode::Fgfs => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let bp: EfisBlueprint = toml::from_str("").unwrap();
        assert_eq!(bp.mode, Mode::Normal);
        assert_eq!(bp.network.port, 5000);
        assert_eq!(bp.network.max_datagram_size, 1024);
        assert_eq!(bp.queue.to_policy(), QueuePolicy::Unbounded);
        assert_eq!(bp.dispatch.poll_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_drop_oldest_policy() {
        let bp: EfisBlueprint = toml::from_str(
            r#"
mode = "fgfs"

[queue]
policy = "drop_oldest"
capacity = 8
"#,
        )
        .unwrap();
        assert_eq!(bp.mode, Mode::Fgfs);
        assert_eq!(bp.queue.to_policy(), QueuePolicy::DropOldest { capacity: 8 });
    }

    #[test]
    fn test_normal_mode_default_bindings() {
        let bindings = BusConfig::default().resolve_bindings(Mode::Normal).unwrap();
        assert_eq!(bindings.len(), 3);
        assert!(bindings.contains(&(ParameterKind::RollAngle, Instrument::RollAngle)));
    }

    #[test]
    fn test_test_mode_binds_every_standard_instrument() {
        let bindings = default_bindings(Mode::Test);
        assert_eq!(bindings.len(), 13);
        assert!(!bindings
            .iter()
            .any(|(kind, _)| *kind == ParameterKind::VerticalSpeed));
    }

    #[test]
    fn test_configured_bindings_reject_unknown_names() {
        let bus = BusConfig {
            bindings: Some(vec![BindingConfig {
                parameter: "Flap Position".to_string(),
                instrument: Instrument::Heading,
            }]),
            ..Default::default()
        };
        assert!(matches!(
            bus.resolve_bindings(Mode::Normal),
            Err(ContractError::UnknownParameter { .. })
        ));
    }
}
