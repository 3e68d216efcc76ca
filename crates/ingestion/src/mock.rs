//! Simulated bus sources
//!
//! `ParameterSource` implementations that generate parameters on a
//! background thread, for running without avionics hardware.

use std::f64::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use contracts::{ContractError, Parameter, ParameterCallback, ParameterKind, ParameterSource};
use tracing::{debug, trace, warn};

/// What a simulated bus emits
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BusScript {
    /// Gentle attitude oscillation plus air data, like a bus in level cruise
    Cruise,
    /// Triangle sweeps of every panel instrument through its full range
    Sweep {
        /// Seconds for one full sweep
        period_secs: f64,
    },
}

/// Simulated bus configuration
#[derive(Debug, Clone)]
pub struct SimulatedBusConfig {
    /// Emission rate (Hz)
    pub rate_hz: f64,
    pub script: BusScript,
}

impl Default for SimulatedBusConfig {
    fn default() -> Self {
        Self {
            rate_hz: 50.0,
            script: BusScript::Cruise,
        }
    }
}

/// Sweep ranges, matching the manual test controls
const SWEEP_RANGES: [(ParameterKind, f64, f64); 13] = [
    (ParameterKind::RollAngle, -180.0, 180.0),
    (ParameterKind::PitchAngle, -90.0, 90.0),
    (ParameterKind::ManifoldPressure, 0.0, 30.0),
    (ParameterKind::EngineRpm, 0.0, 3000.0),
    (ParameterKind::Heading, 0.0, 360.0),
    (ParameterKind::IndicatedAltitude, 0.0, 10000.0),
    (ParameterKind::IndicatedAirspeed, 0.0, 140.0),
    (ParameterKind::OilPressure, 0.0, 100.0),
    (ParameterKind::OilTemperature, 160.0, 250.0),
    (ParameterKind::FuelQuantity, 0.0, 50.0),
    (ParameterKind::FuelFlow, 0.0, 20.0),
    (ParameterKind::CylinderHeadTemperature, 0.0, 500.0),
    (ParameterKind::ExhaustGasTemperature, 0.0, 1500.0),
];

impl BusScript {
    /// Parameters emitted at time `t` (seconds since start)
    pub fn sample(&self, t: f64) -> Vec<Parameter> {
        match *self {
            Self::Cruise => vec![
                Parameter::of(ParameterKind::RollAngle, 15.0 * (TAU * t / 8.0).sin()),
                Parameter::of(ParameterKind::PitchAngle, 2.5 + 3.0 * (TAU * t / 11.0).sin()),
                Parameter::of(ParameterKind::Heading, (t * 3.0).rem_euclid(360.0)),
                Parameter::of(ParameterKind::IndicatedAirspeed, 110.0 + 5.0 * (TAU * t / 20.0).sin()),
                Parameter::of(ParameterKind::VerticalSpeed, 200.0 * (TAU * t / 30.0).cos()),
            ],
            Self::Sweep { period_secs } => {
                let phase = triangle(t / period_secs.max(f64::EPSILON));
                SWEEP_RANGES
                    .iter()
                    .map(|&(kind, low, high)| Parameter::of(kind, low + (high - low) * phase))
                    .collect()
            }
        }
    }
}

/// 0 -> 1 -> 0 over one unit of `x`
fn triangle(x: f64) -> f64 {
    let frac = x.rem_euclid(1.0);
    if frac < 0.5 {
        frac * 2.0
    } else {
        2.0 - frac * 2.0
    }
}

/// Simulated avionics bus
///
/// Implements `ParameterSource`; parameters are delivered through the
/// registered callback from the bus thread, the same way a hardware reader
/// would deliver them.
pub struct SimulatedBus {
    name: String,
    config: SimulatedBusConfig,
    callback: Mutex<Option<ParameterCallback>>,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SimulatedBus {
    pub fn new(name: impl Into<String>, config: SimulatedBusConfig) -> Self {
        Self {
            name: name.into(),
            config,
            callback: Mutex::new(None),
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }

    /// Cruise script at `rate_hz`
    pub fn cruise(name: impl Into<String>, rate_hz: f64) -> Self {
        Self::new(
            name,
            SimulatedBusConfig {
                rate_hz,
                script: BusScript::Cruise,
            },
        )
    }

    /// Full-range sweep at `rate_hz`
    pub fn sweep(name: impl Into<String>, rate_hz: f64, period_secs: f64) -> Self {
        Self::new(
            name,
            SimulatedBusConfig {
                rate_hz,
                script: BusScript::Sweep { period_secs },
            },
        )
    }
}

impl ParameterSource for SimulatedBus {
    fn source_name(&self) -> &str {
        &self.name
    }

    fn set_parameter_callback(&self, callback: ParameterCallback) {
        *self.callback.lock().unwrap_or_else(PoisonError::into_inner) = Some(callback);
    }

    fn start(&self) -> Result<(), ContractError> {
        let callback = self
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| ContractError::bus_source(&self.name, "no parameter callback registered"))?;

        if self.config.rate_hz <= 0.0 {
            return Err(ContractError::bus_source(
                &self.name,
                format!("rate_hz must be > 0, got {}", self.config.rate_hz),
            ));
        }

        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ContractError::bus_source(&self.name, "already running"));
        }

        let name = self.name.clone();
        let script = self.config.script;
        let interval = Duration::from_secs_f64(1.0 / self.config.rate_hz);
        let running = self.running.clone();

        let handle = thread::Builder::new()
            .name(format!("{}-bus", self.name))
            .spawn(move || {
                debug!(source = %name, ?script, "simulated bus started");
                let start = Instant::now();
                let mut emitted: u64 = 0;

                while running.load(Ordering::Relaxed) {
                    let t = start.elapsed().as_secs_f64();
                    for parameter in script.sample(t) {
                        callback(parameter);
                        emitted += 1;
                    }
                    trace!(source = %name, emitted, "bus cycle complete");
                    thread::sleep(interval);
                }

                debug!(source = %name, emitted, "simulated bus stopped");
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                ContractError::bus_source(&self.name, e.to_string())
            })?;

        *self.handle.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(())
    }

    fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!(source = %self.name, "bus thread panicked");
            }
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

impl Drop for SimulatedBus {
    fn drop(&mut self) {
        self.stop();
    }
}
