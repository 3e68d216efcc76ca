//! Pipeline orchestrator - coordinates producers and the dispatch loop.
//!
//! Mode selects the producer: the network feed for `fgfs`, a simulated bus
//! for `normal` and `test`. Shutdown stops the producer first, then lets the
//! dispatch loop drain whatever it left behind.

use std::future::Future;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use contracts::{EfisBlueprint, Mode, ParameterSource};
use dispatcher::{DispatchLoop, DispatchLoopConfig, InstrumentPanel, ParameterRegistry};
use ingestion::{FrameDecoder, NetworkSourceConfig, NetworkTelemetrySource, SimulatedBus, TelemetryQueue};
use tokio::sync::oneshot;
use tracing::{info, warn};

use super::PipelineStats;

/// How long shutdown waits for the receive thread
const NETWORK_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Period of one full instrument sweep in test mode
const SWEEP_PERIOD_SECS: f64 = 10.0;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The session configuration
    pub blueprint: EfisBlueprint,

    /// Stop after this long (None = until shutdown signal)
    pub duration: Option<Duration>,

    /// Attach a `LogSink` to every instrument
    pub log_instruments: bool,
}

/// Running telemetry producer
enum Producer {
    Network(NetworkTelemetrySource),
    Bus(SimulatedBus),
}

impl Producer {
    fn stop(&self) {
        match self {
            Self::Network(source) => {
                source.stop();
                if !source.join(NETWORK_JOIN_TIMEOUT) {
                    warn!(
                        source = source.name(),
                        timeout_ms = NETWORK_JOIN_TIMEOUT.as_millis() as u64,
                        "Receive thread did not exit in time"
                    );
                }
            }
            Self::Bus(bus) => bus.stop(),
        }
    }
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until `shutdown` resolves or the configured duration elapses
    pub async fn run<F>(self, shutdown: F) -> Result<PipelineStats>
    where
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        // Setup Dispatch Loop
        let (panel, board) = InstrumentPanel::with_gauges(self.config.log_instruments);
        let loop_config = DispatchLoopConfig::from_config(&blueprint.dispatch)
            .context("Invalid dispatch configuration")?;
        let bindings = blueprint
            .bus
            .resolve_bindings(blueprint.mode)
            .context("Invalid bus bindings")?;
        info!(mode = blueprint.mode.as_str(), bindings = bindings.len(), "Dispatch loop configured");

        let dispatch = DispatchLoop::new(loop_config, panel)
            .with_registry(ParameterRegistry::with_bindings(bindings));

        // Start Producer
        let (dispatch, producer, listen_addr, queue) = match blueprint.mode {
            Mode::Fgfs => {
                let queue = TelemetryQueue::new(blueprint.queue.to_policy());
                let source = NetworkTelemetrySource::new(
                    "fgfs",
                    NetworkSourceConfig::from(&blueprint.network),
                    queue.clone(),
                );
                let addr = source
                    .start()
                    .context("Failed to start network telemetry source")?;
                info!(%addr, policy = ?queue.policy(), "Network telemetry source started");

                let dispatch =
                    dispatch.with_queue(queue.clone(), FrameDecoder::new(blueprint.layout.clone()));
                (dispatch, Producer::Network(source), Some(addr), Some(queue))
            }
            Mode::Normal | Mode::Test => {
                let bus = create_bus(blueprint)?;
                bus.set_parameter_callback(dispatch.registry_handle().callback());
                bus.start().context("Failed to start bus source")?;
                info!(source = bus.source_name(), rate_hz = blueprint.bus.rate_hz, "Bus source started");
                (dispatch, Producer::Bus(bus), None::<SocketAddr>, None)
            }
        };

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let dispatch_handle = dispatch.spawn(async move {
            let _ = stop_rx.await;
        });

        info!(duration = ?self.config.duration, "Pipeline running");

        // Wait for shutdown or duration
        let deadline = async {
            match self.config.duration {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            _ = shutdown => info!("Shutdown requested"),
            _ = deadline => info!("Run duration elapsed"),
        }

        // Shutdown: producer first, then drain
        info!("Shutting down pipeline...");
        tokio::task::spawn_blocking(move || producer.stop())
            .await
            .context("Producer shutdown task failed")?;
        let _ = stop_tx.send(());
        let dispatch_stats = dispatch_handle
            .await
            .context("Dispatch loop task failed")?;

        let stats = PipelineStats {
            mode: blueprint.mode,
            duration: start_time.elapsed(),
            listen_addr,
            ingestion: queue.map(|q| q.metrics().snapshot()),
            dispatch: dispatch_stats,
            readings: board.readings(),
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            frames_applied = stats.dispatch.counters.frames_applied,
            parameters_applied = stats.dispatch.counters.parameters_applied,
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }
}

/// Bus producer for normal/test mode
fn create_bus(blueprint: &EfisBlueprint) -> Result<SimulatedBus> {
    let bus = &blueprint.bus;
    if bus.adapter != "simulated" {
        bail!(
            "Unsupported bus adapter '{}' on {} (only 'simulated' is available)",
            bus.adapter,
            bus.device
        );
    }
    Ok(match blueprint.mode {
        Mode::Test => SimulatedBus::sweep("sweep", bus.rate_hz, SWEEP_PERIOD_SECS),
        _ => SimulatedBus::cruise("bus", bus.rate_hz),
    })
}
