//! Dispatch loop - the single consumer of telemetry
//!
//! On every tick the loop first applies bus parameter updates forwarded by
//! `RegistryHandle`s, then takes at most one frame off the telemetry queue,
//! decodes it and applies its values to the panel. Sinks are only ever
//! invoked from here.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{DispatchConfig, RawFrame};
use ingestion::{FrameDecoder, TelemetryQueue};
use observability::{DispatchStatsAggregator, MetricsSummary};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::DispatcherError;
use crate::metrics::{DispatchMetrics, MetricsSnapshot};
use crate::panel::InstrumentPanel;
use crate::registry::{ApplyOutcome, ParameterRegistry, RegistryHandle};

/// Dispatch loop configuration
#[derive(Debug, Clone)]
pub struct DispatchLoopConfig {
    /// Tick cadence
    pub poll_interval: Duration,
    /// Progress log interval (None = disabled)
    pub stats_interval: Option<Duration>,
}

impl Default for DispatchLoopConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1),
            stats_interval: Some(Duration::from_secs(5)),
        }
    }
}

impl DispatchLoopConfig {
    /// Build from the blueprint's dispatch section
    pub fn from_config(config: &DispatchConfig) -> Result<Self, DispatcherError> {
        if config.poll_interval_ms == 0 {
            return Err(DispatcherError::invalid_config(
                "dispatch.poll_interval_ms",
                "must be > 0",
            ));
        }
        Ok(Self {
            poll_interval: config.poll_interval(),
            stats_interval: (config.stats_interval_secs > 0)
                .then(|| Duration::from_secs(config.stats_interval_secs)),
        })
    }
}

/// What one tick did with the telemetry queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Queue empty (or no network source); nothing decoded
    Idle,
    /// Frame decoded and applied
    Applied { seq: u64 },
    /// Frame failed to decode; no sink touched
    Dropped { seq: u64 },
}

/// Final counters returned when the loop stops
#[derive(Debug, Clone)]
pub struct DispatchStats {
    pub counters: MetricsSnapshot,
    /// Parameters ignored for an unknown name
    pub parameters_unknown: u64,
    pub summary: MetricsSummary,
}

impl fmt::Display for DispatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary)?;
        writeln!(f, "Ticks: {}", self.counters.ticks)?;
        writeln!(f, "Sink updates: {}", self.counters.sink_updates)?;
        writeln!(f, "Unknown parameters: {}", self.parameters_unknown)
    }
}

/// Single-consumer dispatch loop
pub struct DispatchLoop {
    config: DispatchLoopConfig,
    queue: Option<TelemetryQueue>,
    decoder: FrameDecoder,
    registry: ParameterRegistry,
    panel: InstrumentPanel,
    metrics: Arc<DispatchMetrics>,
    aggregator: DispatchStatsAggregator,
}

impl DispatchLoop {
    /// Loop over `panel` with no network queue and no bindings
    pub fn new(config: DispatchLoopConfig, panel: InstrumentPanel) -> Self {
        Self {
            config,
            queue: None,
            decoder: FrameDecoder::default(),
            registry: ParameterRegistry::new(),
            panel,
            metrics: Arc::new(DispatchMetrics::new()),
            aggregator: DispatchStatsAggregator::new(),
        }
    }

    /// Consume frames from `queue`, decoding with `decoder`
    pub fn with_queue(mut self, queue: TelemetryQueue, decoder: FrameDecoder) -> Self {
        self.queue = Some(queue);
        self.decoder = decoder;
        self
    }

    /// Replace the parameter registry
    ///
    /// Handles taken from the previous registry are disconnected.
    pub fn with_registry(mut self, registry: ParameterRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &ParameterRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ParameterRegistry {
        &mut self.registry
    }

    /// Handle for bus producers
    pub fn registry_handle(&self) -> RegistryHandle {
        self.registry.handle()
    }

    pub fn panel(&self) -> &InstrumentPanel {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut InstrumentPanel {
        &mut self.panel
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<DispatchMetrics> {
        self.metrics.clone()
    }

    /// Run one iteration
    ///
    /// Applies every parameter update pending at entry, then pops and
    /// applies at most one frame.
    pub fn tick(&mut self) -> TickOutcome {
        self.metrics.inc_ticks();
        self.drain_parameters();

        let Some(raw) = self.queue.as_ref().and_then(TelemetryQueue::try_pop) else {
            return TickOutcome::Idle;
        };
        self.apply_frame(raw)
    }

    fn drain_parameters(&mut self) -> usize {
        let metrics = &self.metrics;
        let aggregator = &mut self.aggregator;
        self.registry.drain_into(&mut self.panel, |update, outcome| {
            let bound = match outcome {
                ApplyOutcome::Applied(sinks) => {
                    metrics.inc_parameters_applied();
                    metrics.add_sink_updates(sinks);
                    true
                }
                ApplyOutcome::Unbound => {
                    metrics.inc_parameters_unbound();
                    false
                }
            };
            aggregator.record_parameter(bound);
            observability::record_parameter_dispatched(update.kind.name(), bound);
        })
    }

    fn apply_frame(&mut self, raw: RawFrame) -> TickOutcome {
        self.metrics.inc_frames_popped();
        let latency_ms = raw.received_at.elapsed().as_secs_f64() * 1000.0;
        let depth = self.queue.as_ref().map_or(0, TelemetryQueue::len);
        observability::record_queue_latency_ms(latency_ms);
        observability::record_queue_depth(depth);

        match self.decoder.decode(&raw.text) {
            Ok(frame) => {
                let sinks = self.panel.apply_all(frame.updates());
                self.metrics.add_sink_updates(sinks);
                self.metrics.inc_frames_applied();
                self.aggregator.record_frame(true, latency_ms, depth);
                observability::record_frame_decoded(true);
                trace!(seq = raw.seq, sinks, "frame applied");
                TickOutcome::Applied { seq: raw.seq }
            }
            Err(error) => {
                self.metrics.inc_frames_dropped();
                self.aggregator.record_frame(false, latency_ms, depth);
                observability::record_frame_decoded(false);
                let dropped = self.metrics.frames_dropped();
                if dropped == 1 || dropped.is_multiple_of(100) {
                    warn!(seq = raw.seq, %error, dropped, "frame dropped");
                } else {
                    debug!(seq = raw.seq, %error, "frame dropped");
                }
                TickOutcome::Dropped { seq: raw.seq }
            }
        }
    }

    /// Apply what is already queued, ignoring tick cadence
    ///
    /// Bounded by the backlog at entry so a live producer cannot keep it
    /// spinning.
    fn drain_remaining(&mut self) -> usize {
        let backlog = self.queue.as_ref().map_or(0, TelemetryQueue::len);
        let mut drained = self.drain_parameters();
        for _ in 0..backlog {
            let Some(raw) = self.queue.as_ref().and_then(TelemetryQueue::try_pop) else {
                break;
            };
            self.apply_frame(raw);
            drained += 1;
        }
        drained
    }

    /// Current counters and summary
    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            counters: self.metrics.snapshot(),
            parameters_unknown: self.registry.unknown_count(),
            summary: self.aggregator.summary(),
        }
    }

    /// Tick at the configured cadence until `shutdown` resolves
    ///
    /// Stop producers before resolving `shutdown`; whatever they left in
    /// the queue is applied before the loop returns.
    #[instrument(name = "dispatch_loop_run", skip_all)]
    pub async fn run<F>(mut self, shutdown: F) -> DispatchStats
    where
        F: Future<Output = ()>,
    {
        info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            network = self.queue.is_some(),
            bindings = self.registry.binding_count(),
            instruments = self.panel.instruments().count(),
            "Dispatch loop started"
        );

        let mut ticker = time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut last_report = Instant::now();
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    self.tick();
                    self.maybe_report(&mut last_report);
                }
            }
        }

        let drained = self.drain_remaining();
        let stats = self.stats();
        info!(
            drained,
            frames_applied = stats.counters.frames_applied,
            frames_dropped = stats.counters.frames_dropped,
            parameters_applied = stats.counters.parameters_applied,
            "Dispatch loop stopped"
        );
        stats
    }

    /// Spawn the loop as a background task
    pub fn spawn<F>(self, shutdown: F) -> JoinHandle<DispatchStats>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(self.run(shutdown))
    }

    fn maybe_report(&self, last_report: &mut Instant) {
        let Some(every) = self.config.stats_interval else {
            return;
        };
        if last_report.elapsed() < every {
            return;
        }
        *last_report = Instant::now();

        let snapshot = self.metrics.snapshot();
        debug!(
            frames_applied = snapshot.frames_applied,
            frames_dropped = snapshot.frames_dropped,
            parameters_applied = snapshot.parameters_applied,
            queue_len = self.queue.as_ref().map_or(0, TelemetryQueue::len),
            "Dispatch loop progress"
        );
    }
}
