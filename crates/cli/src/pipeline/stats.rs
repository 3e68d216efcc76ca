//! Pipeline statistics and metrics.

use std::net::SocketAddr;
use std::time::Duration;

use contracts::{Instrument, Mode};
use dispatcher::DispatchStats;

/// Statistics from a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineStats {
    /// Operating mode of the run
    pub mode: Mode,

    /// Total duration of the run
    pub duration: Duration,

    /// Bound telemetry address (fgfs mode)
    pub listen_addr: Option<SocketAddr>,

    /// Receive-side counters (fgfs mode)
    pub ingestion: Option<ingestion::MetricsSnapshot>,

    /// Dispatch loop counters
    pub dispatch: DispatchStats,

    /// Last value shown on each instrument
    pub readings: Vec<(Instrument, f64)>,
}

impl PipelineStats {
    /// Applied frames per second
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.dispatch.counters.frames_applied as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Bus parameters applied per second
    pub fn parameter_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.dispatch.counters.parameters_applied as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    EFIS Run Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        let counters = &self.dispatch.counters;
        println!("📊 Overview");
        println!("   ├─ Mode: {}", self.mode.as_str());
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Ticks: {}", counters.ticks);
        println!("   └─ Sink updates: {}", counters.sink_updates);

        if let Some(ref ingestion) = self.ingestion {
            println!("\n📡 Network Feed");
            if let Some(addr) = self.listen_addr {
                println!("   ├─ Listening on: {addr}");
            }
            println!("   ├─ Frames received: {}", ingestion.frames_received);
            println!("   ├─ Bytes received: {}", ingestion.bytes_received);
            println!("   ├─ Invalid datagrams: {}", ingestion.invalid_frames);
            println!("   ├─ Receive errors: {}", ingestion.receive_errors);
            println!("   ├─ Evicted (queue full): {}", ingestion.frames_evicted);
            println!("   ├─ Frames applied: {}", counters.frames_applied);
            println!("   ├─ Frames dropped (decode): {}", counters.frames_dropped);
            println!("   └─ FPS: {:.2}", self.fps());
        }

        if counters.parameters_applied + counters.parameters_unbound + self.dispatch.parameters_unknown > 0 {
            println!("\n🔌 Bus Parameters");
            println!("   ├─ Applied: {}", counters.parameters_applied);
            println!("   ├─ Unbound: {}", counters.parameters_unbound);
            println!("   ├─ Unknown name: {}", self.dispatch.parameters_unknown);
            println!("   └─ Rate: {:.2}/s", self.parameter_rate());
        }

        let summary = &self.dispatch.summary;
        println!("\n📈 Dispatch Metrics");
        println!("   ├─ Drop rate: {:.2}%", summary.drop_rate);
        println!("   ├─ Queue latency (ms): {}", summary.queue_latency_ms);
        println!("   └─ Queue depth: {}", summary.queue_depth);

        if !self.readings.is_empty() {
            println!("\n🛩  Last Readings");
            for (i, (instrument, value)) in self.readings.iter().enumerate() {
                let prefix = if i == self.readings.len() - 1 { "└─" } else { "├─" };
                println!("   {prefix} {instrument}: {value:.2}");
            }
        }

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatcher::MetricsSnapshot;
    use observability::MetricsSummary;

    fn stats(frames_applied: u64, secs: u64) -> PipelineStats {
        PipelineStats {
            mode: Mode::Fgfs,
            duration: Duration::from_secs(secs),
            listen_addr: None,
            ingestion: Some(ingestion::MetricsSnapshot::default()),
            dispatch: DispatchStats {
                counters: MetricsSnapshot {
                    frames_applied,
                    ..Default::default()
                },
                parameters_unknown: 0,
                summary: MetricsSummary::default(),
            },
            readings: vec![(Instrument::Airspeed, 120.5)],
        }
    }

    #[test]
    fn test_fps() {
        assert!((stats(300, 10).fps() - 30.0).abs() < 1e-9);
        assert_eq!(stats(300, 0).fps(), 0.0);
    }

    #[test]
    fn test_print_summary_does_not_panic() {
        stats(10, 1).print_summary();
    }
}
