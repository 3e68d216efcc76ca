//! Dispatch metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters owned by the dispatch loop
///
/// Written only by the loop, readable from any thread.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Loop iterations
    ticks: AtomicU64,
    /// Frames taken off the queue
    frames_popped: AtomicU64,
    /// Frames decoded and applied
    frames_applied: AtomicU64,
    /// Frames dropped on decode failure
    frames_dropped: AtomicU64,
    /// Bus parameters applied to at least one sink
    parameters_applied: AtomicU64,
    /// Bus parameters with no binding
    parameters_unbound: AtomicU64,
    /// Individual sink invocations
    sink_updates: AtomicU64,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_ticks(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_frames_popped(&self) {
        self.frames_popped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_frames_applied(&self) {
        self.frames_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_frames_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_parameters_applied(&self) {
        self.parameters_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_parameters_unbound(&self) {
        self.parameters_unbound.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_sink_updates(&self, count: usize) {
        self.sink_updates.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn frames_applied(&self) -> u64 {
        self.frames_applied.load(Ordering::Relaxed)
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped.load(Ordering::Relaxed)
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            frames_popped: self.frames_popped.load(Ordering::Relaxed),
            frames_applied: self.frames_applied(),
            frames_dropped: self.frames_dropped(),
            parameters_applied: self.parameters_applied.load(Ordering::Relaxed),
            parameters_unbound: self.parameters_unbound.load(Ordering::Relaxed),
            sink_updates: self.sink_updates.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub ticks: u64,
    pub frames_popped: u64,
    pub frames_applied: u64,
    pub frames_dropped: u64,
    pub parameters_applied: u64,
    pub parameters_unbound: u64,
    pub sink_updates: u64,
}
