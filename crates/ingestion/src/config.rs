//! Ingestion metrics

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

pub use contracts::QueuePolicy;

/// Ingestion metrics
///
/// Shared between the receive thread, the queue and whoever reports.
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Total frames pushed onto the queue
    pub frames_received: AtomicU64,

    /// Total payload bytes of pushed frames
    pub bytes_received: AtomicU64,

    /// Socket receive failures
    pub receive_errors: AtomicU64,

    /// Datagrams dropped because they were not valid UTF-8
    pub invalid_frames: AtomicU64,

    /// Frames evicted by a drop-oldest queue
    pub frames_evicted: AtomicU64,

    /// Current queue length
    pub queue_len: AtomicUsize,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record frame received
    pub fn record_received(&self, bytes: usize) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Record socket receive error
    pub fn record_receive_error(&self) {
        self.receive_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record non-text datagram
    pub fn record_invalid_frame(&self) {
        self.invalid_frames.fetch_add(1, Ordering::Relaxed);
    }

    /// Record queue eviction
    pub fn record_evicted(&self) {
        self.frames_evicted.fetch_add(1, Ordering::Relaxed);
    }

    /// Update queue length
    pub fn update_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            receive_errors: self.receive_errors.load(Ordering::Relaxed),
            invalid_frames: self.invalid_frames.load(Ordering::Relaxed),
            frames_evicted: self.frames_evicted.load(Ordering::Relaxed),
            queue_len: self.queue_len.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub frames_received: u64,
    pub bytes_received: u64,
    pub receive_errors: u64,
    pub invalid_frames: u64,
    pub frames_evicted: u64,
    pub queue_len: usize,
}
