//! Telemetry queue - producer/consumer hand-off
//!
//! Backed by an `async-channel` pair. Both ends live in one cloneable
//! handle: the receive thread pushes, the dispatch loop pops, and neither
//! ever blocks.

use std::sync::Arc;

use async_channel::{bounded, unbounded, Receiver, Sender, TryRecvError};
use contracts::RawFrame;
use tracing::{trace, warn};

use crate::config::{IngestionMetrics, QueuePolicy};

/// Thread-safe FIFO of raw frames
#[derive(Debug, Clone)]
pub struct TelemetryQueue {
    tx: Sender<RawFrame>,
    rx: Receiver<RawFrame>,
    policy: QueuePolicy,
    metrics: Arc<IngestionMetrics>,
}

impl TelemetryQueue {
    /// Create a queue with the given growth policy
    pub fn new(policy: QueuePolicy) -> Self {
        Self::with_metrics(policy, Arc::new(IngestionMetrics::new()))
    }

    /// Create an unbounded queue
    pub fn unbounded() -> Self {
        Self::new(QueuePolicy::Unbounded)
    }

    /// Create a queue reporting into shared metrics
    pub fn with_metrics(policy: QueuePolicy, metrics: Arc<IngestionMetrics>) -> Self {
        let (tx, rx) = match policy {
            QueuePolicy::Unbounded => unbounded(),
            QueuePolicy::DropOldest { capacity } => bounded(capacity.max(1)),
        };

        Self {
            tx,
            rx,
            policy,
            metrics,
        }
    }

    /// Enqueue a frame; never blocks
    ///
    /// Under `DropOldest` a full queue evicts its oldest frame to make room.
    pub fn push(&self, frame: RawFrame) {
        let seq = frame.seq;
        match self.policy {
            QueuePolicy::Unbounded => {
                if self.tx.try_send(frame).is_err() {
                    warn!(seq, "telemetry queue closed, frame discarded");
                }
            }
            QueuePolicy::DropOldest { .. } => match self.tx.force_send(frame) {
                Ok(Some(evicted)) => {
                    self.metrics.record_evicted();
                    trace!(seq, evicted_seq = evicted.seq, "queue full, oldest frame evicted");
                }
                Ok(None) => {}
                Err(_) => warn!(seq, "telemetry queue closed, frame discarded"),
            },
        }
        self.metrics.update_queue_len(self.tx.len());
    }

    /// Dequeue the oldest frame, `None` if the queue is empty
    pub fn try_pop(&self) -> Option<RawFrame> {
        match self.rx.try_recv() {
            Ok(frame) => {
                self.metrics.update_queue_len(self.rx.len());
                Some(frame)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => None,
        }
    }

    /// Frames currently waiting
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn policy(&self) -> QueuePolicy {
        self.policy
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_try_pop_empty_returns_none() {
        let queue = TelemetryQueue::unbounded();
        assert!(queue.try_pop().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_fifo_order() {
        let queue = TelemetryQueue::unbounded();
        for (seq, text) in ["A", "B", "C"].into_iter().enumerate() {
            queue.push(RawFrame::new(seq as u64 + 1, text));
        }

        let popped: Vec<String> = std::iter::from_fn(|| queue.try_pop())
            .map(|f| f.text)
            .collect();
        assert_eq!(popped, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_fifo_with_concurrent_producer() {
        let queue = TelemetryQueue::unbounded();
        let producer_queue = queue.clone();
        const COUNT: u64 = 10_000;

        let producer = thread::spawn(move || {
            for seq in 1..=COUNT {
                producer_queue.push(RawFrame::new(seq, seq.to_string()));
            }
        });

        let mut expected = 1;
        while expected <= COUNT {
            if let Some(frame) = queue.try_pop() {
                assert_eq!(frame.seq, expected);
                assert_eq!(frame.text, expected.to_string());
                expected += 1;
            } else {
                thread::yield_now();
            }
        }

        producer.join().unwrap();
        assert!(queue.try_pop().is_none());
    }

    #[test]
    fn test_unbounded_keeps_backlog() {
        let queue = TelemetryQueue::unbounded();
        for seq in 1..=1000 {
            queue.push(RawFrame::new(seq, "x"));
        }
        assert_eq!(queue.len(), 1000);
        assert_eq!(queue.metrics().snapshot().queue_len, 1000);
        assert_eq!(queue.metrics().snapshot().frames_evicted, 0);
        assert_eq!(queue.try_pop().unwrap().seq, 1);
    }

    #[test]
    fn test_drop_oldest_evicts_front() {
        let queue = TelemetryQueue::new(QueuePolicy::DropOldest { capacity: 2 });
        for seq in 1..=5 {
            queue.push(RawFrame::new(seq, "x"));
        }

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.metrics().snapshot().frames_evicted, 3);
        assert_eq!(queue.try_pop().unwrap().seq, 4);
        assert_eq!(queue.try_pop().unwrap().seq, 5);
        assert!(queue.try_pop().is_none());
    }
}
