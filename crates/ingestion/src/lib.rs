//! # Ingestion
//!
//! Telemetry ingestion module.
//!
//! Responsibilities:
//! - Receive simulator datagrams on a dedicated thread (`NetworkTelemetrySource`)
//! - Hand frames to the consumer through a non-blocking FIFO (`TelemetryQueue`)
//! - Decode positional frame text into typed values (`FrameDecoder`)
//! - Simulated bus producers for running without hardware (`SimulatedBus`)
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{FrameDecoder, NetworkSourceConfig, NetworkTelemetrySource, TelemetryQueue};
//!
//! let queue = TelemetryQueue::unbounded();
//! let source = NetworkTelemetrySource::new("fgfs", NetworkSourceConfig::default(), queue.clone());
//! source.start()?;
//!
//! let decoder = FrameDecoder::default();
//! if let Some(raw) = queue.try_pop() {
//!     let frame = decoder.decode(&raw.text)?;
//! }
//!
//! source.stop();
//! source.join(Duration::from_secs(1));
//! ```

mod config;
mod decoder;
mod emitter;
mod error;
mod mock;
mod network;
mod queue;

// Re-exports
pub use config::{IngestionMetrics, MetricsSnapshot, QueuePolicy};
pub use contracts::RawFrame;
pub use decoder::{encode_frame, DecodeError, FrameDecoder, FIELD_DELIMITER};
pub use emitter::{synthetic_frame, FrameEmitter};
pub use error::{IngestionError, Result};
pub use mock::{BusScript, SimulatedBus, SimulatedBusConfig};
pub use network::{NetworkSourceConfig, NetworkTelemetrySource};
pub use queue::TelemetryQueue;
