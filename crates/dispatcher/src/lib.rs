//! # Dispatcher
//!
//! Telemetry dispatch module.
//!
//! Responsibilities:
//! - Own the single consumer loop (`DispatchLoop`)
//! - Route bus parameters to instruments (`ParameterRegistry`)
//! - Fan decoded values out to instrument sinks (`InstrumentPanel`)
//!
//! ## Usage Example
//!
//! ```ignore
//! use dispatcher::{DispatchLoop, DispatchLoopConfig, InstrumentPanel};
//!
//! let (panel, board) = InstrumentPanel::with_gauges(false);
//! let dispatch = DispatchLoop::new(DispatchLoopConfig::default(), panel)
//!     .with_queue(queue.clone(), FrameDecoder::default());
//!
//! bus.set_parameter_callback(dispatch.registry_handle().callback());
//! let stats = dispatch.run(shutdown_signal()).await;
//! ```

pub mod dispatch_loop;
pub mod error;
pub mod metrics;
pub mod panel;
pub mod registry;
pub mod sinks;

pub use contracts::{Instrument, InstrumentSink, InstrumentUpdate};
pub use dispatch_loop::{DispatchLoop, DispatchLoopConfig, DispatchStats, TickOutcome};
pub use error::DispatcherError;
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use panel::{GaugeBoard, InstrumentPanel};
pub use registry::{ApplyOutcome, ParameterRegistry, ParameterUpdate, RegistryHandle};
pub use sinks::{GaugeReader, GaugeSink, LogSink};
