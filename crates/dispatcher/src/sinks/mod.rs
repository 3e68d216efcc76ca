//! Instrument sink implementations

mod gauge;
mod log;

pub use gauge::{GaugeReader, GaugeSink};
pub use log::LogSink;
