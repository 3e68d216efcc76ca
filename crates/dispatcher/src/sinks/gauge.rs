//! GaugeSink - latest-value cell readable from other threads
//!
//! The rendering side (or a test) holds the `GaugeReader`; the dispatch loop
//! owns the `GaugeSink`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use contracts::{Instrument, InstrumentSink};

#[derive(Debug, Default)]
struct GaugeState {
    /// f64 bits of the latest value
    bits: AtomicU64,
    updates: AtomicU64,
}

/// Sink that stores the latest value
pub struct GaugeSink {
    name: String,
    state: Arc<GaugeState>,
    /// Prometheus label, when exported
    export: Option<&'static str>,
}

impl GaugeSink {
    /// Create a sink and its reader
    pub fn new(name: impl Into<String>) -> (Self, GaugeReader) {
        let state = Arc::new(GaugeState::default());
        let sink = Self {
            name: name.into(),
            state: state.clone(),
            export: None,
        };
        (sink, GaugeReader { state })
    }

    /// Sink for a panel instrument, exported as `efis_instrument_value`
    pub fn for_instrument(instrument: Instrument) -> (Self, GaugeReader) {
        let (mut sink, reader) = Self::new(instrument.label());
        sink.export = Some(instrument.label());
        (sink, reader)
    }
}

impl InstrumentSink for GaugeSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_value(&mut self, value: f64) {
        self.state.bits.store(value.to_bits(), Ordering::Release);
        self.state.updates.fetch_add(1, Ordering::AcqRel);
        if let Some(label) = self.export {
            observability::record_instrument_value(label, value);
        }
    }
}

/// Read side of a `GaugeSink`
#[derive(Debug, Clone)]
pub struct GaugeReader {
    state: Arc<GaugeState>,
}

impl GaugeReader {
    /// Latest value, `None` until the first update
    pub fn value(&self) -> Option<f64> {
        if self.updates() == 0 {
            return None;
        }
        Some(f64::from_bits(self.state.bits.load(Ordering::Acquire)))
    }

    /// Number of values applied
    pub fn updates(&self) -> u64 {
        self.state.updates.load(Ordering::Acquire)
    }
}
