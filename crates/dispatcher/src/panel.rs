//! Instrument panel - sinks addressed by instrument

use std::collections::BTreeMap;

use contracts::{Instrument, InstrumentSink, InstrumentUpdate};
use tracing::trace;

use crate::sinks::{GaugeReader, GaugeSink, LogSink};

/// Sinks attached to each panel instrument
///
/// An instrument may carry any number of sinks; an update for an instrument
/// with none is a no-op.
#[derive(Default)]
pub struct InstrumentPanel {
    sinks: BTreeMap<Instrument, Vec<Box<dyn InstrumentSink>>>,
}

impl InstrumentPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Panel with a `GaugeSink` on every instrument
    ///
    /// Returns the panel and one reader per instrument. With `log = true`
    /// each instrument also gets a `LogSink`.
    pub fn with_gauges(log: bool) -> (Self, GaugeBoard) {
        let mut panel = Self::new();
        let mut readers = BTreeMap::new();
        for instrument in Instrument::ALL {
            let (sink, reader) = GaugeSink::for_instrument(instrument);
            panel.attach(instrument, sink);
            if log {
                panel.attach(instrument, LogSink::new(instrument));
            }
            readers.insert(instrument, reader);
        }
        (panel, GaugeBoard { readers })
    }

    /// Attach a sink to an instrument
    pub fn attach(&mut self, instrument: Instrument, sink: impl InstrumentSink + 'static) {
        self.attach_boxed(instrument, Box::new(sink));
    }

    pub fn attach_boxed(&mut self, instrument: Instrument, sink: Box<dyn InstrumentSink>) {
        self.sinks.entry(instrument).or_default().push(sink);
    }

    /// Number of sinks on `instrument`
    pub fn sink_count(&self, instrument: Instrument) -> usize {
        self.sinks.get(&instrument).map_or(0, Vec::len)
    }

    /// Instruments with at least one sink
    pub fn instruments(&self) -> impl Iterator<Item = Instrument> + '_ {
        self.sinks
            .iter()
            .filter(|(_, sinks)| !sinks.is_empty())
            .map(|(instrument, _)| *instrument)
    }

    /// Apply a value to every sink of one instrument
    ///
    /// Returns the number of sinks invoked.
    pub fn set(&mut self, instrument: Instrument, value: f64) -> usize {
        let Some(sinks) = self.sinks.get_mut(&instrument) else {
            return 0;
        };
        for sink in sinks.iter_mut() {
            trace!(sink = sink.name(), %instrument, value, "sink set");
            sink.set_value(value);
        }
        sinks.len()
    }

    pub fn apply(&mut self, update: InstrumentUpdate) -> usize {
        self.set(update.instrument, update.value)
    }

    /// Apply updates in order
    pub fn apply_all(&mut self, updates: impl IntoIterator<Item = InstrumentUpdate>) -> usize {
        updates.into_iter().map(|update| self.apply(update)).sum()
    }
}

impl std::fmt::Debug for InstrumentPanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (instrument, sinks) in &self.sinks {
            let names: Vec<&str> = sinks.iter().map(|s| s.name()).collect();
            map.entry(instrument, &names);
        }
        map.finish()
    }
}

/// Readers for a gauge-backed panel
#[derive(Debug, Clone)]
pub struct GaugeBoard {
    readers: BTreeMap<Instrument, GaugeReader>,
}

impl GaugeBoard {
    pub fn reader(&self, instrument: Instrument) -> Option<&GaugeReader> {
        self.readers.get(&instrument)
    }

    /// Latest value of `instrument`, `None` if never set
    pub fn value(&self, instrument: Instrument) -> Option<f64> {
        self.readers.get(&instrument).and_then(GaugeReader::value)
    }

    /// Updates applied to `instrument`
    pub fn updates(&self, instrument: Instrument) -> u64 {
        self.readers.get(&instrument).map_or(0, GaugeReader::updates)
    }

    /// Current values of every instrument that has been set
    pub fn readings(&self) -> Vec<(Instrument, f64)> {
        self.readers
            .iter()
            .filter_map(|(instrument, reader)| reader.value().map(|v| (*instrument, v)))
            .collect()
    }
}
