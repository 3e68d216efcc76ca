//! LogSink - logs instrument values via tracing

use contracts::{Instrument, InstrumentSink};
use tracing::{debug, trace};

/// Sink that logs instrument values for debugging
///
/// Every update is traced; every `every`-th update is also emitted at
/// debug level so a running panel can be followed without trace noise.
pub struct LogSink {
    name: String,
    instrument: Instrument,
    every: u64,
    updates: u64,
}

impl LogSink {
    /// Create a new LogSink for `instrument`
    pub fn new(instrument: Instrument) -> Self {
        Self {
            name: format!("log:{}", instrument.label()),
            instrument,
            every: 100,
            updates: 0,
        }
    }

    /// Emit at debug level every `every` updates (0 = never)
    pub fn with_debug_every(mut self, every: u64) -> Self {
        self.every = every;
        self
    }

    /// Updates seen so far
    pub fn updates(&self) -> u64 {
        self.updates
    }
}

impl InstrumentSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_value(&mut self, value: f64) {
        self.updates += 1;
        trace!(instrument = %self.instrument, value, "instrument updated");
        if self.every > 0 && self.updates.is_multiple_of(self.every) {
            debug!(
                sink = %self.name,
                instrument = %self.instrument,
                value,
                updates = self.updates,
                "instrument value"
            );
        }
    }
}
