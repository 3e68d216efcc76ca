//! Parameter registry - bus parameter name to instrument bindings
//!
//! Producers run on their own threads and only hold a `RegistryHandle`.
//! The handle resolves the name and forwards the update over a channel; the
//! registry itself lives with the dispatch loop, which drains the channel
//! and invokes the bound sinks. Sinks therefore only ever run on the loop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use async_channel::{Receiver, Sender, TryRecvError};
use contracts::{Instrument, Parameter, ParameterCallback, ParameterKind};
use tracing::{debug, trace};

use crate::panel::InstrumentPanel;

/// A resolved bus parameter waiting for the dispatch loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterUpdate {
    pub kind: ParameterKind,
    pub value: f64,
    pub received_at: Instant,
}

/// Outcome of applying one parameter update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Delivered to this many sinks
    Applied(usize),
    /// No instrument bound to the parameter
    Unbound,
}

/// Consumer-side registry
///
/// Registering the same instrument twice for one parameter delivers every
/// update to it twice.
#[derive(Debug)]
pub struct ParameterRegistry {
    bindings: HashMap<ParameterKind, Vec<Instrument>>,
    tx: Sender<ParameterUpdate>,
    rx: Receiver<ParameterUpdate>,
    unknown: Arc<AtomicU64>,
}

impl Default for ParameterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterRegistry {
    pub fn new() -> Self {
        let (tx, rx) = async_channel::unbounded();
        Self {
            bindings: HashMap::new(),
            tx,
            rx,
            unknown: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Registry pre-populated with `bindings`
    pub fn with_bindings(bindings: impl IntoIterator<Item = (ParameterKind, Instrument)>) -> Self {
        let mut registry = Self::new();
        for (kind, instrument) in bindings {
            registry.register(kind, instrument);
        }
        registry
    }

    /// Bind an instrument to a parameter
    pub fn register(&mut self, kind: ParameterKind, instrument: Instrument) {
        debug!(parameter = %kind, %instrument, "parameter bound");
        self.bindings.entry(kind).or_default().push(instrument);
    }

    /// Instruments bound to `kind`, in registration order
    pub fn bindings_for(&self, kind: ParameterKind) -> &[Instrument] {
        self.bindings.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of bindings
    pub fn binding_count(&self) -> usize {
        self.bindings.values().map(Vec::len).sum()
    }

    /// Producer-side handle
    pub fn handle(&self) -> RegistryHandle {
        RegistryHandle {
            tx: self.tx.clone(),
            unknown: self.unknown.clone(),
        }
    }

    /// Updates forwarded but not yet applied
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Parameters dropped by handles for an unknown name
    pub fn unknown_count(&self) -> u64 {
        self.unknown.load(Ordering::Relaxed)
    }

    /// Apply one update to every bound instrument
    pub fn apply(&self, update: &ParameterUpdate, panel: &mut InstrumentPanel) -> ApplyOutcome {
        let instruments = self.bindings_for(update.kind);
        if instruments.is_empty() {
            trace!(parameter = %update.kind, "parameter has no binding");
            return ApplyOutcome::Unbound;
        }
        let sinks = instruments
            .iter()
            .map(|&instrument| panel.set(instrument, update.value))
            .sum();
        ApplyOutcome::Applied(sinks)
    }

    /// Apply every update pending at call time, in arrival order
    ///
    /// Updates forwarded while draining wait for the next call, so a busy
    /// producer cannot hold the loop here.
    pub fn drain_into(
        &self,
        panel: &mut InstrumentPanel,
        mut on_applied: impl FnMut(&ParameterUpdate, ApplyOutcome),
    ) -> usize {
        let pending = self.rx.len();
        let mut drained = 0;
        while drained < pending {
            match self.rx.try_recv() {
                Ok(update) => {
                    let outcome = self.apply(&update, panel);
                    on_applied(&update, outcome);
                    drained += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        drained
    }
}

/// Producer-side registry handle
///
/// Cheap to clone and safe to use from any thread.
#[derive(Debug, Clone)]
pub struct RegistryHandle {
    tx: Sender<ParameterUpdate>,
    unknown: Arc<AtomicU64>,
}

impl RegistryHandle {
    /// Forward a parameter value to the dispatch loop
    ///
    /// Unknown names are ignored. Returns whether the update was forwarded.
    pub fn dispatch(&self, identifier: &str, value: f64) -> bool {
        let Some(kind) = ParameterKind::from_name(identifier) else {
            self.unknown.fetch_add(1, Ordering::Relaxed);
            observability::record_parameter_ignored();
            trace!(identifier, "unknown parameter ignored");
            return false;
        };
        self.forward(ParameterUpdate {
            kind,
            value,
            received_at: Instant::now(),
        })
    }

    /// Forward a parameter delivered by a `ParameterSource`
    pub fn dispatch_parameter(&self, parameter: Parameter) -> bool {
        let Some(kind) = parameter.kind() else {
            self.unknown.fetch_add(1, Ordering::Relaxed);
            observability::record_parameter_ignored();
            trace!(identifier = %parameter.name, "unknown parameter ignored");
            return false;
        };
        self.forward(ParameterUpdate {
            kind,
            value: parameter.value,
            received_at: parameter.received_at,
        })
    }

    /// Callback suitable for `ParameterSource::set_parameter_callback`
    pub fn callback(&self) -> ParameterCallback {
        let handle = self.clone();
        Arc::new(move |parameter| {
            handle.dispatch_parameter(parameter);
        })
    }

    fn forward(&self, update: ParameterUpdate) -> bool {
        // Closed only once the registry is gone; nothing left to update.
        self.tx.try_send(update).is_ok()
    }
}
