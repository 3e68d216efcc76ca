//! Network telemetry source
//!
//! UDP receive loop on a dedicated thread. Each datagram is one frame; the
//! loop only ever touches the `TelemetryQueue`.

use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use contracts::{NetworkConfig, RawFrame};
use metrics::counter;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::config::IngestionMetrics;
use crate::error::{IngestionError, Result};
use crate::queue::TelemetryQueue;

/// Pause after a hard receive error before retrying
const ERROR_BACKOFF: Duration = Duration::from_millis(10);

/// Poll step used by `join`
const JOIN_POLL: Duration = Duration::from_millis(5);

/// Network source configuration
#[derive(Debug, Clone)]
pub struct NetworkSourceConfig {
    /// Bind address, e.g. "127.0.0.1:5000"
    pub bind_addr: String,

    /// Receive buffer size
    pub max_datagram_size: usize,

    /// Socket read timeout
    pub read_timeout: Duration,
}

impl Default for NetworkSourceConfig {
    fn default() -> Self {
        Self::from(&NetworkConfig::default())
    }
}

impl From<&NetworkConfig> for NetworkSourceConfig {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            bind_addr: config.bind_addr(),
            max_datagram_size: config.max_datagram_size,
            read_timeout: config.read_timeout(),
        }
    }
}

/// UDP telemetry producer
///
/// Lifecycle: `start()` once, `stop()` any number of times, `join(timeout)`
/// to wait for the receive thread.
pub struct NetworkTelemetrySource {
    name: String,
    config: NetworkSourceConfig,
    queue: TelemetryQueue,
    metrics: Arc<IngestionMetrics>,
    started: AtomicBool,
    stopped: AtomicBool,
    running: Arc<AtomicBool>,
    local_addr: Mutex<Option<SocketAddr>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl NetworkTelemetrySource {
    /// Create a source feeding `queue`
    pub fn new(name: impl Into<String>, config: NetworkSourceConfig, queue: TelemetryQueue) -> Self {
        let metrics = queue.metrics();
        Self {
            name: name.into(),
            config,
            queue,
            metrics,
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            running: Arc::new(AtomicBool::new(false)),
            local_addr: Mutex::new(None),
            handle: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind the socket and spawn the receive thread
    ///
    /// # Errors
    /// `Bind` when the socket cannot be acquired (the one fatal condition),
    /// `AlreadyStarted` on a second call, `Stopped` once `stop()` was called.
    #[instrument(
        name = "network_source_start",
        skip(self),
        fields(source = %self.name, addr = %self.config.bind_addr)
    )]
    pub fn start(&self) -> Result<SocketAddr> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(IngestionError::AlreadyStarted {
                source_name: self.name.clone(),
            });
        }
        if self.stopped.load(Ordering::SeqCst) {
            return Err(IngestionError::Stopped {
                source_name: self.name.clone(),
            });
        }

        let socket =
            UdpSocket::bind(&self.config.bind_addr).map_err(|source| IngestionError::Bind {
                addr: self.config.bind_addr.clone(),
                source,
            })?;
        // A zero timeout is rejected by the OS
        let read_timeout = self.config.read_timeout.max(Duration::from_millis(1));
        socket
            .set_read_timeout(Some(read_timeout))
            .map_err(IngestionError::SocketConfig)?;
        let local_addr = socket.local_addr().map_err(IngestionError::SocketConfig)?;

        self.running.store(true, Ordering::SeqCst);
        // A stop() racing with this start must not be lost
        if self.stopped.load(Ordering::SeqCst) {
            self.running.store(false, Ordering::SeqCst);
            return Err(IngestionError::Stopped {
                source_name: self.name.clone(),
            });
        }

        let ctx = ReceiveLoop {
            name: self.name.clone(),
            socket,
            queue: self.queue.clone(),
            metrics: self.metrics.clone(),
            running: self.running.clone(),
            buffer_size: self.config.max_datagram_size.max(1),
        };

        let handle = thread::Builder::new()
            .name(format!("{}-rx", self.name))
            .spawn(move || ctx.run())
            .map_err(|source| {
                self.running.store(false, Ordering::SeqCst);
                IngestionError::Spawn {
                    source_name: self.name.clone(),
                    source,
                }
            })?;

        *lock(&self.handle) = Some(handle);
        *lock(&self.local_addr) = Some(local_addr);

        info!(source = %self.name, %local_addr, "network telemetry source listening");
        Ok(local_addr)
    }

    /// Signal the receive loop to exit
    ///
    /// Takes effect after at most one further receive or read timeout.
    /// Safe before `start()` and on repeated calls; a stopped source never
    /// starts.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        if self.running.swap(false, Ordering::SeqCst) {
            debug!(source = %self.name, "stopping network telemetry source");
        }
    }

    /// Wait up to `timeout` for the receive thread to finish
    ///
    /// Returns `true` when the thread has exited (or was never started).
    /// `Duration::ZERO` only checks, it never waits.
    pub fn join(&self, timeout: Duration) -> bool {
        let mut guard = lock(&self.handle);
        let Some(handle) = guard.as_ref() else {
            return true;
        };

        let deadline = Instant::now() + timeout;
        while !handle.is_finished() {
            let now = Instant::now();
            if now >= deadline {
                trace!(source = %self.name, "join timed out");
                return false;
            }
            thread::sleep(JOIN_POLL.min(deadline - now));
        }

        if let Some(handle) = guard.take() {
            if handle.join().is_err() {
                error!(source = %self.name, "receive thread panicked");
            }
        }
        debug!(source = %self.name, "receive thread joined");
        true
    }

    /// Check if the receive loop is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Bound socket address, once started
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *lock(&self.local_addr)
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }
}

impl Drop for NetworkTelemetrySource {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State owned by the receive thread
struct ReceiveLoop {
    name: String,
    socket: UdpSocket,
    queue: TelemetryQueue,
    metrics: Arc<IngestionMetrics>,
    running: Arc<AtomicBool>,
    buffer_size: usize,
}

impl ReceiveLoop {
    fn run(self) {
        debug!(source = %self.name, "receive loop started");

        let mut buf = vec![0u8; self.buffer_size];
        let mut seq: u64 = 0;

        while self.running.load(Ordering::Acquire) {
            match self.socket.recv_from(&mut buf) {
                Ok((len, peer)) => match std::str::from_utf8(&buf[..len]) {
                    Ok(text) => {
                        seq += 1;
                        self.metrics.record_received(len);
                        counter!("efis_frames_received_total", "source" => self.name.clone())
                            .increment(1);
                        trace!(source = %self.name, seq, %peer, len, "frame received");
                        self.queue.push(RawFrame::new(seq, text));
                    }
                    Err(e) => {
                        self.metrics.record_invalid_frame();
                        counter!("efis_invalid_frames_total", "source" => self.name.clone())
                            .increment(1);
                        warn!(source = %self.name, %peer, len, error = %e, "non-text datagram dropped");
                    }
                },
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    // idle tick, re-check the stop flag
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    self.metrics.record_receive_error();
                    counter!("efis_receive_errors_total", "source" => self.name.clone())
                        .increment(1);
                    warn!(source = %self.name, error = %e, "receive failed");
                    thread::sleep(ERROR_BACKOFF);
                }
            }
        }

        debug!(source = %self.name, frames = seq, "receive loop exited");
    }
}
