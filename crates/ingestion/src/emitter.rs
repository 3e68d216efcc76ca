//! Frame emitter - UDP fire-and-forget telemetry sender
//!
//! Plays the simulator side of the network feed: synthetic frames in the
//! same comma-delimited layout the decoder reads.

use std::f64::consts::TAU;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use contracts::{FrameLayout, TelemetryFrame};
use tracing::{debug, instrument, trace};

use crate::decoder::encode_frame;

/// Sends telemetry frames to a receiver
pub struct FrameEmitter {
    socket: UdpSocket,
    target: SocketAddr,
    layout: FrameLayout,
    sent: u64,
}

impl FrameEmitter {
    /// Create an emitter targeting `target`
    #[instrument(name = "frame_emitter_connect", skip(target))]
    pub fn connect(target: impl ToSocketAddrs) -> io::Result<Self> {
        let target = target.to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "target resolved to no address")
        })?;
        let bind = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind)?;
        socket.connect(target)?;

        debug!(%target, "frame emitter connected");
        Ok(Self {
            socket,
            target,
            layout: FrameLayout::default(),
            sent: 0,
        })
    }

    /// Use a non-default field layout
    pub fn with_layout(mut self, layout: FrameLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Frames sent so far
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Send raw frame text as one datagram
    pub fn send_text(&mut self, text: &str) -> io::Result<usize> {
        let len = self.socket.send(text.as_bytes())?;
        self.sent += 1;
        trace!(target = %self.target, seq = self.sent, len, "frame sent");
        Ok(len)
    }

    /// Encode and send a decoded frame
    pub fn send_frame(&mut self, frame: &TelemetryFrame) -> io::Result<usize> {
        let text = encode_frame(frame, &self.layout);
        self.send_text(&text)
    }

    /// Send the synthetic flight sample for time `t`
    pub fn send_synthetic(&mut self, t: f64) -> io::Result<usize> {
        self.send_frame(&synthetic_frame(t))
    }
}

/// Plausible cruise telemetry at time `t` (seconds)
pub fn synthetic_frame(t: f64) -> TelemetryFrame {
    let wave = |period: f64| (TAU * t / period).sin();
    TelemetryFrame {
        airspeed: 112.0 + 6.0 * wave(25.0),
        pitch: 2.0 + 2.5 * wave(9.0),
        roll: 20.0 * wave(12.0),
        heading: (90.0 + t * 2.0).rem_euclid(360.0),
        altitude: (4500.0 + 150.0 * wave(40.0)) as i32,
        rpm: (2400.0 + 50.0 * wave(15.0)) as i32,
        oil_temperature: 205.0 + 3.0 * wave(60.0),
        oil_pressure: 62.0 + 2.0 * wave(17.0),
        egt: 1320.0 + 15.0 * wave(21.0),
        fuel_flow: 8.4 + 0.3 * wave(13.0),
        fuel_quantity: (38.0 - t * 0.002).max(0.0),
    }
}
