//! # Contracts
//!
//! Frozen interface contracts shared by every stage of the EFIS pipeline.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Data paths
//! - Bus: `ParameterSource` -> `Parameter` -> registry -> `InstrumentSink`
//! - Network: datagram -> `RawFrame` -> queue -> `TelemetryFrame` -> `InstrumentSink`

mod blueprint;
mod error;
mod frame;
mod instrument;
mod parameter;

pub use blueprint::*;
pub use error::*;
pub use frame::*;
pub use instrument::*;
pub use parameter::{Parameter, ParameterCallback, ParameterKind, ParameterSource};
