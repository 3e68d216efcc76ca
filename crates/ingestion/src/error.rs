//! Ingestion error types

use thiserror::Error;

/// Ingestion errors
///
/// Only lifecycle failures surface here; bad datagrams are counted and
/// dropped inside the receive loop.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Listening socket could not be acquired
    #[error("failed to bind telemetry socket on {addr}: {source}")]
    Bind {
        /// Requested bind address
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Socket option could not be applied
    #[error("failed to configure telemetry socket: {0}")]
    SocketConfig(#[source] std::io::Error),

    /// Receive thread could not be spawned
    #[error("failed to spawn receive thread for {source_name}: {source}")]
    Spawn {
        /// Source name
        source_name: String,
        #[source]
        source: std::io::Error,
    },

    /// Source was already started once
    #[error("source {source_name} was already started")]
    AlreadyStarted {
        /// Source name
        source_name: String,
    },

    /// Source was stopped before it started
    #[error("source {source_name} was stopped before start")]
    Stopped {
        /// Source name
        source_name: String,
    },
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
