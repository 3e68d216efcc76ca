//! Layered error definitions
//!
//! Categorized by source: config / bus / io

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Bus Errors =====
    /// Parameter name outside the known vocabulary (only raised where a
    /// name must resolve, e.g. configured bindings)
    #[error("unknown parameter name: '{name}'")]
    UnknownParameter { name: String },

    /// Bus source lifecycle error
    #[error("bus source '{source_name}' error: {message}")]
    BusSource {
        source_name: String,
        message: String,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create unknown parameter error
    pub fn unknown_parameter(name: impl Into<String>) -> Self {
        Self::UnknownParameter { name: name.into() }
    }

    /// Create bus source error
    pub fn bus_source(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BusSource {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}
