//! Error types used throughout the exporter

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for virtstat
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum VirtstatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Host error: {0}")]
    Host(String),

    #[error("Metrics error: {0}")]
    Metrics(String),

    #[error("Descriptor error: {0}")]
    Descriptor(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for virtstat operations
pub type Result<T> = std::result::Result<T, VirtstatError>;

/// Failure reported by a virtualization host call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The connection to the host could not be opened or was lost
    #[error("host connection unavailable: {0}")]
    Connection(String),

    /// A single host API call failed
    #[error("{operation} failed: {message}")]
    Call { operation: &'static str, message: String },

    /// The host or its bindings do not expose the requested data
    #[error("{0} is not supported by this host")]
    Unsupported(&'static str),

    /// The call was handed to the blocking pool but never returned a value
    #[error("blocking host call did not complete: {0}")]
    Offload(String),
}

impl HostError {
    /// Build a [`HostError::Call`] for the named operation.
    pub fn call(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Call { operation, message: message.into() }
    }
}

impl From<HostError> for VirtstatError {
    fn from(err: HostError) -> Self {
        Self::Host(err.to_string())
    }
}

/// Result type alias for host client calls
pub type HostResult<T> = std::result::Result<T, HostError>;
