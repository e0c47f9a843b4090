//! Metric model error types

use thiserror::Error;
use virtstat_domain::VirtstatError;

use super::MetricKind;

/// Errors raised when declaring or writing metric families.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// A write named a family that was never declared
    #[error("metric family '{0}' is not declared")]
    UndeclaredFamily(String),

    /// A family with this name already exists
    #[error("metric family '{0}' is already declared")]
    DuplicateFamily(String),

    /// The family name does not follow the naming rules for its kind
    #[error("invalid metric family name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// The write operation does not apply to the family's kind
    #[error("metric family '{family}' is a {actual}, not a {expected}")]
    KindMismatch { family: String, expected: MetricKind, actual: MetricKind },

    /// The number of label values differs from the declared schema
    #[error("metric family '{family}' takes {expected} label values, got {actual}")]
    LabelMismatch { family: String, expected: usize, actual: usize },

    /// Counters only move forward
    #[error("cannot increment counter '{family}' by negative amount {delta}")]
    NegativeIncrement { family: String, delta: f64 },

    /// The underlying registry rejected the operation
    #[error("metric registry error: {0}")]
    Registry(#[from] prometheus::Error),
}

/// Result type for metric model operations
pub type MetricsResult<T> = Result<T, MetricsError>;

impl From<MetricsError> for VirtstatError {
    fn from(err: MetricsError) -> Self {
        Self::Metrics(err.to_string())
    }
}
