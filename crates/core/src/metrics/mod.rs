//! Metric model
//!
//! - `model`: the registry-backed store written by collectors and rendered
//!   by the exposition endpoint
//! - `families`: the catalog of every family the exporter publishes
//! - `error`: declaration and write errors

pub mod error;
pub mod families;
pub mod model;

pub use error::{MetricsError, MetricsResult};
pub use model::MetricModel;
use virtstat_domain::impl_str_conversions;

/// How a family's series behave over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Replaced on every write
    Gauge,
    /// Cumulative, mirrors a host counter
    Counter,
    /// Constant `1`, payload carried in labels
    Info,
}

impl_str_conversions!(MetricKind {
    Gauge => "gauge",
    Counter => "counter",
    Info => "info",
});

/// Static description of one metric family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilySpec {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
    /// Ordered label schema; every write supplies values in this order
    pub labels: &'static [&'static str],
    /// Base unit the name is suffixed with (`bytes`, `seconds`)
    pub unit: Option<&'static str>,
}

impl FamilySpec {
    pub const fn gauge(
        name: &'static str,
        help: &'static str,
        labels: &'static [&'static str],
    ) -> Self {
        Self { name, help, kind: MetricKind::Gauge, labels, unit: None }
    }

    pub const fn counter(
        name: &'static str,
        help: &'static str,
        labels: &'static [&'static str],
    ) -> Self {
        Self { name, help, kind: MetricKind::Counter, labels, unit: None }
    }

    pub const fn info(
        name: &'static str,
        help: &'static str,
        labels: &'static [&'static str],
    ) -> Self {
        Self { name, help, kind: MetricKind::Info, labels, unit: None }
    }

    pub const fn with_unit(self, unit: &'static str) -> Self {
        Self { unit: Some(unit), ..self }
    }
}
