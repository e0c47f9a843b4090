//! Cycle outcomes and the exporter's own collection metrics

use std::time::Duration;

use tracing::warn;
use virtstat_domain::{impl_str_conversions, EntityClass};

use crate::metrics::families::{
    COLLECTION_CYCLES, COLLECTION_DURATION, COLLECTION_ENTITIES, COLLECTION_ERRORS,
};
use crate::metrics::{MetricModel, MetricsResult};

/// Where in a cycle a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorScope {
    /// Listing the entities of a class
    Listing,
    /// Hard failure of one entity
    Entity,
    /// One entity exceeded its collection deadline
    Timeout,
    /// One metric group of an entity
    Group,
}

impl_str_conversions!(ErrorScope {
    Listing => "listing",
    Entity => "entity",
    Timeout => "timeout",
    Group => "group",
});

/// Summary of one collection cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Entities returned by the listing
    pub listed: usize,
    pub succeeded: usize,
    /// Hard failures, including tasks that panicked
    pub failed: usize,
    pub timed_out: usize,
    pub duration: Duration,
}

impl CycleReport {
    /// Every listed entity finished, whatever the outcome.
    pub fn is_complete(&self) -> bool {
        self.succeeded + self.failed + self.timed_out == self.listed
    }
}

/// Count one failure in `virtstat_collection_errors_total`.
pub fn record_error(model: &MetricModel, class: EntityClass, scope: ErrorScope) {
    let class = class.to_string();
    let scope = scope.to_string();
    log_metric(
        model.inc_counter(COLLECTION_ERRORS.name, &[&class, &scope], 1.0),
        COLLECTION_ERRORS.name,
    );
}

/// Fold a finished cycle into the self metrics.
pub fn record_cycle(model: &MetricModel, class: EntityClass, report: &CycleReport) {
    let class = class.to_string();
    let labels = [class.as_str()];

    log_metric(model.inc_counter(COLLECTION_CYCLES.name, &labels, 1.0), COLLECTION_CYCLES.name);
    log_metric(
        model.set_gauge(COLLECTION_DURATION.name, &labels, report.duration.as_secs_f64()),
        COLLECTION_DURATION.name,
    );
    #[allow(clippy::cast_precision_loss)]
    let listed = report.listed as f64;
    log_metric(model.set_gauge(COLLECTION_ENTITIES.name, &labels, listed), COLLECTION_ENTITIES.name);
}

fn log_metric(result: MetricsResult<()>, metric: &'static str) {
    if let Err(err) = result {
        warn!(metric = metric, error = %err, "Failed to record collection metric");
    }
}
