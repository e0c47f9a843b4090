//! In-memory metric model backed by a private Prometheus registry
//!
//! The model is owned explicitly and shared as `Arc<MetricModel>` between the
//! collectors and the exposition layer. Families are declared once at
//! startup; afterwards every write names a family and supplies exactly its
//! declared label values. Writes are atomic per series, and series are never
//! removed.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use prometheus::core::{Collector, Desc};
use prometheus::proto::{self, MetricFamily, MetricType};
use prometheus::{GaugeVec, Opts, Registry, TextEncoder};
use tracing::debug;

use super::error::{MetricsError, MetricsResult};
use super::{FamilySpec, MetricKind};

/// Counter family whose series hold the total exactly as written.
///
/// Totals are kept in a `GaugeVec`, so every write is one atomic store of
/// the host value; the family is gathered with the counter type.
#[derive(Clone)]
struct TotalVec {
    totals: GaugeVec,
}

impl Collector for TotalVec {
    fn desc(&self) -> Vec<&Desc> {
        self.totals.desc()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let mut families = self.totals.collect();
        for family in &mut families {
            family.set_field_type(MetricType::COUNTER);
            for metric in family.mut_metric() {
                let mut counter = proto::Counter::default();
                counter.set_value(metric.get_gauge().get_value());
                metric.set_counter(counter);
                metric.set_gauge(proto::Gauge::default());
            }
        }
        families
    }
}

/// Registry-side collector for one family.
enum FamilyVec {
    Gauge(GaugeVec),
    Counter(TotalVec),
}

struct Family {
    spec: FamilySpec,
    vec: FamilyVec,
    /// Label tuples written so far, so reads never create series.
    series: Mutex<HashSet<Vec<String>>>,
}

impl Family {
    fn check_kind(&self, expected: MetricKind) -> MetricsResult<()> {
        if self.spec.kind == expected {
            Ok(())
        } else {
            Err(MetricsError::KindMismatch {
                family: self.spec.name.to_string(),
                expected,
                actual: self.spec.kind,
            })
        }
    }

    fn check_labels(&self, values: &[&str]) -> MetricsResult<()> {
        if values.len() == self.spec.labels.len() {
            Ok(())
        } else {
            Err(MetricsError::LabelMismatch {
                family: self.spec.name.to_string(),
                expected: self.spec.labels.len(),
                actual: values.len(),
            })
        }
    }

    fn remember(&self, values: &[&str]) {
        self.series.lock().insert(series_key(values));
    }

    fn knows(&self, values: &[&str]) -> bool {
        self.series.lock().contains(&series_key(values))
    }

    fn gauge_vec(&self) -> Option<&GaugeVec> {
        match &self.vec {
            FamilyVec::Gauge(vec) => Some(vec),
            FamilyVec::Counter(_) => None,
        }
    }

    fn counter_vec(&self) -> Option<&GaugeVec> {
        match &self.vec {
            FamilyVec::Counter(vec) => Some(&vec.totals),
            FamilyVec::Gauge(_) => None,
        }
    }
}

/// Process-wide store of metric families and their series.
pub struct MetricModel {
    registry: Registry,
    families: RwLock<HashMap<&'static str, Arc<Family>>>,
}

impl MetricModel {
    /// Create an empty model with its own registry.
    pub fn new() -> Self {
        Self { registry: Registry::new(), families: RwLock::new(HashMap::new()) }
    }

    /// Declare one metric family.
    ///
    /// # Errors
    /// Fails if the name is already declared, breaks the suffix rules for its
    /// kind, or is rejected by the registry.
    pub fn declare(&self, spec: FamilySpec) -> MetricsResult<()> {
        validate_name(&spec)?;

        let mut families = self.families.write();
        if families.contains_key(spec.name) {
            return Err(MetricsError::DuplicateFamily(spec.name.to_string()));
        }

        let opts = Opts::new(spec.name, spec.help);
        let vec = match spec.kind {
            MetricKind::Gauge | MetricKind::Info => {
                let vec = GaugeVec::new(opts, spec.labels)?;
                self.registry.register(Box::new(vec.clone()))?;
                FamilyVec::Gauge(vec)
            }
            MetricKind::Counter => {
                let vec = TotalVec { totals: GaugeVec::new(opts, spec.labels)? };
                self.registry.register(Box::new(vec.clone()))?;
                FamilyVec::Counter(vec)
            }
        };

        debug!(family = spec.name, kind = %spec.kind, "Declared metric family");
        families.insert(spec.name, Arc::new(Family { spec, vec, series: Mutex::new(HashSet::new()) }));
        Ok(())
    }

    /// Declare every family in `specs`, stopping at the first failure.
    ///
    /// # Errors
    /// See [`MetricModel::declare`].
    pub fn declare_all(&self, specs: &[FamilySpec]) -> MetricsResult<()> {
        specs.iter().try_for_each(|spec| self.declare(*spec))
    }

    /// Replace a gauge series value.
    ///
    /// # Errors
    /// Fails on an undeclared family, a non-gauge family or a label arity
    /// mismatch.
    pub fn set_gauge(&self, name: &str, labels: &[&str], value: f64) -> MetricsResult<()> {
        let family = self.family(name)?;
        family.check_kind(MetricKind::Gauge)?;
        family.check_labels(labels)?;

        let vec = family.gauge_vec().ok_or_else(|| kind_error(&family, MetricKind::Gauge))?;
        vec.get_metric_with_label_values(labels)?.set(value);
        family.remember(labels);
        Ok(())
    }

    /// Make a counter series report the host total `value`.
    ///
    /// The value is stored as-is in a single atomic write, so the series
    /// mirrors the host exactly and an unchanged host counter leaves it
    /// untouched. A host value lower than the previous one means the host
    /// counter restarted (domain reboot, device re-attach); it is exposed
    /// directly, which Prometheus reads as a counter reset.
    ///
    /// # Errors
    /// Fails on an undeclared family, a non-counter family or a label arity
    /// mismatch.
    pub fn set_counter(&self, name: &str, labels: &[&str], value: f64) -> MetricsResult<()> {
        let family = self.family(name)?;
        family.check_kind(MetricKind::Counter)?;
        family.check_labels(labels)?;

        let vec = family.counter_vec().ok_or_else(|| kind_error(&family, MetricKind::Counter))?;
        vec.get_metric_with_label_values(labels)?.set(value.max(0.0));
        family.remember(labels);
        Ok(())
    }

    /// Add `delta` to a counter series.
    ///
    /// # Errors
    /// Fails on a negative delta, an undeclared family, a non-counter family
    /// or a label arity mismatch.
    pub fn inc_counter(&self, name: &str, labels: &[&str], delta: f64) -> MetricsResult<()> {
        let family = self.family(name)?;
        family.check_kind(MetricKind::Counter)?;
        family.check_labels(labels)?;
        if delta < 0.0 || delta.is_nan() {
            return Err(MetricsError::NegativeIncrement { family: name.to_string(), delta });
        }

        let vec = family.counter_vec().ok_or_else(|| kind_error(&family, MetricKind::Counter))?;
        vec.get_metric_with_label_values(labels)?.add(delta);
        family.remember(labels);
        Ok(())
    }

    /// Publish an info series; its payload lives entirely in the labels.
    ///
    /// # Errors
    /// Fails on an undeclared family, a non-info family or a label arity
    /// mismatch.
    pub fn set_info(&self, name: &str, labels: &[&str]) -> MetricsResult<()> {
        let family = self.family(name)?;
        family.check_kind(MetricKind::Info)?;
        family.check_labels(labels)?;

        let vec = family.gauge_vec().ok_or_else(|| kind_error(&family, MetricKind::Info))?;
        vec.get_metric_with_label_values(labels)?.set(1.0);
        family.remember(labels);
        Ok(())
    }

    /// Current value of a series, or `None` if it was never written.
    ///
    /// # Errors
    /// Fails on an undeclared family or a label arity mismatch.
    pub fn value(&self, name: &str, labels: &[&str]) -> MetricsResult<Option<f64>> {
        let family = self.family(name)?;
        family.check_labels(labels)?;

        if !family.knows(labels) {
            return Ok(None);
        }

        let value = match &family.vec {
            FamilyVec::Gauge(vec) => vec.get_metric_with_label_values(labels)?.get(),
            FamilyVec::Counter(vec) => vec.totals.get_metric_with_label_values(labels)?.get(),
        };
        Ok(Some(value))
    }

    /// Number of series written for a family.
    ///
    /// # Errors
    /// Fails on an undeclared family.
    pub fn series_count(&self, name: &str) -> MetricsResult<usize> {
        Ok(self.family(name)?.series.lock().len())
    }

    /// Whether a family with this name has been declared.
    pub fn is_declared(&self, name: &str) -> bool {
        self.families.read().contains_key(name)
    }

    /// Serialize every family in the Prometheus text exposition format.
    ///
    /// # Errors
    /// Fails if the encoder rejects the gathered families.
    pub fn render(&self) -> MetricsResult<String> {
        let encoder = TextEncoder::new();
        Ok(encoder.encode_to_string(&self.registry.gather())?)
    }

    fn family(&self, name: &str) -> MetricsResult<Arc<Family>> {
        self.families
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| MetricsError::UndeclaredFamily(name.to_string()))
    }
}

impl Default for MetricModel {
    fn default() -> Self {
        Self::new()
    }
}

fn series_key(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}

fn kind_error(family: &Family, expected: MetricKind) -> MetricsError {
    MetricsError::KindMismatch {
        family: family.spec.name.to_string(),
        expected,
        actual: family.spec.kind,
    }
}

fn validate_name(spec: &FamilySpec) -> MetricsResult<()> {
    let invalid = |reason| Err(MetricsError::InvalidName { name: spec.name.to_string(), reason });

    match spec.kind {
        MetricKind::Info if !spec.name.ends_with("_info") => {
            return invalid("info families must end with '_info'");
        }
        MetricKind::Counter if !spec.name.ends_with("_total") => {
            return invalid("counter families must end with '_total'");
        }
        _ => {}
    }

    if let Some(unit) = spec.unit {
        let stem = spec.name.strip_suffix("_total").unwrap_or(spec.name);
        if !stem.ends_with(&format!("_{unit}")) {
            return invalid("name must carry the declared unit as a suffix");
        }
    }

    Ok(())
}
