//! Shared test helpers for `virtstat-core` integration tests.
//!
//! Provides an in-memory virtualization host with per-call fault injection so
//! collection and scheduling tests can focus on behaviour instead of
//! boilerplate.

#![allow(dead_code)]

pub mod host;

use std::sync::Arc;

use virtstat_core::metrics::families::ALL;
use virtstat_core::MetricModel;

/// A model with the full family catalog declared.
pub fn declared_model() -> Arc<MetricModel> {
    let model = MetricModel::new();
    model.declare_all(ALL).expect("catalog declares cleanly");
    Arc::new(model)
}
