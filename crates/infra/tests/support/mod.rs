//! Shared helpers for `virtstat-infra` integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use virtstat_core::metrics::families::{ALL, DOMAIN_STATE};
use virtstat_core::MetricModel;
use virtstat_infra::{AuthError, TokenValidator};

/// A model with the catalog declared and one domain state series set.
pub fn populated_model() -> Arc<MetricModel> {
    let model = MetricModel::new();
    model.declare_all(ALL).expect("catalog declares cleanly");
    model.set_gauge(DOMAIN_STATE.name, &["vm1"], 1.0).expect("state series");
    Arc::new(model)
}

/// Validator answering from a fixed table; unknown tokens are invalid.
#[derive(Default)]
pub struct StaticValidator {
    answers: HashMap<String, Result<(), AuthError>>,
    calls: AtomicUsize,
}

impl StaticValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accepting(mut self, token: &str) -> Self {
        self.answers.insert(token.to_string(), Ok(()));
        self
    }

    pub fn unavailable_for(mut self, token: &str) -> Self {
        self.answers.insert(token.to_string(), Err(AuthError::Unavailable("keystone down".into())));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenValidator for StaticValidator {
    async fn validate(&self, token: &str) -> Result<(), AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answers.get(token).cloned().unwrap_or(Err(AuthError::InvalidToken))
    }
}
