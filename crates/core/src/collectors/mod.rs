//! Entity collectors
//!
//! A collector turns one entity handle into metric writes. The scheduler
//! drives one collector per entity class:
//!
//! - `domain`: metadata, ownership, CPU, memory, network and block groups
//! - `storage_pool`: pool info as a single unit
//! - `versions`: host version info, written once at startup

pub mod domain;
pub mod storage_pool;
pub mod versions;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use virtstat_domain::{DescriptorError, EntityClass, HostError};

pub use domain::DomainCollector;
pub use storage_pool::StoragePoolCollector;
pub use versions::publish_versions;

use crate::metrics::MetricsError;

/// Label used for an entity whose name could not be read.
pub const UNKNOWN_ENTITY: &str = "<unknown>";

/// Why a collection step failed.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

/// Result type for collection steps
pub type CollectResult<T> = Result<T, CollectError>;

/// A hard failure of one entity, tagged with the entity it belongs to.
#[derive(Debug, Error)]
#[error("{entity}: {source}")]
pub struct EntityError {
    pub entity: String,
    pub source: CollectError,
}

impl EntityError {
    pub fn new(entity: impl Into<String>, source: impl Into<CollectError>) -> Self {
        Self { entity: entity.into(), source: source.into() }
    }
}

/// Collects one class of host entities.
#[async_trait]
pub trait EntityCollector: Send + Sync + 'static {
    /// Per-cycle entity handle
    type Handle: ?Sized + Send + Sync + 'static;

    /// The entity class, used as the `class` label of self metrics.
    fn class(&self) -> EntityClass;

    /// Fresh listing of every entity of this class.
    async fn list(&self) -> CollectResult<Vec<Arc<Self::Handle>>>;

    /// Collect one entity and write its series.
    ///
    /// Returns an error only for hard failures; soft failures are absorbed
    /// inside the collector.
    async fn collect(&self, handle: Arc<Self::Handle>) -> Result<(), EntityError>;
}
