//! # virtstat Core
//!
//! The telemetry collection engine, with no host bindings or HTTP code.
//!
//! This crate contains:
//! - Port interfaces for the virtualization host
//! - The metric model and the catalog of published families
//! - Entity collectors for domains and storage pools
//! - The per-class collection scheduler
//!
//! ## Architecture Principles
//! - Only depends on `virtstat-domain`
//! - Host access exclusively through the traits in [`ports`]
//! - Every blocking host call runs on the runtime's blocking pool

pub mod collectors;
pub mod metrics;
pub mod offload;
pub mod ports;
pub mod scheduler;

pub use collectors::{
    publish_versions, CollectError, CollectResult, DomainCollector, EntityCollector, EntityError,
    StoragePoolCollector,
};
pub use metrics::{FamilySpec, MetricKind, MetricModel, MetricsError, MetricsResult};
pub use ports::{DomainHandle, HostClient, StoragePoolHandle};
pub use scheduler::{
    CollectionScheduler, CycleReport, ErrorScope, SchedulerConfig, SchedulerError,
    SchedulerResult,
};
