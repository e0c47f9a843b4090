//! Collection scheduling
//!
//! One [`CollectionScheduler`] per entity class drives its collector in a
//! loop for the lifetime of the process:
//! - `collection_scheduler`: lifecycle, fan-out and the cycle loop
//! - `backoff`: delay schedule after failed listings
//! - `report`: cycle outcomes and the exporter's own metrics
//! - `error`: lifecycle errors

pub mod backoff;
pub mod collection_scheduler;
pub mod error;
pub mod report;

pub use backoff::ListingBackoff;
pub use collection_scheduler::{CollectionScheduler, SchedulerConfig};
pub use error::{SchedulerError, SchedulerResult};
pub use report::{CycleReport, ErrorScope};
