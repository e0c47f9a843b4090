//! # virtstat Domain
//!
//! Domain types shared by every virtstat crate.
//!
//! This crate contains:
//! - Host statistics and entity identity types
//! - The typed libvirt domain descriptor
//! - Domain error types and Result definitions
//! - Configuration structures
//!
//! ## Architecture
//! - No dependencies on other virtstat crates
//! - Only external dependencies allowed
//! - Pure data structures and conversions, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
pub use utils::units::{kib_to_bytes, nanos_to_seconds, sample};
