//! # virtstat Infrastructure
//!
//! Infrastructure implementations of core ports and the process plumbing.
//!
//! This crate contains:
//! - Configuration loading (files and environment)
//! - Logging setup
//! - The libvirt host adapter (`libvirt` feature)
//! - HTTP exposition of the metric model
//! - Keystone token validation for scrapes
//!
//! ## Architecture
//! - Implements traits defined in `virtstat-core`
//! - Contains all "impure" code (I/O, host bindings, network)
//!
//! ## Known gaps
//! The `virt` bindings only wrap `virDomainGetInfo` and
//! `virDomainBlockStats`. With the `libvirt` feature, CPU user and system
//! time, block read/write/flush times and block flush operations are
//! therefore exported as 0. Reaching them needs `virConnectGetAllDomainStats`,
//! which the safe bindings do not offer.

pub mod config;
pub mod errors;
pub mod host;
pub mod http;
pub mod keystone;
pub mod observability;

// Re-export commonly used items
pub use errors::InfraError;
pub use keystone::{AuthError, KeystoneValidator, TokenValidator};
pub use observability::init_logging;
