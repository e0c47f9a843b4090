//! Domain types
//!
//! - `host`: raw statistics returned by the virtualization host
//! - `identity`: stable label keys for domains and storage pools
//! - `descriptor`: typed view of a domain's XML descriptor

pub mod descriptor;
pub mod host;
pub mod identity;

pub use descriptor::{
    DescriptorError, Disk, DomainDescriptor, Interface, OwnershipMetadata,
};
pub use host::{
    BlockStats, CpuStats, DomainInfo, EntityClass, HostVersions, InterfaceStats, MemoryStats,
    PoolInfo,
};
pub use identity::{DomainIdentity, PoolIdentity};
