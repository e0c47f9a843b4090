//! Port interfaces for the virtualization host
//!
//! These traits define the boundary between the collection engine and the
//! host bindings. Every method is a synchronous, potentially slow round trip;
//! callers in async context go through [`crate::offload`] so the call runs on
//! the runtime's blocking pool.

use std::sync::Arc;

use virtstat_domain::{
    BlockStats, CpuStats, DomainInfo, HostResult, HostVersions, InterfaceStats, MemoryStats,
    PoolInfo,
};

/// Connection to a virtualization host
pub trait HostClient: Send + Sync {
    /// Every domain currently defined on the host, active or not.
    ///
    /// Handles are only meaningful for the cycle that listed them.
    fn list_domains(&self) -> HostResult<Vec<Arc<dyn DomainHandle>>>;

    /// Every storage pool currently defined on the host.
    fn list_storage_pools(&self) -> HostResult<Vec<Arc<dyn StoragePoolHandle>>>;

    /// Hypervisor, daemon and library versions.
    fn versions(&self) -> HostResult<HostVersions>;
}

/// One domain as seen during a single collection cycle
pub trait DomainHandle: Send + Sync {
    fn name(&self) -> HostResult<String>;

    fn uuid(&self) -> HostResult<String>;

    /// State, memory, vCPU count and cumulative CPU time in one call.
    fn info(&self) -> HostResult<DomainInfo>;

    fn is_active(&self) -> HostResult<bool>;

    /// The live XML descriptor.
    fn xml_desc(&self) -> HostResult<String>;

    /// Cumulative CPU time split by mode. Only valid while active.
    fn cpu_stats(&self) -> HostResult<CpuStats>;

    /// Balloon driver statistics. Only valid while active.
    fn memory_stats(&self) -> HostResult<MemoryStats>;

    /// Counters for the host-side interface device `dev`.
    fn interface_stats(&self, dev: &str) -> HostResult<InterfaceStats>;

    /// Counters for the guest disk `dev`. Only valid while active.
    fn block_stats(&self, dev: &str) -> HostResult<BlockStats>;
}

/// One storage pool as seen during a single collection cycle
pub trait StoragePoolHandle: Send + Sync {
    fn name(&self) -> HostResult<String>;

    fn uuid(&self) -> HostResult<String>;

    fn info(&self) -> HostResult<PoolInfo>;
}
