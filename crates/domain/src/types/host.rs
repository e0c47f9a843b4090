//! Statistics as reported by the virtualization host.
//!
//! Values keep libvirt's native units (KiB, nanoseconds). Conversion to
//! Prometheus base units happens when series are written.

use serde::{Deserialize, Serialize};

use crate::impl_str_conversions;

/// The two kinds of entities the exporter lists on every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityClass {
    Domain,
    StoragePool,
}

impl_str_conversions!(EntityClass {
    Domain => "domain",
    StoragePool => "storage_pool",
});

/// Result of `virDomainGetInfo`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DomainInfo {
    /// Lifecycle state code (`virDomainState`)
    pub state: u32,
    pub max_memory_kib: u64,
    pub memory_kib: u64,
    pub vcpus: u32,
    pub cpu_time_ns: u64,
}

/// Cumulative CPU accounting for the whole domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuStats {
    pub cpu_time_ns: u64,
    pub user_time_ns: u64,
    pub system_time_ns: u64,
}

/// Detailed memory statistics (`virDomainMemoryStats`).
///
/// Tags the guest does not report stay at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    pub swap_in_kib: u64,
    pub swap_out_kib: u64,
    pub major_faults: u64,
    pub minor_faults: u64,
    pub unused_kib: u64,
    pub available_kib: u64,
    pub actual_balloon_kib: u64,
    pub rss_kib: u64,
    pub usable_kib: u64,
    pub disk_caches_kib: u64,
    pub hugetlb_pgalloc: u64,
    pub hugetlb_pgfail: u64,
}

impl MemoryStats {
    pub const TAG_SWAP_IN: u32 = 0;
    pub const TAG_SWAP_OUT: u32 = 1;
    pub const TAG_MAJOR_FAULT: u32 = 2;
    pub const TAG_MINOR_FAULT: u32 = 3;
    pub const TAG_UNUSED: u32 = 4;
    pub const TAG_AVAILABLE: u32 = 5;
    pub const TAG_ACTUAL_BALLOON: u32 = 6;
    pub const TAG_RSS: u32 = 7;
    pub const TAG_USABLE: u32 = 8;
    pub const TAG_LAST_UPDATE: u32 = 9;
    pub const TAG_DISK_CACHES: u32 = 10;
    pub const TAG_HUGETLB_PGALLOC: u32 = 11;
    pub const TAG_HUGETLB_PGFAIL: u32 = 12;

    /// Build from libvirt's `(tag, value)` pairs. Unknown tags are ignored.
    pub fn from_tagged<I>(stats: I) -> Self
    where
        I: IntoIterator<Item = (u32, u64)>,
    {
        let mut out = Self::default();
        for (tag, value) in stats {
            match tag {
                Self::TAG_SWAP_IN => out.swap_in_kib = value,
                Self::TAG_SWAP_OUT => out.swap_out_kib = value,
                Self::TAG_MAJOR_FAULT => out.major_faults = value,
                Self::TAG_MINOR_FAULT => out.minor_faults = value,
                Self::TAG_UNUSED => out.unused_kib = value,
                Self::TAG_AVAILABLE => out.available_kib = value,
                Self::TAG_ACTUAL_BALLOON => out.actual_balloon_kib = value,
                Self::TAG_RSS => out.rss_kib = value,
                Self::TAG_USABLE => out.usable_kib = value,
                Self::TAG_DISK_CACHES => out.disk_caches_kib = value,
                Self::TAG_HUGETLB_PGALLOC => out.hugetlb_pgalloc = value,
                Self::TAG_HUGETLB_PGFAIL => out.hugetlb_pgfail = value,
                _ => {}
            }
        }
        out
    }
}

/// Per-interface traffic counters (`virDomainInterfaceStats`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterfaceStats {
    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub rx_errors: u64,
    pub rx_drops: u64,
    pub tx_bytes: u64,
    pub tx_packets: u64,
    pub tx_errors: u64,
    pub tx_drops: u64,
}

/// Extended block device counters (`virDomainBlockStatsFlags`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockStats {
    pub read_bytes: u64,
    pub read_operations: u64,
    pub read_time_ns: u64,
    pub write_bytes: u64,
    pub write_operations: u64,
    pub write_time_ns: u64,
    pub flush_operations: u64,
    pub flush_time_ns: u64,
}

/// Result of `virStoragePoolGetInfo`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolInfo {
    /// Pool state code (`virStoragePoolState`)
    pub state: u32,
    pub capacity_bytes: u64,
    pub allocation_bytes: u64,
    pub available_bytes: u64,
}

/// Encoded version numbers of the host's virtualization stack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostVersions {
    pub hypervisor: u64,
    pub libvirtd: u64,
    pub library: u64,
}
