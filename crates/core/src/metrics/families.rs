//! Catalog of published metric families
//!
//! Collectors address families through these constants; [`ALL`] is what the
//! binary declares at startup.

use super::FamilySpec;

const DOMAIN: &[&str] = &["domain"];
const DOMAIN_MAC: &[&str] = &["domain", "dev_mac"];
const DOMAIN_DISK: &[&str] = &["domain", "target_dev"];
const POOL: &[&str] = &["pool_name"];

// Host

pub const VERSIONS_INFO: FamilySpec = FamilySpec::info(
    "libvirt_versions_info",
    "Libvirt version information",
    &["hypervisor", "libvirtd", "libvirt_lib"],
);

// Storage pools

pub const POOL_METADATA_INFO: FamilySpec = FamilySpec::info(
    "libvirt_storage_pool_metadata_info",
    "Libvirt storage pool information",
    &["pool_name", "pool_uuid"],
);
pub const POOL_STATE: FamilySpec =
    FamilySpec::gauge("libvirt_storage_pool_state", "Storage pool state information", POOL);
pub const POOL_CAPACITY: FamilySpec = FamilySpec::gauge(
    "libvirt_storage_pool_capacity_bytes",
    "Pool capacity, in bytes",
    POOL,
)
.with_unit("bytes");
pub const POOL_ALLOCATION: FamilySpec = FamilySpec::gauge(
    "libvirt_storage_pool_allocation_bytes",
    "Pool allocation, in bytes",
    POOL,
)
.with_unit("bytes");
pub const POOL_AVAILABLE: FamilySpec = FamilySpec::gauge(
    "libvirt_storage_pool_available_bytes",
    "Pool available space, in bytes",
    POOL,
)
.with_unit("bytes");

// Domain metadata and info tuple

pub const DOMAIN_METADATA_INFO: FamilySpec =
    FamilySpec::info("libvirt_domain_metadata_info", "Domain metadata", &["domain", "uuid"]);
pub const DOMAIN_NOVA_METADATA_INFO: FamilySpec = FamilySpec::info(
    "libvirt_domain_nova_metadata_info",
    "Openstack Nova metadata",
    &[
        "domain",
        "uuid",
        "instance_name",
        "flavor",
        "user_name",
        "user_uuid",
        "project_name",
        "project_uuid",
    ],
);
pub const DOMAIN_STATE: FamilySpec = FamilySpec::gauge(
    "libvirt_domain_state",
    "Virtual domain state. 0: no state, 1: running, 2: blocked on resource, 3: paused by \
     user, 4: being shut down, 5: shut off, 6: crashed, 7: suspended by guest power \
     management",
    DOMAIN,
);
pub const DOMAIN_VCPUS: FamilySpec = FamilySpec::gauge(
    "libvirt_domain_info_vcpus",
    "Number of virtual CPUs on the domain.",
    DOMAIN,
);
pub const DOMAIN_MAX_MEMORY: FamilySpec = FamilySpec::gauge(
    "libvirt_domain_info_max_memory_bytes",
    "Maximum allowed memory of the domain, in bytes.",
    DOMAIN,
)
.with_unit("bytes");
pub const DOMAIN_MEMORY_USAGE: FamilySpec = FamilySpec::gauge(
    "libvirt_domain_info_memory_usage_bytes",
    "Memory usage of the domain, in bytes.",
    DOMAIN,
)
.with_unit("bytes");
pub const DOMAIN_CPU_TIME: FamilySpec = FamilySpec::counter(
    "libvirt_domain_info_cpu_time_seconds_total",
    "Amount of CPU time used by the domain, in seconds.",
    DOMAIN,
)
.with_unit("seconds");
pub const DOMAIN_CPU_USER_TIME: FamilySpec = FamilySpec::counter(
    "libvirt_domain_info_cpu_time_user_seconds_total",
    "Amount of CPU time used by the domain by the user, in seconds.",
    DOMAIN,
)
.with_unit("seconds");
pub const DOMAIN_CPU_SYSTEM_TIME: FamilySpec = FamilySpec::counter(
    "libvirt_domain_info_cpu_time_system_seconds_total",
    "Amount of CPU time used by the domain by the system, in seconds.",
    DOMAIN,
)
.with_unit("seconds");

// Domain memory statistics

pub const MEM_ACTUAL_BALLOON: FamilySpec = FamilySpec::gauge(
    "libvirt_domain_mem_stat_actual_balloon_bytes",
    "Actual balloon size, in bytes.",
    DOMAIN,
)
.with_unit("bytes");
pub const MEM_SWAP_IN: FamilySpec = FamilySpec::counter(
    "libvirt_domain_mem_stat_swap_in_bytes_total",
    "The amount of data read from swap space, in bytes.",
    DOMAIN,
)
.with_unit("bytes");
pub const MEM_SWAP_OUT: FamilySpec = FamilySpec::counter(
    "libvirt_domain_mem_stat_swap_out_bytes_total",
    "The amount of memory written out to swap space, in bytes.",
    DOMAIN,
)
.with_unit("bytes");
pub const MEM_MAJOR_FAULTS: FamilySpec = FamilySpec::counter(
    "libvirt_domain_mem_stat_major_faults_total",
    "The number of page faults where disk IO was required.",
    DOMAIN,
);
pub const MEM_MINOR_FAULTS: FamilySpec = FamilySpec::counter(
    "libvirt_domain_mem_stat_minor_faults_total",
    "The number of other page faults.",
    DOMAIN,
);
pub const MEM_UNUSED: FamilySpec = FamilySpec::gauge(
    "libvirt_domain_mem_stat_unused_bytes",
    "The amount of memory left unused by the system, in bytes.",
    DOMAIN,
)
.with_unit("bytes");
pub const MEM_AVAILABLE: FamilySpec = FamilySpec::gauge(
    "libvirt_domain_mem_stat_available_bytes",
    "The amount of usable memory as seen by the domain, in bytes.",
    DOMAIN,
)
.with_unit("bytes");
pub const MEM_USABLE: FamilySpec = FamilySpec::gauge(
    "libvirt_domain_mem_stat_usable_bytes",
    "The amount of memory which can be reclaimed by balloon without causing host swapping, \
     in bytes.",
    DOMAIN,
)
.with_unit("bytes");
pub const MEM_DISK_CACHES: FamilySpec = FamilySpec::gauge(
    "libvirt_domain_mem_stat_disk_caches_bytes",
    "The amount of memory that can be reclaimed without additional I/O, typically disk \
     caches, in bytes.",
    DOMAIN,
)
.with_unit("bytes");
pub const MEM_HUGETLB_PGALLOC: FamilySpec = FamilySpec::counter(
    "libvirt_domain_mem_stat_hugetlb_pgalloc_total",
    "The number of successful huge page allocations initiated from within the domain.",
    DOMAIN,
);
pub const MEM_HUGETLB_PGFAIL: FamilySpec = FamilySpec::counter(
    "libvirt_domain_mem_stat_hugetlb_pgfail_total",
    "The number of failed huge page allocations initiated from within the domain.",
    DOMAIN,
);
pub const MEM_RSS: FamilySpec = FamilySpec::gauge(
    "libvirt_domain_mem_stat_rss_bytes",
    "Resident Set Size of the running domain's process, in bytes.",
    DOMAIN,
)
.with_unit("bytes");

// Domain network interfaces

pub const IFACE_RX_BYTES: FamilySpec = FamilySpec::counter(
    "libvirt_domain_interface_receive_bytes_total",
    "Number of bytes received on a network interface, in bytes.",
    DOMAIN_MAC,
)
.with_unit("bytes");
pub const IFACE_RX_PACKETS: FamilySpec = FamilySpec::counter(
    "libvirt_domain_interface_receive_packets_total",
    "Number of packets received on a network interface.",
    DOMAIN_MAC,
);
pub const IFACE_RX_ERRORS: FamilySpec = FamilySpec::counter(
    "libvirt_domain_interface_receive_errors_total",
    "Number of packet receive errors on a network interface.",
    DOMAIN_MAC,
);
pub const IFACE_RX_DROPS: FamilySpec = FamilySpec::counter(
    "libvirt_domain_interface_receive_drops_total",
    "Number of packet receive drops on a network interface.",
    DOMAIN_MAC,
);
pub const IFACE_TX_BYTES: FamilySpec = FamilySpec::counter(
    "libvirt_domain_interface_transmit_bytes_total",
    "Number of bytes transmitted on a network interface, in bytes.",
    DOMAIN_MAC,
)
.with_unit("bytes");
pub const IFACE_TX_PACKETS: FamilySpec = FamilySpec::counter(
    "libvirt_domain_interface_transmit_packets_total",
    "Number of packets transmitted on a network interface.",
    DOMAIN_MAC,
);
pub const IFACE_TX_ERRORS: FamilySpec = FamilySpec::counter(
    "libvirt_domain_interface_transmit_errors_total",
    "Number of packet transmit errors on a network interface.",
    DOMAIN_MAC,
);
pub const IFACE_TX_DROPS: FamilySpec = FamilySpec::counter(
    "libvirt_domain_interface_transmit_drops_total",
    "Number of packet transmit drops on a network interface.",
    DOMAIN_MAC,
);

// Domain block devices

pub const BLOCK_METADATA_INFO: FamilySpec = FamilySpec::info(
    "libvirt_domain_block_dev_metadata_info",
    "Block device metadata info. Device type, target, source file and driver.",
    &[
        "domain",
        "disk_type",
        "target_dev",
        "target_bus",
        "source_file",
        "driver_name",
        "driver_type",
        "driver_discard",
    ],
);
pub const BLOCK_READ_BYTES: FamilySpec = FamilySpec::counter(
    "libvirt_domain_block_dev_read_bytes_total",
    "Number of bytes read from a block device.",
    DOMAIN_DISK,
)
.with_unit("bytes");
pub const BLOCK_READ_OPS: FamilySpec = FamilySpec::counter(
    "libvirt_domain_block_dev_read_operations_total",
    "Number of read operations from a block device.",
    DOMAIN_DISK,
);
pub const BLOCK_READ_TIME: FamilySpec = FamilySpec::counter(
    "libvirt_domain_block_dev_read_seconds_total",
    "Total duration of reads from a block device, in seconds.",
    DOMAIN_DISK,
)
.with_unit("seconds");
pub const BLOCK_WRITE_BYTES: FamilySpec = FamilySpec::counter(
    "libvirt_domain_block_dev_write_bytes_total",
    "Number of bytes written to a block device.",
    DOMAIN_DISK,
)
.with_unit("bytes");
pub const BLOCK_WRITE_OPS: FamilySpec = FamilySpec::counter(
    "libvirt_domain_block_dev_write_operations_total",
    "Number of write operations to a block device.",
    DOMAIN_DISK,
);
pub const BLOCK_WRITE_TIME: FamilySpec = FamilySpec::counter(
    "libvirt_domain_block_dev_write_seconds_total",
    "Total duration of writes to a block device, in seconds.",
    DOMAIN_DISK,
)
.with_unit("seconds");
pub const BLOCK_FLUSH_OPS: FamilySpec = FamilySpec::counter(
    "libvirt_domain_block_dev_flush_operations_total",
    "Number of flush operations from a block device.",
    DOMAIN_DISK,
);
pub const BLOCK_FLUSH_TIME: FamilySpec = FamilySpec::counter(
    "libvirt_domain_block_dev_flush_seconds_total",
    "Total duration of flushes to a block device, in seconds.",
    DOMAIN_DISK,
)
.with_unit("seconds");

// Exporter self-observation

pub const COLLECTION_CYCLES: FamilySpec = FamilySpec::counter(
    "virtstat_collection_cycles_total",
    "Completed collection cycles per entity class.",
    &["class"],
);
pub const COLLECTION_ERRORS: FamilySpec = FamilySpec::counter(
    "virtstat_collection_errors_total",
    "Collection failures per entity class and scope (listing, entity, timeout, group).",
    &["class", "scope"],
);
pub const COLLECTION_DURATION: FamilySpec = FamilySpec::gauge(
    "virtstat_collection_duration_seconds",
    "Wall time of the last completed collection cycle, in seconds.",
    &["class"],
)
.with_unit("seconds");
pub const COLLECTION_ENTITIES: FamilySpec = FamilySpec::gauge(
    "virtstat_collection_entities",
    "Entities listed by the last collection cycle.",
    &["class"],
);

/// Every family the exporter publishes.
pub const ALL: &[FamilySpec] = &[
    VERSIONS_INFO,
    POOL_METADATA_INFO,
    POOL_STATE,
    POOL_CAPACITY,
    POOL_ALLOCATION,
    POOL_AVAILABLE,
    DOMAIN_METADATA_INFO,
    DOMAIN_NOVA_METADATA_INFO,
    DOMAIN_STATE,
    DOMAIN_VCPUS,
    DOMAIN_MAX_MEMORY,
    DOMAIN_MEMORY_USAGE,
    DOMAIN_CPU_TIME,
    DOMAIN_CPU_USER_TIME,
    DOMAIN_CPU_SYSTEM_TIME,
    MEM_ACTUAL_BALLOON,
    MEM_SWAP_IN,
    MEM_SWAP_OUT,
    MEM_MAJOR_FAULTS,
    MEM_MINOR_FAULTS,
    MEM_UNUSED,
    MEM_AVAILABLE,
    MEM_USABLE,
    MEM_DISK_CACHES,
    MEM_HUGETLB_PGALLOC,
    MEM_HUGETLB_PGFAIL,
    MEM_RSS,
    IFACE_RX_BYTES,
    IFACE_RX_PACKETS,
    IFACE_RX_ERRORS,
    IFACE_RX_DROPS,
    IFACE_TX_BYTES,
    IFACE_TX_PACKETS,
    IFACE_TX_ERRORS,
    IFACE_TX_DROPS,
    BLOCK_METADATA_INFO,
    BLOCK_READ_BYTES,
    BLOCK_READ_OPS,
    BLOCK_READ_TIME,
    BLOCK_WRITE_BYTES,
    BLOCK_WRITE_OPS,
    BLOCK_WRITE_TIME,
    BLOCK_FLUSH_OPS,
    BLOCK_FLUSH_TIME,
    COLLECTION_CYCLES,
    COLLECTION_ERRORS,
    COLLECTION_DURATION,
    COLLECTION_ENTITIES,
];
