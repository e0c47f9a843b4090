//! libvirt host adapter
//!
//! Thin mapping from the `virt` bindings onto the host ports. Every method
//! is one blocking libvirt round trip; the collectors run them on the
//! blocking pool.
//!
//! The safe bindings expose the classic `virDomainGetInfo` and
//! `virDomainBlockStats` calls only, so CPU user/system time and the block
//! latency and flush counters are reported as zero.

use std::sync::Arc;

use virt::connect::Connect;
use virt::domain::Domain;
use virt::error::Error as VirtError;
use virt::storage_pool::StoragePool;
use virtstat_core::ports::{DomainHandle, HostClient, StoragePoolHandle};
use virtstat_domain::{
    BlockStats, CpuStats, DomainInfo, HostError, HostResult, HostVersions, InterfaceStats,
    MemoryStats, PoolInfo,
};

/// `virConnectListAllDomains` / `virConnectListAllStoragePools` flags: all
/// entities, active or not.
const LIST_ALL: u32 = 0;

/// Live connection to a libvirt daemon.
pub struct LibvirtHost {
    conn: Connect,
}

impl LibvirtHost {
    /// Open the connection named by `uri`.
    ///
    /// # Errors
    /// Returns `HostError::Connection` if libvirt refuses the connection.
    pub fn connect(uri: &str) -> HostResult<Self> {
        let conn = Connect::open(Some(uri))
            .map_err(|e| HostError::Connection(format!("{uri}: {e}")))?;
        tracing::info!(uri, "Opened libvirt connection");
        Ok(Self { conn })
    }
}

impl HostClient for LibvirtHost {
    fn list_domains(&self) -> HostResult<Vec<Arc<dyn DomainHandle>>> {
        let domains =
            self.conn.list_all_domains(LIST_ALL).map_err(failed("virConnectListAllDomains"))?;
        Ok(domains
            .into_iter()
            .map(|domain| Arc::new(LibvirtDomain(domain)) as Arc<dyn DomainHandle>)
            .collect())
    }

    fn list_storage_pools(&self) -> HostResult<Vec<Arc<dyn StoragePoolHandle>>> {
        let pools = self
            .conn
            .list_all_storage_pools(LIST_ALL)
            .map_err(failed("virConnectListAllStoragePools"))?;
        Ok(pools
            .into_iter()
            .map(|pool| Arc::new(LibvirtPool(pool)) as Arc<dyn StoragePoolHandle>)
            .collect())
    }

    fn versions(&self) -> HostResult<HostVersions> {
        let hypervisor = self.conn.get_hyp_version().map_err(failed("virConnectGetVersion"))?;
        let libvirtd = self.conn.get_lib_version().map_err(failed("virConnectGetLibVersion"))?;
        let library = Connect::get_version().map_err(failed("virGetVersion"))?;

        Ok(HostVersions {
            hypervisor: u64::from(hypervisor),
            libvirtd: u64::from(libvirtd),
            library: u64::from(library),
        })
    }
}

struct LibvirtDomain(Domain);

impl DomainHandle for LibvirtDomain {
    fn name(&self) -> HostResult<String> {
        self.0.get_name().map_err(failed("virDomainGetName"))
    }

    fn uuid(&self) -> HostResult<String> {
        self.0.get_uuid_string().map_err(failed("virDomainGetUUIDString"))
    }

    fn info(&self) -> HostResult<DomainInfo> {
        let info = self.0.get_info().map_err(failed("virDomainGetInfo"))?;
        #[allow(clippy::unnecessary_cast)]
        let state = info.state as u32;
        Ok(DomainInfo {
            state,
            max_memory_kib: info.max_mem,
            memory_kib: info.memory,
            vcpus: info.nr_virt_cpu,
            cpu_time_ns: info.cpu_time,
        })
    }

    fn is_active(&self) -> HostResult<bool> {
        self.0.is_active().map_err(failed("virDomainIsActive"))
    }

    fn xml_desc(&self) -> HostResult<String> {
        self.0.get_xml_desc(0).map_err(failed("virDomainGetXMLDesc"))
    }

    fn cpu_stats(&self) -> HostResult<CpuStats> {
        let info = self.0.get_info().map_err(failed("virDomainGetInfo"))?;
        Ok(CpuStats { cpu_time_ns: info.cpu_time, ..CpuStats::default() })
    }

    fn memory_stats(&self) -> HostResult<MemoryStats> {
        let stats = self.0.memory_stats(0).map_err(failed("virDomainMemoryStats"))?;
        Ok(MemoryStats::from_tagged(stats.into_iter().map(|stat| (stat.tag, stat.val))))
    }

    fn interface_stats(&self, dev: &str) -> HostResult<InterfaceStats> {
        let stats = self.0.interface_stats(dev).map_err(failed("virDomainInterfaceStats"))?;
        Ok(InterfaceStats {
            rx_bytes: counter(stats.rx_bytes),
            rx_packets: counter(stats.rx_packets),
            rx_errors: counter(stats.rx_errs),
            rx_drops: counter(stats.rx_drop),
            tx_bytes: counter(stats.tx_bytes),
            tx_packets: counter(stats.tx_packets),
            tx_errors: counter(stats.tx_errs),
            tx_drops: counter(stats.tx_drop),
        })
    }

    fn block_stats(&self, dev: &str) -> HostResult<BlockStats> {
        let stats = self.0.block_stats(dev).map_err(failed("virDomainBlockStats"))?;
        Ok(BlockStats {
            read_bytes: counter(stats.rd_bytes),
            read_operations: counter(stats.rd_req),
            write_bytes: counter(stats.wr_bytes),
            write_operations: counter(stats.wr_req),
            ..BlockStats::default()
        })
    }
}

struct LibvirtPool(StoragePool);

impl StoragePoolHandle for LibvirtPool {
    fn name(&self) -> HostResult<String> {
        self.0.get_name().map_err(failed("virStoragePoolGetName"))
    }

    fn uuid(&self) -> HostResult<String> {
        self.0.get_uuid_string().map_err(failed("virStoragePoolGetUUIDString"))
    }

    fn info(&self) -> HostResult<PoolInfo> {
        let info = self.0.get_info().map_err(failed("virStoragePoolGetInfo"))?;
        #[allow(clippy::unnecessary_cast)]
        let state = info.state as u32;
        Ok(PoolInfo {
            state,
            capacity_bytes: info.capacity,
            allocation_bytes: info.allocation,
            available_bytes: info.available,
        })
    }
}

fn failed(operation: &'static str) -> impl Fn(VirtError) -> HostError {
    move |err| HostError::call(operation, err.to_string())
}

/// libvirt reports unsupported counters as -1.
fn counter(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
