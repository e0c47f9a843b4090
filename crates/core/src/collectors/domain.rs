//! Domain collector
//!
//! Collection of one domain runs in three steps:
//!
//! 1. Metadata: name, UUID, info tuple and active flag. Any failure here is
//!    a hard failure of the entity.
//! 2. Ownership: the XML descriptor is fetched and parsed; Nova ownership
//!    metadata is published when present. A fetch or parse failure is hard.
//! 3. Four metric groups (CPU, memory, network, block) run concurrently. A
//!    failing group is logged at `debug` and counted, and never fails the
//!    entity.
//!
//! Extended statistics that legitimately fail on some guests (balloon
//! statistics, per-disk block statistics) default to zero instead of failing
//! their group.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use virtstat_domain::{
    kib_to_bytes, nanos_to_seconds, sample, BlockStats, CpuStats, DomainDescriptor, DomainIdentity,
    DomainInfo, EntityClass, HostResult, MemoryStats,
};

use super::{CollectResult, EntityCollector, EntityError, UNKNOWN_ENTITY};
use crate::metrics::families::{
    BLOCK_FLUSH_OPS, BLOCK_FLUSH_TIME, BLOCK_METADATA_INFO, BLOCK_READ_BYTES, BLOCK_READ_OPS,
    BLOCK_READ_TIME, BLOCK_WRITE_BYTES, BLOCK_WRITE_OPS, BLOCK_WRITE_TIME, DOMAIN_CPU_SYSTEM_TIME,
    DOMAIN_CPU_TIME, DOMAIN_CPU_USER_TIME, DOMAIN_MAX_MEMORY, DOMAIN_MEMORY_USAGE,
    DOMAIN_METADATA_INFO, DOMAIN_NOVA_METADATA_INFO, DOMAIN_STATE, DOMAIN_VCPUS, IFACE_RX_BYTES,
    IFACE_RX_DROPS, IFACE_RX_ERRORS, IFACE_RX_PACKETS, IFACE_TX_BYTES, IFACE_TX_DROPS,
    IFACE_TX_ERRORS, IFACE_TX_PACKETS, MEM_ACTUAL_BALLOON, MEM_AVAILABLE, MEM_DISK_CACHES,
    MEM_HUGETLB_PGALLOC, MEM_HUGETLB_PGFAIL, MEM_MAJOR_FAULTS, MEM_MINOR_FAULTS, MEM_RSS,
    MEM_SWAP_IN, MEM_SWAP_OUT, MEM_UNUSED, MEM_USABLE,
};
use crate::metrics::MetricModel;
use crate::offload::offload;
use crate::ports::{DomainHandle, HostClient};
use crate::scheduler::report::{record_error, ErrorScope};

/// Everything the metric groups share about one domain.
struct DomainSnapshot {
    handle: Arc<dyn DomainHandle>,
    identity: DomainIdentity,
    info: DomainInfo,
    active: bool,
    descriptor: DomainDescriptor,
}

/// Collects every domain defined on the host.
pub struct DomainCollector {
    host: Arc<dyn HostClient>,
    model: Arc<MetricModel>,
}

impl DomainCollector {
    pub fn new(host: Arc<dyn HostClient>, model: Arc<MetricModel>) -> Self {
        Self { host, model }
    }

    /// Metadata step: identity, state and vCPU count.
    async fn read_metadata(
        &self,
        handle: &Arc<dyn DomainHandle>,
        name: String,
    ) -> CollectResult<(DomainIdentity, DomainInfo, bool)> {
        let (uuid, info, active) = domain_call(handle, |domain| {
            Ok((domain.uuid()?, domain.info()?, domain.is_active()?))
        })
        .await?;

        let identity = DomainIdentity { name, uuid };
        self.model.set_info(DOMAIN_METADATA_INFO.name, &[&identity.name, &identity.uuid])?;
        self.model.set_gauge(DOMAIN_STATE.name, &[&identity.name], f64::from(info.state))?;
        self.model.set_gauge(DOMAIN_VCPUS.name, &[&identity.name], f64::from(info.vcpus))?;

        Ok((identity, info, active))
    }

    /// Ownership step: parse the descriptor and publish Nova metadata.
    async fn read_descriptor(
        &self,
        handle: &Arc<dyn DomainHandle>,
        identity: &DomainIdentity,
    ) -> CollectResult<DomainDescriptor> {
        let xml = domain_call(handle, |domain| domain.xml_desc()).await?;
        let descriptor = DomainDescriptor::parse(&xml)?;

        if let Some(ownership) = descriptor.ownership() {
            self.model.set_info(
                DOMAIN_NOVA_METADATA_INFO.name,
                &[
                    &identity.name,
                    &identity.uuid,
                    &ownership.instance_name,
                    &ownership.flavor,
                    &ownership.user_name,
                    &ownership.user_uuid,
                    &ownership.project_name,
                    &ownership.project_uuid,
                ],
            )?;
        }

        Ok(descriptor)
    }

    async fn collect_cpu(&self, domain: &DomainSnapshot) -> CollectResult<()> {
        let stats = if domain.active {
            domain_call(&domain.handle, |handle| handle.cpu_stats()).await?
        } else {
            CpuStats::default()
        };

        let labels = [domain.identity.name.as_str()];
        self.model.set_counter(DOMAIN_CPU_TIME.name, &labels, nanos_to_seconds(stats.cpu_time_ns))?;
        self.model.set_counter(
            DOMAIN_CPU_USER_TIME.name,
            &labels,
            nanos_to_seconds(stats.user_time_ns),
        )?;
        self.model.set_counter(
            DOMAIN_CPU_SYSTEM_TIME.name,
            &labels,
            nanos_to_seconds(stats.system_time_ns),
        )?;
        Ok(())
    }

    async fn collect_memory(&self, domain: &DomainSnapshot) -> CollectResult<()> {
        let stats = if domain.active {
            match domain_call(&domain.handle, |handle| handle.memory_stats()).await {
                Ok(stats) => stats,
                Err(err) => {
                    debug!(domain = %domain.identity, error = %err, "Memory statistics unavailable");
                    MemoryStats::default()
                }
            }
        } else {
            MemoryStats::default()
        };

        let model = &self.model;
        let labels = [domain.identity.name.as_str()];
        let bytes = |kib| sample(kib_to_bytes(kib));

        model.set_gauge(DOMAIN_MAX_MEMORY.name, &labels, bytes(domain.info.max_memory_kib))?;
        model.set_gauge(DOMAIN_MEMORY_USAGE.name, &labels, bytes(domain.info.memory_kib))?;

        model.set_gauge(MEM_ACTUAL_BALLOON.name, &labels, bytes(stats.actual_balloon_kib))?;
        model.set_counter(MEM_SWAP_IN.name, &labels, bytes(stats.swap_in_kib))?;
        model.set_counter(MEM_SWAP_OUT.name, &labels, bytes(stats.swap_out_kib))?;
        model.set_counter(MEM_MAJOR_FAULTS.name, &labels, sample(stats.major_faults))?;
        model.set_counter(MEM_MINOR_FAULTS.name, &labels, sample(stats.minor_faults))?;
        model.set_gauge(MEM_UNUSED.name, &labels, bytes(stats.unused_kib))?;
        model.set_gauge(MEM_AVAILABLE.name, &labels, bytes(stats.available_kib))?;
        model.set_gauge(MEM_USABLE.name, &labels, bytes(stats.usable_kib))?;
        model.set_gauge(MEM_DISK_CACHES.name, &labels, bytes(stats.disk_caches_kib))?;
        model.set_counter(MEM_HUGETLB_PGALLOC.name, &labels, sample(stats.hugetlb_pgalloc))?;
        model.set_counter(MEM_HUGETLB_PGFAIL.name, &labels, sample(stats.hugetlb_pgfail))?;
        model.set_gauge(MEM_RSS.name, &labels, bytes(stats.rss_kib))?;
        Ok(())
    }

    async fn collect_network(&self, domain: &DomainSnapshot) -> CollectResult<()> {
        for interface in domain.descriptor.interfaces() {
            // Interfaces of inactive domains have no host-side device yet.
            let Some(dev) = interface.target_dev() else {
                continue;
            };

            let dev = dev.to_string();
            let stats = domain_call(&domain.handle, move |handle| handle.interface_stats(&dev)).await?;

            let labels = [domain.identity.name.as_str(), interface.mac_address()];
            self.model.set_counter(IFACE_RX_BYTES.name, &labels, sample(stats.rx_bytes))?;
            self.model.set_counter(IFACE_RX_PACKETS.name, &labels, sample(stats.rx_packets))?;
            self.model.set_counter(IFACE_RX_ERRORS.name, &labels, sample(stats.rx_errors))?;
            self.model.set_counter(IFACE_RX_DROPS.name, &labels, sample(stats.rx_drops))?;
            self.model.set_counter(IFACE_TX_BYTES.name, &labels, sample(stats.tx_bytes))?;
            self.model.set_counter(IFACE_TX_PACKETS.name, &labels, sample(stats.tx_packets))?;
            self.model.set_counter(IFACE_TX_ERRORS.name, &labels, sample(stats.tx_errors))?;
            self.model.set_counter(IFACE_TX_DROPS.name, &labels, sample(stats.tx_drops))?;
        }
        Ok(())
    }

    async fn collect_block(&self, domain: &DomainSnapshot) -> CollectResult<()> {
        let name = domain.identity.name.as_str();

        for disk in domain.descriptor.disks() {
            let target_dev = disk.target_dev().unwrap_or_default();
            self.model.set_info(
                BLOCK_METADATA_INFO.name,
                &[
                    name,
                    disk.disk_type(),
                    target_dev,
                    disk.target_bus(),
                    disk.source_file(),
                    disk.driver_name(),
                    disk.driver_type(),
                    disk.driver_discard(),
                ],
            )?;

            if target_dev.is_empty() {
                continue;
            }

            let stats = if domain.active {
                let dev = target_dev.to_string();
                match domain_call(&domain.handle, move |handle| handle.block_stats(&dev)).await {
                    Ok(stats) => stats,
                    Err(err) => {
                        debug!(
                            domain = %domain.identity,
                            target_dev,
                            error = %err,
                            "Block statistics unavailable"
                        );
                        BlockStats::default()
                    }
                }
            } else {
                BlockStats::default()
            };

            let labels = [name, target_dev];
            let model = &self.model;
            model.set_counter(BLOCK_READ_BYTES.name, &labels, sample(stats.read_bytes))?;
            model.set_counter(BLOCK_READ_OPS.name, &labels, sample(stats.read_operations))?;
            model.set_counter(BLOCK_READ_TIME.name, &labels, nanos_to_seconds(stats.read_time_ns))?;
            model.set_counter(BLOCK_WRITE_BYTES.name, &labels, sample(stats.write_bytes))?;
            model.set_counter(BLOCK_WRITE_OPS.name, &labels, sample(stats.write_operations))?;
            model.set_counter(BLOCK_WRITE_TIME.name, &labels, nanos_to_seconds(stats.write_time_ns))?;
            model.set_counter(BLOCK_FLUSH_OPS.name, &labels, sample(stats.flush_operations))?;
            model.set_counter(BLOCK_FLUSH_TIME.name, &labels, nanos_to_seconds(stats.flush_time_ns))?;
        }
        Ok(())
    }

    fn settle_group(&self, domain: &DomainSnapshot, group: &'static str, result: CollectResult<()>) {
        if let Err(err) = result {
            debug!(domain = %domain.identity, group, error = %err, "Metric group failed");
            record_error(&self.model, EntityClass::Domain, ErrorScope::Group);
        }
    }
}

#[async_trait]
impl EntityCollector for DomainCollector {
    type Handle = dyn DomainHandle;

    fn class(&self) -> EntityClass {
        EntityClass::Domain
    }

    async fn list(&self) -> CollectResult<Vec<Arc<dyn DomainHandle>>> {
        let host = Arc::clone(&self.host);
        Ok(offload(move || host.list_domains()).await?)
    }

    async fn collect(&self, handle: Arc<dyn DomainHandle>) -> Result<(), EntityError> {
        let name = domain_call(&handle, |domain| domain.name())
            .await
            .map_err(|err| EntityError::new(UNKNOWN_ENTITY, err))?;

        let (identity, info, active) = self
            .read_metadata(&handle, name.clone())
            .await
            .map_err(|err| EntityError::new(&name, err))?;
        let descriptor = self
            .read_descriptor(&handle, &identity)
            .await
            .map_err(|err| EntityError::new(&name, err))?;

        let domain = DomainSnapshot { handle, identity, info, active, descriptor };

        let (cpu, memory, network, block) = futures::join!(
            self.collect_cpu(&domain),
            self.collect_memory(&domain),
            self.collect_network(&domain),
            self.collect_block(&domain),
        );
        self.settle_group(&domain, "cpu", cpu);
        self.settle_group(&domain, "memory", memory);
        self.settle_group(&domain, "network", network);
        self.settle_group(&domain, "block", block);

        Ok(())
    }
}

/// Run a blocking call against a domain handle on the blocking pool.
async fn domain_call<T, F>(handle: &Arc<dyn DomainHandle>, call: F) -> HostResult<T>
where
    F: FnOnce(&dyn DomainHandle) -> HostResult<T> + Send + 'static,
    T: Send + 'static,
{
    let handle = Arc::clone(handle);
    offload(move || call(handle.as_ref())).await
}

