//! In-memory host with configurable failures, delays and panics.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use virtstat_core::ports::{DomainHandle, HostClient, StoragePoolHandle};
use virtstat_domain::{
    BlockStats, CpuStats, DomainInfo, HostError, HostResult, HostVersions, InterfaceStats,
    MemoryStats, PoolInfo,
};

/// Domain calls that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainCall {
    Name,
    Uuid,
    Info,
    IsActive,
    XmlDesc,
    CpuStats,
    MemoryStats,
    InterfaceStats,
    BlockStats,
}

/// Tracks how many domain info calls run at the same time.
#[derive(Debug, Default)]
pub struct ConcurrencyProbe {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyProbe {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
struct FakeInterface {
    target: Option<String>,
    mac: String,
}

/// One guest, described by its statistics and the devices in its XML.
#[derive(Debug, Clone)]
pub struct FakeDomain {
    pub name: String,
    pub uuid: String,
    pub info: DomainInfo,
    pub active: bool,
    pub cpu: CpuStats,
    pub memory: MemoryStats,
    pub interface_stats: HashMap<String, InterfaceStats>,
    pub block_stats: HashMap<String, BlockStats>,
    /// Replaces the generated descriptor when set
    pub xml_override: Option<String>,
    /// Blocking delay inside the info call
    pub delay: Duration,
    /// Panic inside the name call
    pub panics: bool,
    nova: bool,
    interfaces: Vec<FakeInterface>,
    disks: Vec<String>,
    failing: HashSet<DomainCall>,
    probe: Option<Arc<ConcurrencyProbe>>,
}

impl FakeDomain {
    /// A running guest with two vCPUs and 1 GiB of memory.
    pub fn running(name: &str, uuid: &str) -> Self {
        Self {
            name: name.to_string(),
            uuid: uuid.to_string(),
            info: DomainInfo {
                state: 1,
                max_memory_kib: 1_048_576,
                memory_kib: 1_048_576,
                vcpus: 2,
                cpu_time_ns: 0,
            },
            active: true,
            cpu: CpuStats::default(),
            memory: MemoryStats::default(),
            interface_stats: HashMap::new(),
            block_stats: HashMap::new(),
            xml_override: None,
            delay: Duration::ZERO,
            panics: false,
            nova: false,
            interfaces: Vec::new(),
            disks: Vec::new(),
            failing: HashSet::new(),
            probe: None,
        }
    }

    /// A shut off guest: state 5, no statistics calls allowed.
    pub fn shut_off(name: &str, uuid: &str) -> Self {
        let mut domain = Self::running(name, uuid);
        domain.info.state = 5;
        domain.active = false;
        for call in [
            DomainCall::CpuStats,
            DomainCall::MemoryStats,
            DomainCall::InterfaceStats,
            DomainCall::BlockStats,
        ] {
            domain.failing.insert(call);
        }
        domain
    }

    pub fn with_interface(mut self, dev: &str, mac: &str, stats: InterfaceStats) -> Self {
        self.interfaces.push(FakeInterface { target: Some(dev.to_string()), mac: mac.to_string() });
        self.interface_stats.insert(dev.to_string(), stats);
        self
    }

    /// An interface with no host-side device, as on a stopped guest.
    pub fn with_detached_interface(mut self, mac: &str) -> Self {
        self.interfaces.push(FakeInterface { target: None, mac: mac.to_string() });
        self
    }

    pub fn with_disk(mut self, dev: &str, stats: BlockStats) -> Self {
        self.disks.push(dev.to_string());
        self.block_stats.insert(dev.to_string(), stats);
        self
    }

    pub fn with_nova_metadata(mut self) -> Self {
        self.nova = true;
        self
    }

    pub fn failing(mut self, call: DomainCall) -> Self {
        self.failing.insert(call);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }

    pub fn probed(mut self, probe: &Arc<ConcurrencyProbe>) -> Self {
        self.probe = Some(Arc::clone(probe));
        self
    }

    fn check(&self, call: DomainCall, operation: &'static str) -> HostResult<()> {
        if self.failing.contains(&call) {
            Err(HostError::call(operation, "injected failure"))
        } else {
            Ok(())
        }
    }

    fn descriptor(&self) -> String {
        if let Some(xml) = &self.xml_override {
            return xml.clone();
        }

        let mut devices = String::new();
        for dev in &self.disks {
            devices.push_str(&format!(
                "<disk type='file' device='disk'>\
                 <driver name='qemu' type='qcow2'/>\
                 <source file='/var/lib/libvirt/images/{name}-{dev}.qcow2'/>\
                 <target dev='{dev}' bus='virtio'/>\
                 </disk>",
                name = self.name,
            ));
        }
        for interface in &self.interfaces {
            let target = interface
                .target
                .as_ref()
                .map(|dev| format!("<target dev='{dev}'/>"))
                .unwrap_or_default();
            devices.push_str(&format!(
                "<interface type='network'><mac address='{mac}'/>{target}\
                 <model type='virtio'/></interface>",
                mac = interface.mac,
            ));
        }

        let metadata = if self.nova {
            format!(
                "<metadata><nova:instance xmlns:nova='http://openstack.org/xmlns/libvirt/nova/1.1'>\
                 <nova:name>{name}-server</nova:name>\
                 <nova:flavor name='m1.small'/>\
                 <nova:owner>\
                 <nova:user uuid='u-1'>alice</nova:user>\
                 <nova:project uuid='p-1'>demo</nova:project>\
                 </nova:owner>\
                 </nova:instance></metadata>",
                name = self.name,
            )
        } else {
            String::new()
        };

        format!(
            "<domain type='kvm'><name>{}</name><uuid>{}</uuid>{metadata}<devices>{devices}</devices></domain>",
            self.name, self.uuid
        )
    }
}

impl DomainHandle for FakeDomain {
    fn name(&self) -> HostResult<String> {
        if self.panics {
            panic!("host binding crashed while reading {}", self.name);
        }
        self.check(DomainCall::Name, "name")?;
        Ok(self.name.clone())
    }

    fn uuid(&self) -> HostResult<String> {
        self.check(DomainCall::Uuid, "uuid")?;
        Ok(self.uuid.clone())
    }

    fn info(&self) -> HostResult<DomainInfo> {
        if let Some(probe) = &self.probe {
            probe.enter();
        }
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if let Some(probe) = &self.probe {
            probe.exit();
        }
        self.check(DomainCall::Info, "info")?;
        Ok(self.info)
    }

    fn is_active(&self) -> HostResult<bool> {
        self.check(DomainCall::IsActive, "is_active")?;
        Ok(self.active)
    }

    fn xml_desc(&self) -> HostResult<String> {
        self.check(DomainCall::XmlDesc, "xml_desc")?;
        Ok(self.descriptor())
    }

    fn cpu_stats(&self) -> HostResult<CpuStats> {
        self.check(DomainCall::CpuStats, "cpu_stats")?;
        Ok(self.cpu)
    }

    fn memory_stats(&self) -> HostResult<MemoryStats> {
        self.check(DomainCall::MemoryStats, "memory_stats")?;
        Ok(self.memory)
    }

    fn interface_stats(&self, dev: &str) -> HostResult<InterfaceStats> {
        self.check(DomainCall::InterfaceStats, "interface_stats")?;
        self.interface_stats
            .get(dev)
            .copied()
            .ok_or_else(|| HostError::call("interface_stats", format!("no device {dev}")))
    }

    fn block_stats(&self, dev: &str) -> HostResult<BlockStats> {
        self.check(DomainCall::BlockStats, "block_stats")?;
        self.block_stats
            .get(dev)
            .copied()
            .ok_or_else(|| HostError::call("block_stats", format!("no device {dev}")))
    }
}

#[derive(Debug, Clone)]
pub struct FakePool {
    pub name: String,
    pub uuid: String,
    pub info: PoolInfo,
    pub fail_info: bool,
}

impl FakePool {
    pub fn new(name: &str, uuid: &str, info: PoolInfo) -> Self {
        Self { name: name.to_string(), uuid: uuid.to_string(), info, fail_info: false }
    }

    pub fn failing_info(mut self) -> Self {
        self.fail_info = true;
        self
    }
}

impl StoragePoolHandle for FakePool {
    fn name(&self) -> HostResult<String> {
        Ok(self.name.clone())
    }

    fn uuid(&self) -> HostResult<String> {
        Ok(self.uuid.clone())
    }

    fn info(&self) -> HostResult<PoolInfo> {
        if self.fail_info {
            return Err(HostError::call("storage_pool_info", "injected failure"));
        }
        Ok(self.info)
    }
}

/// Host whose inventory can be changed between cycles.
#[derive(Debug, Default)]
pub struct FakeHost {
    domains: Mutex<Vec<FakeDomain>>,
    pools: Mutex<Vec<FakePool>>,
    listing_failures: AtomicUsize,
    list_calls: AtomicUsize,
    pub versions: HostVersions,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            versions: HostVersions {
                hypervisor: 8_002_000,
                libvirtd: 10_000_000,
                library: 10_000_000,
            },
            ..Self::default()
        }
    }

    pub fn with_domain(self, domain: FakeDomain) -> Self {
        self.domains.lock().push(domain);
        self
    }

    pub fn with_pool(self, pool: FakePool) -> Self {
        self.pools.lock().push(pool);
        self
    }

    /// Make the next `count` listings fail.
    pub fn fail_next_listings(&self, count: usize) {
        self.listing_failures.store(count, Ordering::SeqCst);
    }

    /// Listings attempted so far, successful or not.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Mutate a domain before the next listing.
    pub fn update_domain(&self, name: &str, update: impl FnOnce(&mut FakeDomain)) {
        let mut domains = self.domains.lock();
        if let Some(domain) = domains.iter_mut().find(|domain| domain.name == name) {
            update(domain);
        }
    }

    pub fn remove_domain(&self, name: &str) {
        self.domains.lock().retain(|domain| domain.name != name);
    }

    fn check_listing(&self) -> HostResult<()> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let refused = self
            .listing_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if refused {
            Err(HostError::Connection("connection reset by peer".into()))
        } else {
            Ok(())
        }
    }
}

impl HostClient for FakeHost {
    fn list_domains(&self) -> HostResult<Vec<Arc<dyn DomainHandle>>> {
        self.check_listing()?;
        Ok(self
            .domains
            .lock()
            .iter()
            .cloned()
            .map(|domain| Arc::new(domain) as Arc<dyn DomainHandle>)
            .collect())
    }

    fn list_storage_pools(&self) -> HostResult<Vec<Arc<dyn StoragePoolHandle>>> {
        self.check_listing()?;
        Ok(self
            .pools
            .lock()
            .iter()
            .cloned()
            .map(|pool| Arc::new(pool) as Arc<dyn StoragePoolHandle>)
            .collect())
    }

    fn versions(&self) -> HostResult<HostVersions> {
        Ok(self.versions)
    }
}
