//! Collection cycles against an in-memory host
//!
//! Each test runs one or more full cycles through the scheduler and checks
//! the series left in the metric model.

mod support;

use std::sync::Arc;

use support::host::{DomainCall, FakeDomain, FakeHost, FakePool};
use virtstat_core::metrics::families::*;
use virtstat_core::{
    publish_versions, CollectionScheduler, DomainCollector, HostClient, MetricModel,
    SchedulerConfig, StoragePoolCollector,
};
use virtstat_domain::{
    nanos_to_seconds, BlockStats, CpuStats, InterfaceStats, MemoryStats, PoolInfo,
};

const VM1_UUID: &str = "11111111-2222-3333-4444-555555555555";
const VM1_MAC: &str = "52:54:00:aa:bb:cc";

fn domain_scheduler(
    host: &Arc<FakeHost>,
    model: &Arc<MetricModel>,
) -> CollectionScheduler<DomainCollector> {
    let client: Arc<dyn HostClient> = host.clone();
    let collector = DomainCollector::new(client, Arc::clone(model));
    CollectionScheduler::new(collector, Arc::clone(model), SchedulerConfig::default())
}

fn pool_scheduler(
    host: &Arc<FakeHost>,
    model: &Arc<MetricModel>,
) -> CollectionScheduler<StoragePoolCollector> {
    let client: Arc<dyn HostClient> = host.clone();
    let collector = StoragePoolCollector::new(client, Arc::clone(model));
    CollectionScheduler::new(collector, Arc::clone(model), SchedulerConfig::default())
}

fn vm1() -> FakeDomain {
    let mut domain = FakeDomain::running("vm1", VM1_UUID)
        .with_interface("vnet0", VM1_MAC, InterfaceStats { rx_bytes: 100, ..Default::default() })
        .with_disk("vda", BlockStats::default());
    domain.cpu = CpuStats { cpu_time_ns: 2_000_000_000, ..Default::default() };
    domain.info.max_memory_kib = 1024;
    domain
}

fn value(model: &MetricModel, family: &str, labels: &[&str]) -> Option<f64> {
    model.value(family, labels).expect("family is declared")
}

#[tokio::test]
async fn running_domain_is_published() {
    let host = Arc::new(FakeHost::new().with_domain(vm1()));
    let model = support::declared_model();

    let report = domain_scheduler(&host, &model).run_cycle().await.unwrap();

    assert_eq!(report.listed, 1);
    assert_eq!(report.succeeded, 1);
    assert!(report.is_complete());

    assert_eq!(value(&model, DOMAIN_METADATA_INFO.name, &["vm1", VM1_UUID]), Some(1.0));
    assert_eq!(value(&model, DOMAIN_STATE.name, &["vm1"]), Some(1.0));
    assert_eq!(value(&model, DOMAIN_VCPUS.name, &["vm1"]), Some(2.0));
    assert_eq!(value(&model, IFACE_RX_BYTES.name, &["vm1", VM1_MAC]), Some(100.0));
    assert_eq!(value(&model, IFACE_TX_BYTES.name, &["vm1", VM1_MAC]), Some(0.0));
    assert_eq!(value(&model, BLOCK_READ_BYTES.name, &["vm1", "vda"]), Some(0.0));
    assert_eq!(
        value(
            &model,
            BLOCK_METADATA_INFO.name,
            &[
                "vm1",
                "file",
                "vda",
                "virtio",
                "/var/lib/libvirt/images/vm1-vda.qcow2",
                "qemu",
                "qcow2",
                ""
            ]
        ),
        Some(1.0)
    );

    let rendered = model.render().unwrap();
    assert!(rendered.contains("libvirt_domain_state{domain=\"vm1\"} 1"));
    assert!(rendered.contains("# TYPE libvirt_domain_info_cpu_time_seconds_total counter"));
}

#[tokio::test]
async fn host_units_are_converted_to_base_units() {
    let host = Arc::new(FakeHost::new().with_domain(vm1()));
    let model = support::declared_model();

    domain_scheduler(&host, &model).run_cycle().await.unwrap();

    assert_eq!(value(&model, DOMAIN_CPU_TIME.name, &["vm1"]), Some(2.0));
    assert_eq!(value(&model, DOMAIN_MAX_MEMORY.name, &["vm1"]), Some(1_048_576.0));
    assert_eq!(value(&model, DOMAIN_MEMORY_USAGE.name, &["vm1"]), Some(1_073_741_824.0));
}

#[tokio::test]
async fn storage_pool_is_published() {
    let pool = FakePool::new(
        "default",
        "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee",
        PoolInfo { state: 1, capacity_bytes: 1000, allocation_bytes: 200, available_bytes: 800 },
    );
    let host = Arc::new(FakeHost::new().with_pool(pool));
    let model = support::declared_model();

    let report = pool_scheduler(&host, &model).run_cycle().await.unwrap();

    assert_eq!(report.succeeded, 1);
    assert_eq!(
        value(
            &model,
            POOL_METADATA_INFO.name,
            &["default", "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee"]
        ),
        Some(1.0)
    );
    assert_eq!(value(&model, POOL_STATE.name, &["default"]), Some(1.0));
    assert_eq!(value(&model, POOL_CAPACITY.name, &["default"]), Some(1000.0));
    assert_eq!(value(&model, POOL_ALLOCATION.name, &["default"]), Some(200.0));
    assert_eq!(value(&model, POOL_AVAILABLE.name, &["default"]), Some(800.0));
}

#[tokio::test]
async fn failing_pool_does_not_hide_its_siblings() {
    let host = Arc::new(
        FakeHost::new()
            .with_pool(FakePool::new("images", "p-1", PoolInfo::default()).failing_info())
            .with_pool(FakePool::new("default", "p-2", PoolInfo { state: 1, ..Default::default() })),
    );
    let model = support::declared_model();

    let report = pool_scheduler(&host, &model).run_cycle().await.unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.succeeded, 1);
    assert_eq!(value(&model, POOL_STATE.name, &["default"]), Some(1.0));
    assert_eq!(value(&model, POOL_STATE.name, &["images"]), None);
    assert_eq!(value(&model, COLLECTION_ERRORS.name, &["storage_pool", "entity"]), Some(1.0));
}

#[tokio::test]
async fn memory_stats_failure_publishes_zeros() {
    let host = Arc::new(FakeHost::new().with_domain(vm1().failing(DomainCall::MemoryStats)));
    let model = support::declared_model();

    let report = domain_scheduler(&host, &model).run_cycle().await.unwrap();

    assert_eq!(report.succeeded, 1);
    assert_eq!(value(&model, MEM_RSS.name, &["vm1"]), Some(0.0));
    assert_eq!(value(&model, MEM_SWAP_IN.name, &["vm1"]), Some(0.0));
    assert_eq!(value(&model, DOMAIN_MAX_MEMORY.name, &["vm1"]), Some(1_048_576.0));
    assert_eq!(value(&model, COLLECTION_ERRORS.name, &["domain", "group"]), None);
}

#[tokio::test]
async fn memory_stats_are_converted_from_kib() {
    let mut domain = vm1();
    domain.memory = MemoryStats {
        rss_kib: 512,
        available_kib: 2048,
        major_faults: 7,
        ..Default::default()
    };
    let host = Arc::new(FakeHost::new().with_domain(domain));
    let model = support::declared_model();

    domain_scheduler(&host, &model).run_cycle().await.unwrap();

    assert_eq!(value(&model, MEM_RSS.name, &["vm1"]), Some(524_288.0));
    assert_eq!(value(&model, MEM_AVAILABLE.name, &["vm1"]), Some(2_097_152.0));
    assert_eq!(value(&model, MEM_MAJOR_FAULTS.name, &["vm1"]), Some(7.0));
}

#[tokio::test]
async fn failing_entities_are_isolated() {
    let host = Arc::new(
        FakeHost::new()
            .with_domain(FakeDomain::running("vm-info", "u-info").failing(DomainCall::Info))
            .with_domain(FakeDomain::running("vm-name", "u-name").failing(DomainCall::Name))
            .with_domain(FakeDomain::running("vm-crash", "u-crash").panicking())
            .with_domain(vm1()),
    );
    let model = support::declared_model();

    let report = domain_scheduler(&host, &model).run_cycle().await.unwrap();

    assert_eq!(report.listed, 4);
    assert_eq!(report.failed, 3);
    assert_eq!(report.succeeded, 1);
    assert!(report.is_complete());

    assert_eq!(value(&model, DOMAIN_STATE.name, &["vm1"]), Some(1.0));
    assert_eq!(value(&model, IFACE_RX_BYTES.name, &["vm1", VM1_MAC]), Some(100.0));
    assert_eq!(value(&model, DOMAIN_STATE.name, &["vm-info"]), None);
    assert_eq!(value(&model, COLLECTION_ERRORS.name, &["domain", "entity"]), Some(3.0));
}

#[tokio::test]
async fn descriptor_failure_keeps_metadata_already_written() {
    let mut domain = vm1();
    domain.xml_override = Some("<domain><devices><disk>".to_string());
    let host = Arc::new(FakeHost::new().with_domain(domain));
    let model = support::declared_model();

    let report = domain_scheduler(&host, &model).run_cycle().await.unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(value(&model, DOMAIN_METADATA_INFO.name, &["vm1", VM1_UUID]), Some(1.0));
    assert_eq!(value(&model, DOMAIN_STATE.name, &["vm1"]), Some(1.0));
    assert_eq!(value(&model, DOMAIN_CPU_TIME.name, &["vm1"]), None);
    assert_eq!(model.series_count(IFACE_RX_BYTES.name).unwrap(), 0);
}

#[tokio::test]
async fn interface_failure_is_a_group_error() {
    let host = Arc::new(FakeHost::new().with_domain(vm1().failing(DomainCall::InterfaceStats)));
    let model = support::declared_model();

    let report = domain_scheduler(&host, &model).run_cycle().await.unwrap();

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(value(&model, COLLECTION_ERRORS.name, &["domain", "group"]), Some(1.0));
    assert_eq!(value(&model, DOMAIN_CPU_TIME.name, &["vm1"]), Some(2.0));
    assert_eq!(value(&model, BLOCK_READ_BYTES.name, &["vm1", "vda"]), Some(0.0));
}

#[tokio::test]
async fn block_stats_failure_publishes_zeros() {
    let mut domain = vm1().failing(DomainCall::BlockStats);
    domain.block_stats.insert("vda".into(), BlockStats { read_bytes: 4096, ..Default::default() });
    let host = Arc::new(FakeHost::new().with_domain(domain));
    let model = support::declared_model();

    domain_scheduler(&host, &model).run_cycle().await.unwrap();

    assert_eq!(value(&model, BLOCK_READ_BYTES.name, &["vm1", "vda"]), Some(0.0));
    assert_eq!(value(&model, BLOCK_FLUSH_TIME.name, &["vm1", "vda"]), Some(0.0));
    assert_eq!(value(&model, COLLECTION_ERRORS.name, &["domain", "group"]), None);
}

#[tokio::test]
async fn classic_only_host_stats_leave_detailed_series_at_zero() {
    let mut domain = vm1();
    domain.block_stats.insert(
        "vda".into(),
        BlockStats {
            read_bytes: 8192,
            read_operations: 2,
            write_bytes: 4096,
            write_operations: 1,
            ..Default::default()
        },
    );
    let host = Arc::new(FakeHost::new().with_domain(domain));
    let model = support::declared_model();

    domain_scheduler(&host, &model).run_cycle().await.unwrap();

    assert_eq!(value(&model, DOMAIN_CPU_TIME.name, &["vm1"]), Some(2.0));
    assert_eq!(value(&model, DOMAIN_CPU_USER_TIME.name, &["vm1"]), Some(0.0));
    assert_eq!(value(&model, DOMAIN_CPU_SYSTEM_TIME.name, &["vm1"]), Some(0.0));
    assert_eq!(value(&model, BLOCK_READ_BYTES.name, &["vm1", "vda"]), Some(8192.0));
    assert_eq!(value(&model, BLOCK_WRITE_OPS.name, &["vm1", "vda"]), Some(1.0));
    for family in [BLOCK_READ_TIME, BLOCK_WRITE_TIME, BLOCK_FLUSH_OPS, BLOCK_FLUSH_TIME] {
        assert_eq!(value(&model, family.name, &["vm1", "vda"]), Some(0.0), "{}", family.name);
    }
}

#[tokio::test]
async fn shut_off_domain_reports_zero_activity() {
    let domain = FakeDomain::shut_off("vm-off", "u-off")
        .with_detached_interface("52:54:00:00:00:01")
        .with_disk("vda", BlockStats::default());
    let host = Arc::new(FakeHost::new().with_domain(domain));
    let model = support::declared_model();

    let report = domain_scheduler(&host, &model).run_cycle().await.unwrap();

    assert_eq!(report.succeeded, 1);
    assert_eq!(value(&model, DOMAIN_STATE.name, &["vm-off"]), Some(5.0));
    assert_eq!(value(&model, DOMAIN_CPU_TIME.name, &["vm-off"]), Some(0.0));
    assert_eq!(value(&model, MEM_RSS.name, &["vm-off"]), Some(0.0));
    assert_eq!(value(&model, BLOCK_WRITE_BYTES.name, &["vm-off", "vda"]), Some(0.0));
    assert_eq!(model.series_count(IFACE_RX_BYTES.name).unwrap(), 0);
    assert_eq!(value(&model, COLLECTION_ERRORS.name, &["domain", "group"]), None);
}

#[tokio::test]
async fn nova_ownership_is_published() {
    let host = Arc::new(FakeHost::new().with_domain(vm1().with_nova_metadata()));
    let model = support::declared_model();

    domain_scheduler(&host, &model).run_cycle().await.unwrap();

    assert_eq!(
        value(
            &model,
            DOMAIN_NOVA_METADATA_INFO.name,
            &["vm1", VM1_UUID, "vm1-server", "m1.small", "alice", "u-1", "demo", "p-1"]
        ),
        Some(1.0)
    );
}

#[tokio::test]
async fn plain_domain_has_no_nova_series() {
    let host = Arc::new(FakeHost::new().with_domain(vm1()));
    let model = support::declared_model();

    domain_scheduler(&host, &model).run_cycle().await.unwrap();

    assert_eq!(model.series_count(DOMAIN_NOVA_METADATA_INFO.name).unwrap(), 0);
}

#[tokio::test]
async fn repeated_cycles_are_idempotent() {
    let host = Arc::new(FakeHost::new().with_domain(vm1()));
    let model = support::declared_model();
    let scheduler = domain_scheduler(&host, &model);

    scheduler.run_cycle().await.unwrap();
    let series_after_first = model.series_count(IFACE_RX_BYTES.name).unwrap();
    scheduler.run_cycle().await.unwrap();

    assert_eq!(model.series_count(IFACE_RX_BYTES.name).unwrap(), series_after_first);
    assert_eq!(model.series_count(DOMAIN_METADATA_INFO.name).unwrap(), 1);
    assert_eq!(value(&model, IFACE_RX_BYTES.name, &["vm1", VM1_MAC]), Some(100.0));
    assert_eq!(value(&model, DOMAIN_CPU_TIME.name, &["vm1"]), Some(2.0));
    assert_eq!(value(&model, COLLECTION_CYCLES.name, &["domain"]), Some(2.0));
}

#[tokio::test]
async fn counters_follow_host_counters() {
    let host = Arc::new(FakeHost::new().with_domain(vm1()));
    let model = support::declared_model();
    let scheduler = domain_scheduler(&host, &model);

    scheduler.run_cycle().await.unwrap();
    host.update_domain("vm1", |domain| {
        domain.interface_stats.insert(
            "vnet0".into(),
            InterfaceStats { rx_bytes: 250, rx_packets: 3, ..Default::default() },
        );
        domain.cpu.cpu_time_ns = 3_500_000_000;
    });
    scheduler.run_cycle().await.unwrap();

    assert_eq!(value(&model, IFACE_RX_BYTES.name, &["vm1", VM1_MAC]), Some(250.0));
    assert_eq!(value(&model, IFACE_RX_PACKETS.name, &["vm1", VM1_MAC]), Some(3.0));
    assert_eq!(value(&model, DOMAIN_CPU_TIME.name, &["vm1"]), Some(3.5));
}

#[tokio::test]
async fn counters_mirror_host_totals_exactly() {
    let mut domain = vm1();
    domain.cpu.cpu_time_ns = 79_331_461_629;
    let host = Arc::new(FakeHost::new().with_domain(domain));
    let model = support::declared_model();
    let scheduler = domain_scheduler(&host, &model);

    scheduler.run_cycle().await.unwrap();
    assert_eq!(
        value(&model, DOMAIN_CPU_TIME.name, &["vm1"]),
        Some(nanos_to_seconds(79_331_461_629))
    );

    host.update_domain("vm1", |domain| domain.cpu.cpu_time_ns = 233_402_829_127);
    scheduler.run_cycle().await.unwrap();
    let advanced = value(&model, DOMAIN_CPU_TIME.name, &["vm1"]);
    assert_eq!(advanced, Some(nanos_to_seconds(233_402_829_127)));

    scheduler.run_cycle().await.unwrap();
    assert_eq!(value(&model, DOMAIN_CPU_TIME.name, &["vm1"]), advanced);
}

#[tokio::test]
async fn restarted_host_counter_is_exposed_as_is() {
    let mut domain = vm1();
    domain.cpu.cpu_time_ns = 233_402_829_127;
    let host = Arc::new(FakeHost::new().with_domain(domain));
    let model = support::declared_model();
    let scheduler = domain_scheduler(&host, &model);

    scheduler.run_cycle().await.unwrap();
    host.update_domain("vm1", |domain| domain.cpu.cpu_time_ns = 1_234_567_891);
    scheduler.run_cycle().await.unwrap();

    assert_eq!(
        value(&model, DOMAIN_CPU_TIME.name, &["vm1"]),
        Some(nanos_to_seconds(1_234_567_891))
    );
}

#[tokio::test]
async fn vanished_domain_keeps_its_series() {
    let host = Arc::new(FakeHost::new().with_domain(vm1()));
    let model = support::declared_model();
    let scheduler = domain_scheduler(&host, &model);

    scheduler.run_cycle().await.unwrap();
    host.remove_domain("vm1");
    let report = scheduler.run_cycle().await.unwrap();

    assert_eq!(report.listed, 0);
    assert_eq!(value(&model, DOMAIN_STATE.name, &["vm1"]), Some(1.0));
    assert_eq!(value(&model, COLLECTION_ENTITIES.name, &["domain"]), Some(0.0));
}

#[tokio::test]
async fn listing_failure_is_counted_and_returned() {
    let host = Arc::new(FakeHost::new().with_domain(vm1()));
    let model = support::declared_model();
    host.fail_next_listings(1);

    let scheduler = domain_scheduler(&host, &model);
    assert!(scheduler.run_cycle().await.is_err());
    assert_eq!(value(&model, COLLECTION_ERRORS.name, &["domain", "listing"]), Some(1.0));
    assert_eq!(value(&model, COLLECTION_CYCLES.name, &["domain"]), None);

    let report = scheduler.run_cycle().await.unwrap();
    assert_eq!(report.succeeded, 1);
}

#[tokio::test]
async fn versions_are_published_once() {
    let host = Arc::new(FakeHost::new());
    let model = support::declared_model();
    let client: Arc<dyn HostClient> = host.clone();

    let versions = publish_versions(client, &model).await.unwrap();

    assert_eq!(versions, host.versions);
    assert_eq!(value(&model, VERSIONS_INFO.name, &["8.2.0", "10.0.0", "10.0.0"]), Some(1.0));
}
