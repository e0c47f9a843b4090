//! Host version info

use std::sync::Arc;

use tracing::info;
use virtstat_domain::utils::version::format_version;
use virtstat_domain::HostVersions;

use super::CollectResult;
use crate::metrics::families::VERSIONS_INFO;
use crate::metrics::MetricModel;
use crate::offload::offload;
use crate::ports::HostClient;

/// Read the host versions and publish `libvirt_versions_info`.
///
/// This is the first round trip to the host, so callers treat a failure as
/// fatal.
///
/// # Errors
/// Returns the host error, or a metrics error if the family is undeclared.
pub async fn publish_versions(
    host: Arc<dyn HostClient>,
    model: &MetricModel,
) -> CollectResult<HostVersions> {
    let versions = offload(move || host.versions()).await?;

    let hypervisor = format_version(versions.hypervisor);
    let libvirtd = format_version(versions.libvirtd);
    let library = format_version(versions.library);
    model.set_info(VERSIONS_INFO.name, &[&hypervisor, &libvirtd, &library])?;

    info!(hypervisor = %hypervisor, libvirtd = %libvirtd, libvirt_lib = %library, "Connected to host");
    Ok(versions)
}
