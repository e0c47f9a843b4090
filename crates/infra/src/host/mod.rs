//! Virtualization host adapters
//!
//! Implementations of the `virtstat-core` host ports. The libvirt adapter
//! links against the system libvirt library and is only compiled with the
//! `libvirt` feature.

#[cfg(feature = "libvirt")]
pub mod libvirt;

use std::sync::Arc;

use virtstat_core::ports::HostClient;
use virtstat_domain::HostError;

/// Open a connection to the host at `uri`.
///
/// # Errors
/// Returns `HostError::Connection` when the host cannot be reached, or
/// `HostError::Unsupported` when the binary was built without the `libvirt`
/// feature.
#[cfg(feature = "libvirt")]
pub fn connect(uri: &str) -> Result<Arc<dyn HostClient>, HostError> {
    Ok(Arc::new(libvirt::LibvirtHost::connect(uri)?))
}

/// Open a connection to the host at `uri`.
///
/// # Errors
/// Always returns `HostError::Unsupported`; rebuild with `--features libvirt`.
#[cfg(not(feature = "libvirt"))]
pub fn connect(uri: &str) -> Result<Arc<dyn HostClient>, HostError> {
    tracing::error!(uri, "virtstat was built without libvirt support");
    Err(HostError::Unsupported("libvirt host access"))
}
