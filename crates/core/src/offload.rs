//! Running blocking host calls off the async workers

use tokio::task;
use virtstat_domain::{HostError, HostResult};

/// Run a blocking host call on the runtime's blocking pool.
///
/// A call that panics or is cancelled before it produces a value surfaces as
/// [`HostError::Offload`], so callers handle it like any other host failure.
pub async fn offload<T, F>(call: F) -> HostResult<T>
where
    F: FnOnce() -> HostResult<T> + Send + 'static,
    T: Send + 'static,
{
    match task::spawn_blocking(call).await {
        Ok(result) => result,
        Err(join_err) => Err(HostError::Offload(join_err.to_string())),
    }
}
