//! # virtstat
//!
//! Process wiring for the exporter binary.
//!
//! This crate contains:
//! - Application context (host, model, schedulers, token validation)
//! - Signal handling and the serve loop
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod context;
pub mod shutdown;

pub use context::AppContext;

use tokio_util::sync::CancellationToken;
use virtstat_infra::http;

/// Serve the context's routes until `shutdown` is cancelled, then stop
/// collection.
///
/// # Errors
/// Returns the first of a server failure or a scheduler stop failure.
pub async fn serve(
    mut context: AppContext,
    listener: tokio::net::TcpListener,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    context.start().await?;

    let served = http::serve(listener, context.router(), shutdown.clone()).await;
    shutdown.cancel();

    let stopped = context.shutdown().await;
    served?;
    stopped
}
