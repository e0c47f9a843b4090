//! virtstat - libvirt exporter for Prometheus
//!
//! Main entry point.

use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use virtstat_app::{shutdown, AppContext};
use virtstat_domain::Config;
use virtstat_infra::{config, http, init_logging};

/// How long blocking host calls may keep the runtime alive after shutdown
const RUNTIME_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    let config = config::load().context("Failed to load configuration")?;
    init_logging(&config.logging)?;

    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(e) => debug!(error = %e, "No .env file loaded"),
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("virtstat")
        .max_blocking_threads(config.host.blocking_threads)
        .build()
        .context("Failed to build async runtime")?;

    let result = runtime.block_on(run(config));
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_GRACE);

    info!("virtstat stopped");
    result
}

async fn run(config: Config) -> anyhow::Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), uri = %config.host.uri, "virtstat starting");

    let addr = config.server.socket_addr()?;
    let context = AppContext::new(config).await?;
    let listener = http::bind(addr).await?;

    let shutdown_token = CancellationToken::new();
    shutdown::cancel_on_signal(shutdown_token.clone());

    virtstat_app::serve(context, listener, shutdown_token).await
}
