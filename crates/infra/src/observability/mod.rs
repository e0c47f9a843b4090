//! Logging setup
//!
//! One global `tracing` subscriber for the process: an `EnvFilter` (from
//! `RUST_LOG`, falling back to the configured level) and a `fmt` layer in
//! either human-readable or JSON form.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};
use virtstat_domain::{LogFormat, LoggingConfig, Result, VirtstatError};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the logging system. Call once at program startup.
///
/// # Errors
/// Returns `VirtstatError::Config` for an unparsable level and
/// `VirtstatError::Internal` if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;

    let output: BoxedLayer = match config.format {
        LogFormat::Pretty => fmt::layer().with_target(true).boxed(),
        LogFormat::Json => fmt::layer().json().with_current_span(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(output)
        .with(filter)
        .try_init()
        .map_err(|e| VirtstatError::Internal(format!("Failed to install log subscriber: {e}")))
}

/// `RUST_LOG` when set, otherwise the configured level.
fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            VirtstatError::Config(format!("Invalid log level '{}': {e}", config.level))
        }),
    }
}
