//! Configuration loader
//!
//! Loads the exporter configuration from a file and the environment.
//!
//! ## Loading Strategy
//! 1. `VIRTSTAT_CONFIG` names the file explicitly, otherwise standard
//!    locations are probed
//! 2. TOML or JSON, detected by file extension
//! 3. Built-in defaults when no file exists
//! 4. Environment overrides are applied on top
//! 5. The result is validated before it is returned
//!
//! ## Environment Variables
//! - `VIRTSTAT_CONFIG`: Path to the configuration file
//! - `VIRTSTAT_LIBVIRT_URI`: libvirt connection URI
//! - `VIRTSTAT_LISTEN_ADDR`: Exposition listen address (`host:port`)
//! - `VIRTSTAT_LOG_LEVEL`: Default log filter
//! - `VIRTSTAT_LOG_FORMAT`: `pretty` or `json`
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./virtstat.toml`
//! 2. `./config.toml`
//! 3. `./.config/config.toml`
//! 4. `/etc/virtstat/config.toml`

use std::path::{Path, PathBuf};

use virtstat_domain::{Config, LogFormat, Result, VirtstatError};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "VIRTSTAT_CONFIG";

const LIBVIRT_URI_ENV: &str = "VIRTSTAT_LIBVIRT_URI";
const LISTEN_ADDR_ENV: &str = "VIRTSTAT_LISTEN_ADDR";
const LOG_LEVEL_ENV: &str = "VIRTSTAT_LOG_LEVEL";
const LOG_FORMAT_ENV: &str = "VIRTSTAT_LOG_FORMAT";

/// Load, override and validate the configuration.
///
/// # Errors
/// Returns `VirtstatError::Config` if:
/// - `VIRTSTAT_CONFIG` names a file that does not exist
/// - The file cannot be read or parsed
/// - An environment override has an invalid value
/// - The resulting configuration fails validation
pub fn load() -> Result<Config> {
    let explicit = env_override(CONFIG_PATH_ENV).map(PathBuf::from);

    let mut config = match explicit.or_else(probe_config_paths) {
        Some(path) => load_from_file(Some(path))?,
        None => {
            tracing::info!("No configuration file found, using defaults");
            Config::default()
        }
    };

    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `VirtstatError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(VirtstatError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            VirtstatError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| VirtstatError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Apply the `VIRTSTAT_*` environment overrides.
///
/// Unset or empty variables leave the configured value alone.
///
/// # Errors
/// Returns `VirtstatError::Config` for an unknown log format.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Some(uri) = env_override(LIBVIRT_URI_ENV) {
        config.host.uri = uri;
    }
    if let Some(addr) = env_override(LISTEN_ADDR_ENV) {
        config.server.listen_addr = addr;
    }
    if let Some(level) = env_override(LOG_LEVEL_ENV) {
        config.logging.level = level;
    }
    if let Some(format) = env_override(LOG_FORMAT_ENV) {
        config.logging.format = format
            .parse::<LogFormat>()
            .map_err(|e| VirtstatError::Config(format!("{LOG_FORMAT_ENV}: {e}")))?;
    }
    Ok(())
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`); files without
/// an extension are read as TOML.
///
/// # Errors
/// Returns `VirtstatError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| VirtstatError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| VirtstatError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(VirtstatError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend([
            cwd.join("virtstat.toml"),
            cwd.join("config.toml"),
            cwd.join(".config").join("config.toml"),
        ]);
    }
    candidates.push(PathBuf::from("/etc/virtstat/config.toml"));

    candidates.into_iter().find(|path| path.exists())
}

/// Non-empty value of an environment variable.
fn env_override(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}
