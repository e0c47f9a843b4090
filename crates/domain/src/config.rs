//! Configuration structures
//!
//! Every section has defaults so an exporter can start with no file at all.
//! Loading from files and the environment lives in `virtstat-infra::config`.

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BACKOFF_INITIAL_MS, DEFAULT_BACKOFF_MAX_MS, DEFAULT_BLOCKING_THREADS,
    DEFAULT_DOMAIN_INTERVAL_SECS, DEFAULT_ENTITY_TIMEOUT_SECS, DEFAULT_KEYSTONE_DOMAIN,
    DEFAULT_LIBVIRT_URI, DEFAULT_LISTEN_ADDR, DEFAULT_POOL_INTERVAL_SECS,
    DEFAULT_TOKEN_CACHE_TTL_SECS,
};
use crate::errors::{Result, VirtstatError};
use crate::impl_str_conversions;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: HostConfig,
    pub server: ServerConfig,
    pub collection: CollectionConfig,
    pub logging: LoggingConfig,
    pub keystone: Option<KeystoneConfig>,
    pub authentication: Option<AuthenticationConfig>,
}

/// Virtualization host connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// libvirt connection URI
    pub uri: String,
    /// Upper bound on concurrently blocked host calls
    pub blocking_threads: usize,
}

/// Exposition listener
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
}

/// Collection loop tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Pause between domain cycles
    pub domain_interval_secs: u64,
    /// Pause between storage pool cycles
    pub pool_interval_secs: u64,
    /// Per-entity collection deadline; `0` disables it
    pub entity_timeout_secs: u64,
    /// Maximum entities collected at once per class; unbounded when absent
    pub max_concurrency: Option<usize>,
    pub backoff_initial_ms: u64,
    pub backoff_max_ms: u64,
}

/// Log output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    pub format: LogFormat,
}

/// Log line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl_str_conversions!(LogFormat {
    Pretty => "pretty",
    Json => "json",
});

/// Identity service used to guard the exposition endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeystoneConfig {
    /// Base URL including the version prefix, e.g. `https://keystone:5000/v3`
    pub auth_url: String,
    /// How long a validated token is trusted without asking again
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

/// Service credentials the exporter uses to validate scraper tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum AuthenticationConfig {
    #[serde(rename = "password")]
    Password {
        username: String,
        #[serde(skip_serializing)]
        password: String,
        #[serde(default = "default_keystone_domain")]
        user_domain_name: String,
        #[serde(default)]
        project_name: Option<String>,
        #[serde(default = "default_keystone_domain")]
        project_domain_name: String,
    },
    #[serde(rename = "ApplicationCredential")]
    ApplicationCredential {
        application_credential_id: String,
        #[serde(skip_serializing)]
        application_credential_secret: String,
    },
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_TOKEN_CACHE_TTL_SECS
}

fn default_keystone_domain() -> String {
    DEFAULT_KEYSTONE_DOMAIN.to_string()
}

impl Default for HostConfig {
    fn default() -> Self {
        Self { uri: DEFAULT_LIBVIRT_URI.to_string(), blocking_threads: DEFAULT_BLOCKING_THREADS }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { listen_addr: DEFAULT_LISTEN_ADDR.to_string() }
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            domain_interval_secs: DEFAULT_DOMAIN_INTERVAL_SECS,
            pool_interval_secs: DEFAULT_POOL_INTERVAL_SECS,
            entity_timeout_secs: DEFAULT_ENTITY_TIMEOUT_SECS,
            max_concurrency: None,
            backoff_initial_ms: DEFAULT_BACKOFF_INITIAL_MS,
            backoff_max_ms: DEFAULT_BACKOFF_MAX_MS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Pretty }
    }
}

impl CollectionConfig {
    pub fn domain_interval(&self) -> Duration {
        Duration::from_secs(self.domain_interval_secs)
    }

    pub fn pool_interval(&self) -> Duration {
        Duration::from_secs(self.pool_interval_secs)
    }

    /// `None` when the deadline is disabled
    pub fn entity_timeout(&self) -> Option<Duration> {
        (self.entity_timeout_secs > 0).then(|| Duration::from_secs(self.entity_timeout_secs))
    }

    pub fn backoff_initial(&self) -> Duration {
        Duration::from_millis(self.backoff_initial_ms)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }
}

impl ServerConfig {
    /// Parsed listener address
    ///
    /// # Errors
    /// Returns `VirtstatError::Config` if the address is not `ip:port`.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.listen_addr.parse().map_err(|e| {
            VirtstatError::Config(format!("Invalid listen address '{}': {}", self.listen_addr, e))
        })
    }
}

impl Config {
    /// Check cross-field constraints that serde cannot express
    ///
    /// # Errors
    /// Returns `VirtstatError::Config` describing the first violation found.
    pub fn validate(&self) -> Result<()> {
        if self.host.uri.trim().is_empty() {
            return Err(VirtstatError::Config("host.uri must not be empty".to_string()));
        }
        if self.host.blocking_threads == 0 {
            return Err(VirtstatError::Config(
                "host.blocking_threads must be at least 1".to_string(),
            ));
        }

        self.server.socket_addr()?;

        let collection = &self.collection;
        if collection.max_concurrency == Some(0) {
            return Err(VirtstatError::Config(
                "collection.max_concurrency must be at least 1 when set".to_string(),
            ));
        }
        if collection.backoff_initial_ms == 0 {
            return Err(VirtstatError::Config(
                "collection.backoff_initial_ms must be greater than 0".to_string(),
            ));
        }
        if collection.backoff_initial_ms > collection.backoff_max_ms {
            return Err(VirtstatError::Config(format!(
                "collection.backoff_initial_ms ({}) exceeds backoff_max_ms ({})",
                collection.backoff_initial_ms, collection.backoff_max_ms
            )));
        }

        if self.logging.level.trim().is_empty() {
            return Err(VirtstatError::Config("logging.level must not be empty".to_string()));
        }

        match (&self.keystone, &self.authentication) {
            (Some(keystone), Some(auth)) => {
                if keystone.auth_url.trim().is_empty() {
                    return Err(VirtstatError::Config(
                        "keystone.auth_url must not be empty".to_string(),
                    ));
                }
                auth.validate()?;
            }
            (Some(_), None) => {
                return Err(VirtstatError::Config(
                    "[keystone] requires an [authentication] section".to_string(),
                ));
            }
            (None, Some(_)) => {
                return Err(VirtstatError::Config(
                    "[authentication] is set but [keystone] is missing".to_string(),
                ));
            }
            (None, None) => {}
        }

        Ok(())
    }

    /// Whether scrapes must present a Keystone token
    pub fn auth_enabled(&self) -> bool {
        self.keystone.is_some()
    }
}

impl AuthenticationConfig {
    fn validate(&self) -> Result<()> {
        let missing = match self {
            Self::Password { username, password, .. } => {
                username.is_empty().then_some("username").or(password.is_empty().then_some("password"))
            }
            Self::ApplicationCredential { application_credential_id, application_credential_secret } => {
                application_credential_id
                    .is_empty()
                    .then_some("application_credential_id")
                    .or(application_credential_secret
                        .is_empty()
                        .then_some("application_credential_secret"))
            }
        };

        match missing {
            Some(field) => Err(VirtstatError::Config(format!("authentication.{field} must not be empty"))),
            None => Ok(()),
        }
    }
}
