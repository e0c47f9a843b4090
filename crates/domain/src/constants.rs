//! Application constants
//!
//! Defaults shared by the configuration structs and the schedulers.

// Host connection
pub const DEFAULT_LIBVIRT_URI: &str = "qemu:///system";
pub const DEFAULT_BLOCKING_THREADS: usize = 8;

// Exposition
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";

// Collection pacing. Domains are re-listed as soon as a cycle joins.
pub const DEFAULT_DOMAIN_INTERVAL_SECS: u64 = 0;
pub const DEFAULT_POOL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_ENTITY_TIMEOUT_SECS: u64 = 60;

// Listing back-off
pub const DEFAULT_BACKOFF_INITIAL_MS: u64 = 1_000;
pub const DEFAULT_BACKOFF_MAX_MS: u64 = 60_000;

// Keystone token validation
pub const DEFAULT_TOKEN_CACHE_TTL_SECS: u64 = 60;
pub const DEFAULT_KEYSTONE_DOMAIN: &str = "Default";

// Unit conversion
pub const BYTES_PER_KIB: u64 = 1024;
pub const NANOS_PER_SECOND: f64 = 1_000_000_000.0;
