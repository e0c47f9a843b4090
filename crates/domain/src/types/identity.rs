//! Entity identities.
//!
//! Identities are read from a fresh handle on every cycle and used as metric
//! label values. They are never cached between cycles.

use std::fmt;

/// `(name, uuid)` of a domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DomainIdentity {
    pub name: String,
    pub uuid: String,
}

impl fmt::Display for DomainIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.uuid)
    }
}

/// `(pool_name, pool_uuid)` of a storage pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolIdentity {
    pub name: String,
    pub uuid: String,
}

impl fmt::Display for PoolIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.uuid)
    }
}
