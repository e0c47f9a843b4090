//! Storage pool collector
//!
//! A pool is collected as a single unit: name, UUID and the batched info
//! call either all succeed or the pool fails.

use std::sync::Arc;

use async_trait::async_trait;
use virtstat_domain::{sample, EntityClass, PoolIdentity, PoolInfo};

use super::{CollectResult, EntityCollector, EntityError, UNKNOWN_ENTITY};
use crate::metrics::families::{
    POOL_ALLOCATION, POOL_AVAILABLE, POOL_CAPACITY, POOL_METADATA_INFO, POOL_STATE,
};
use crate::metrics::MetricModel;
use crate::offload::offload;
use crate::ports::{HostClient, StoragePoolHandle};

/// Collects every storage pool defined on the host.
pub struct StoragePoolCollector {
    host: Arc<dyn HostClient>,
    model: Arc<MetricModel>,
}

impl StoragePoolCollector {
    pub fn new(host: Arc<dyn HostClient>, model: Arc<MetricModel>) -> Self {
        Self { host, model }
    }

    fn write(&self, identity: &PoolIdentity, info: &PoolInfo) -> CollectResult<()> {
        let labels = [identity.name.as_str()];

        self.model.set_info(POOL_METADATA_INFO.name, &[&identity.name, &identity.uuid])?;
        self.model.set_gauge(POOL_STATE.name, &labels, f64::from(info.state))?;
        self.model.set_gauge(POOL_CAPACITY.name, &labels, sample(info.capacity_bytes))?;
        self.model.set_gauge(POOL_ALLOCATION.name, &labels, sample(info.allocation_bytes))?;
        self.model.set_gauge(POOL_AVAILABLE.name, &labels, sample(info.available_bytes))?;
        Ok(())
    }
}

#[async_trait]
impl EntityCollector for StoragePoolCollector {
    type Handle = dyn StoragePoolHandle;

    fn class(&self) -> EntityClass {
        EntityClass::StoragePool
    }

    async fn list(&self) -> CollectResult<Vec<Arc<dyn StoragePoolHandle>>> {
        let host = Arc::clone(&self.host);
        Ok(offload(move || host.list_storage_pools()).await?)
    }

    async fn collect(&self, handle: Arc<dyn StoragePoolHandle>) -> Result<(), EntityError> {
        let pool = Arc::clone(&handle);
        let name = offload(move || pool.name())
            .await
            .map_err(|err| EntityError::new(UNKNOWN_ENTITY, err))?;

        let (uuid, info) = offload(move || Ok((handle.uuid()?, handle.info()?)))
            .await
            .map_err(|err| EntityError::new(&name, err))?;

        let identity = PoolIdentity { name, uuid };
        self.write(&identity, &info).map_err(|err| EntityError::new(&identity.name, err))
    }
}

