//! Application context - owns the host connection, the metric model and the
//! collection schedulers for the lifetime of the process

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tracing::{info, warn};
use virtstat_core::metrics::families::ALL;
use virtstat_core::offload::offload;
use virtstat_core::{
    publish_versions, CollectionScheduler, DomainCollector, EntityCollector, HostClient,
    MetricModel, SchedulerConfig, StoragePoolCollector,
};
use virtstat_domain::Config;
use virtstat_infra::http::{self, AppState};
use virtstat_infra::{host, KeystoneValidator, TokenValidator};

pub struct AppContext {
    pub config: Config,
    pub model: Arc<MetricModel>,
    pub host: Arc<dyn HostClient>,
    pub validator: Option<Arc<dyn TokenValidator>>,

    domain_scheduler: CollectionScheduler<DomainCollector>,
    pool_scheduler: CollectionScheduler<StoragePoolCollector>,
}

impl AppContext {
    /// Connect to the configured host and build every component.
    ///
    /// # Errors
    /// Fails if the host cannot be reached or does not answer the version
    /// query, or if the Keystone client cannot be built.
    pub async fn new(config: Config) -> Result<Self> {
        let uri = config.host.uri.clone();
        let host = offload(move || host::connect(&uri))
            .await
            .with_context(|| format!("Failed to connect to {}", config.host.uri))?;

        Self::with_host(config, host).await
    }

    /// Build every component on top of an already connected host.
    ///
    /// # Errors
    /// See [`AppContext::new`].
    pub async fn with_host(config: Config, host: Arc<dyn HostClient>) -> Result<Self> {
        let model = Arc::new(MetricModel::new());
        model.declare_all(ALL).context("Failed to declare metric families")?;

        publish_versions(Arc::clone(&host), &model)
            .await
            .context("Failed to read host versions")?;

        let validator = build_validator(&config)?;

        let domain_scheduler = CollectionScheduler::new(
            DomainCollector::new(Arc::clone(&host), Arc::clone(&model)),
            Arc::clone(&model),
            SchedulerConfig::for_domains(&config.collection),
        );
        let pool_scheduler = CollectionScheduler::new(
            StoragePoolCollector::new(Arc::clone(&host), Arc::clone(&model)),
            Arc::clone(&model),
            SchedulerConfig::for_pools(&config.collection),
        );

        Ok(Self { config, model, host, validator, domain_scheduler, pool_scheduler })
    }

    /// Start both collection loops.
    ///
    /// # Errors
    /// Fails if a loop is already running.
    pub async fn start(&mut self) -> Result<()> {
        self.domain_scheduler.start().await.context("Failed to start domain collection")?;
        self.pool_scheduler.start().await.context("Failed to start storage pool collection")?;
        Ok(())
    }

    /// Routes serving this context's model.
    pub fn router(&self) -> Router {
        http::router(AppState::new(Arc::clone(&self.model), self.validator.clone()))
    }

    pub fn is_collecting(&self) -> bool {
        self.domain_scheduler.is_running() && self.pool_scheduler.is_running()
    }

    /// Stop both collection loops. A loop that fails to stop is logged and
    /// does not keep the other one running.
    ///
    /// # Errors
    /// Returns the first stop failure after both loops were asked to stop.
    pub async fn shutdown(&mut self) -> Result<()> {
        info!("Stopping collection");

        let domains = stop(&mut self.domain_scheduler).await;
        let pools = stop(&mut self.pool_scheduler).await;

        domains.and(pools)
    }
}

async fn stop<C: EntityCollector>(scheduler: &mut CollectionScheduler<C>) -> Result<()> {
    if !scheduler.is_running() {
        return Ok(());
    }

    scheduler.stop().await.map_err(|err| {
        warn!(error = %err, "Collection scheduler did not stop cleanly");
        anyhow::Error::new(err)
    })
}

fn build_validator(config: &Config) -> Result<Option<Arc<dyn TokenValidator>>> {
    match (&config.keystone, &config.authentication) {
        (Some(keystone), Some(credentials)) => {
            let validator = KeystoneValidator::from_config(keystone, credentials.clone())
                .context("Failed to build Keystone client")?;
            Ok(Some(Arc::new(validator)))
        }
        _ => {
            info!("Scrape authentication disabled");
            Ok(None)
        }
    }
}
