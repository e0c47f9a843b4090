//! Collection scheduler for one entity class.
//!
//! Each cycle lists the entities of the class, collects all of them
//! concurrently in a `JoinSet`, waits for every task, folds the outcomes into
//! a [`CycleReport`] and then pauses for the class interval. Entity failures,
//! timeouts and panics are isolated to their task. A failed listing backs off
//! exponentially until the host answers again.
//!
//! Lifecycle follows the other background workers: an explicit
//! `start`/`stop`, a tracked join handle and a cancellation token.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use virtstat_core::collectors::DomainCollector;
//! use virtstat_core::metrics::MetricModel;
//! use virtstat_core::scheduler::{CollectionScheduler, SchedulerConfig};
//! use virtstat_domain::CollectionConfig;
//!
//! # async fn example(host: Arc<dyn virtstat_core::ports::HostClient>) -> Result<(), Box<dyn std::error::Error>> {
//! let model = Arc::new(MetricModel::new());
//! let collector = DomainCollector::new(host, Arc::clone(&model));
//! let config = SchedulerConfig::for_domains(&CollectionConfig::default());
//!
//! let mut scheduler = CollectionScheduler::new(collector, model, config);
//! scheduler.start().await?;
//! // ... application runs ...
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use virtstat_domain::CollectionConfig;

use super::backoff::ListingBackoff;
use super::error::{SchedulerError, SchedulerResult};
use super::report::{record_cycle, record_error, CycleReport, ErrorScope};
use crate::collectors::{CollectResult, EntityCollector, EntityError};
use crate::metrics::MetricModel;

/// Configuration for one collection scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Pause after each completed cycle
    pub interval: Duration,
    /// Deadline for a single entity; `None` waits indefinitely
    pub entity_timeout: Option<Duration>,
    /// Maximum entities collected at once; `None` is unbounded
    pub max_concurrency: Option<usize>,
    /// First delay after a failed listing
    pub backoff_initial: Duration,
    /// Upper bound on the listing delay
    pub backoff_max: Duration,
    /// Timeout for awaiting the loop task when stopping
    pub join_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::for_domains(&CollectionConfig::default())
    }
}

impl SchedulerConfig {
    /// Domain scheduler settings.
    pub fn for_domains(collection: &CollectionConfig) -> Self {
        Self { interval: collection.domain_interval(), ..Self::shared(collection) }
    }

    /// Storage pool scheduler settings.
    pub fn for_pools(collection: &CollectionConfig) -> Self {
        Self { interval: collection.pool_interval(), ..Self::shared(collection) }
    }

    fn shared(collection: &CollectionConfig) -> Self {
        Self {
            interval: Duration::ZERO,
            entity_timeout: collection.entity_timeout(),
            max_concurrency: collection.max_concurrency,
            backoff_initial: collection.backoff_initial(),
            backoff_max: collection.backoff_max(),
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// How one entity task ended.
enum EntityOutcome {
    Succeeded,
    Failed(EntityError),
    TimedOut,
}

/// Repeating collection loop for one entity class.
pub struct CollectionScheduler<C: EntityCollector> {
    collector: Arc<C>,
    model: Arc<MetricModel>,
    config: SchedulerConfig,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl<C: EntityCollector> CollectionScheduler<C> {
    pub fn new(collector: C, model: Arc<MetricModel>, config: SchedulerConfig) -> Self {
        Self {
            collector: Arc::new(collector),
            model,
            config,
            cancellation: CancellationToken::new(),
            task_handle: None,
        }
    }

    /// Start the loop on a background task.
    #[instrument(skip(self), fields(class = %self.collector.class()))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.cancellation = CancellationToken::new();

        let collector = Arc::clone(&self.collector);
        let model = Arc::clone(&self.model);
        let config = self.config.clone();
        let cancel = self.cancellation.clone();

        let handle = tokio::spawn(async move {
            Self::process_loop(collector, model, config, cancel).await;
        });

        self.task_handle = Some(handle);
        info!(
            interval_secs = self.config.interval.as_secs(),
            entity_timeout_secs = entity_timeout_secs(&self.config),
            "Collection scheduler started"
        );
        Ok(())
    }

    /// Cancel the loop and wait for it to exit.
    #[instrument(skip(self), fields(class = %self.collector.class()))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        self.cancellation.cancel();

        if let Some(handle) = self.task_handle.take() {
            let join_timeout = self.config.join_timeout;
            match tokio::time::timeout(join_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(error = %e, "Collection loop task failed");
                    return Err(SchedulerError::TaskJoinFailed(e.to_string()));
                }
                Err(_) => {
                    warn!("Collection loop did not exit within timeout");
                    return Err(SchedulerError::Timeout { seconds: join_timeout.as_secs() });
                }
            }
        }

        info!("Collection scheduler stopped");
        self.cancellation = CancellationToken::new();
        Ok(())
    }

    /// Returns true while the loop task is active.
    pub fn is_running(&self) -> bool {
        self.task_handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Run a single cycle in the caller's task.
    ///
    /// # Errors
    /// Returns the listing failure; entity failures are only counted in the
    /// report.
    pub async fn run_cycle(&self) -> CollectResult<CycleReport> {
        Self::execute_cycle(&self.collector, &self.model, &self.config).await
    }

    /// Run the loop in the caller's task until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        Self::process_loop(
            Arc::clone(&self.collector),
            Arc::clone(&self.model),
            self.config.clone(),
            cancel,
        )
        .await;
    }

    async fn process_loop(
        collector: Arc<C>,
        model: Arc<MetricModel>,
        config: SchedulerConfig,
        cancel: CancellationToken,
    ) {
        let class = collector.class();
        let mut backoff = ListingBackoff::new(config.backoff_initial, config.backoff_max);

        loop {
            // Dropping an unfinished cycle drops its JoinSet, which aborts
            // every in-flight entity task.
            let cycle = tokio::select! {
                () = cancel.cancelled() => break,
                cycle = Self::execute_cycle(&collector, &model, &config) => cycle,
            };

            let delay = match cycle {
                Ok(_) => {
                    backoff.reset();
                    config.interval
                }
                Err(err) => {
                    let delay = backoff.next_delay();
                    warn!(
                        class = %class,
                        error = %err,
                        failures = backoff.failures(),
                        retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Listing failed, backing off"
                    );
                    delay
                }
            };

            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(delay) => {}
            }
        }

        debug!(class = %class, "Collection loop cancelled");
    }

    async fn execute_cycle(
        collector: &Arc<C>,
        model: &Arc<MetricModel>,
        config: &SchedulerConfig,
    ) -> CollectResult<CycleReport> {
        let class = collector.class();
        let started = Instant::now();

        let handles = match collector.list().await {
            Ok(handles) => handles,
            Err(err) => {
                record_error(model, class, ErrorScope::Listing);
                return Err(err);
            }
        };

        let mut report = CycleReport { listed: handles.len(), ..CycleReport::default() };
        let permits = config.max_concurrency.map(|limit| Arc::new(Semaphore::new(limit)));

        let mut tasks = JoinSet::new();
        for handle in handles {
            let collector = Arc::clone(collector);
            let permits = permits.clone();
            let entity_timeout = config.entity_timeout;

            tasks.spawn(async move {
                let _permit = match permits {
                    Some(permits) => permits.acquire_owned().await.ok(),
                    None => None,
                };

                let collection = collector.collect(handle);
                let result = match entity_timeout {
                    Some(limit) => match tokio::time::timeout(limit, collection).await {
                        Ok(result) => result,
                        Err(_) => return EntityOutcome::TimedOut,
                    },
                    None => collection.await,
                };

                match result {
                    Ok(()) => EntityOutcome::Succeeded,
                    Err(err) => EntityOutcome::Failed(err),
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(EntityOutcome::Succeeded) => report.succeeded += 1,
                Ok(EntityOutcome::Failed(err)) => {
                    warn!(class = %class, entity = %err.entity, error = %err.source, "Entity collection failed");
                    record_error(model, class, ErrorScope::Entity);
                    report.failed += 1;
                }
                Ok(EntityOutcome::TimedOut) => {
                    warn!(
                        class = %class,
                        timeout_secs = entity_timeout_secs(config),
                        "Entity collection timed out"
                    );
                    record_error(model, class, ErrorScope::Timeout);
                    report.timed_out += 1;
                }
                Err(join_err) => {
                    warn!(class = %class, error = %join_err, "Entity collection task panicked");
                    record_error(model, class, ErrorScope::Entity);
                    report.failed += 1;
                }
            }
        }

        report.duration = started.elapsed();
        record_cycle(model, class, &report);
        debug!(
            class = %class,
            listed = report.listed,
            succeeded = report.succeeded,
            failed = report.failed,
            timed_out = report.timed_out,
            duration_ms = u64::try_from(report.duration.as_millis()).unwrap_or(u64::MAX),
            "Collection cycle completed"
        );

        Ok(report)
    }
}

fn entity_timeout_secs(config: &SchedulerConfig) -> u64 {
    config.entity_timeout.map_or(0, |timeout| timeout.as_secs())
}

impl<C: EntityCollector> Drop for CollectionScheduler<C> {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("CollectionScheduler dropped while running; cancelling tasks");
            self.cancellation.cancel();
        }
    }
}
