//! Bootstrap, population, worker launch and progress monitoring.

use crate::error::{CoordinatorError, CoordinatorResult};
use crate::populate::populate_if_empty;
use hn_crawl_client::{HnApiClient, UpstreamClient};
use hn_crawl_config::CrawlConfig;
use hn_crawl_store::{ChunkQueue, ItemStore, PostgresChunkQueue, PostgresItemStore, migrations};
use hn_crawl_worker::{Worker, WorkerResult, WorkerSummary};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{error, info};

/// Final tally reported once every launched worker has exited.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
    pub chunks_completed: u64,
    pub workers_launched: usize,
}

/// Orchestrates one crawl run: bootstrap, stale reclamation, population,
/// worker launch, and progress monitoring.
///
/// Holds only cheaply-`Clone`d handles — the same queue, item store and
/// upstream client handles are cloned into every worker task. The coordinator
/// never routes work itself; it only observes the queue it populated.
pub struct Coordinator {
    queue: Arc<dyn ChunkQueue>,
    items: Arc<dyn ItemStore>,
    upstream: Arc<dyn UpstreamClient>,
    config: CrawlConfig,
}

impl Coordinator {
    pub fn new(
        queue: Arc<dyn ChunkQueue>,
        items: Arc<dyn ItemStore>,
        upstream: Arc<dyn UpstreamClient>,
        config: CrawlConfig,
    ) -> Self {
        Self {
            queue,
            items,
            upstream,
            config,
        }
    }

    /// Construct a coordinator wired to `PostgreSQL` and the real upstream
    /// client, bootstrapping the schema first. Returns the pool alongside the
    /// coordinator so callers can shut it down after the run completes.
    ///
    /// # Errors
    /// Returns an error if the pool cannot be created, migrations fail, or the
    /// upstream HTTP client cannot be constructed.
    pub async fn build(config: CrawlConfig) -> CoordinatorResult<(Self, PgPool)> {
        let pool = hn_crawl_store::create_pool(&config.database)
            .await
            .map_err(CoordinatorError::Bootstrap)?;

        Self::bootstrap(&pool, config.reset).await?;

        let queue: Arc<dyn ChunkQueue> = Arc::new(PostgresChunkQueue::new(pool.clone()));
        let items: Arc<dyn ItemStore> = Arc::new(PostgresItemStore::new(pool.clone()));
        let upstream: Arc<dyn UpstreamClient> = Arc::new(
            HnApiClient::new(
                config.worker.upstream_base_url.clone(),
                Duration::from_secs(config.worker.request_timeout_seconds),
            )
            .map_err(|e| CoordinatorError::Bootstrap(anyhow::Error::from(e)))?,
        );

        Ok((Self::new(queue, items, upstream, config), pool))
    }

    /// Ensure the schema exists, destroying prior state first when `reset` is set.
    ///
    /// # Errors
    /// Returns an error if the reset or migration step fails.
    pub async fn bootstrap(pool: &PgPool, reset: bool) -> CoordinatorResult<()> {
        if reset {
            migrations::reset_schema(pool)
                .await
                .map_err(CoordinatorError::Bootstrap)?;
        }
        hn_crawl_store::run_migrations(pool)
            .await
            .map_err(CoordinatorError::Bootstrap)
    }

    /// Reset every stale `in_progress` chunk back to `pending`.
    ///
    /// # Errors
    /// Returns an error if the underlying store update fails.
    pub async fn reclaim_stale(&self) -> CoordinatorResult<u64> {
        let reclaimed = self
            .queue
            .reclaim_stale(i64::try_from(self.config.coordinator.stale_timeout_seconds).unwrap_or(i64::MAX))
            .await
            .map_err(CoordinatorError::Reclaim)?;
        if reclaimed > 0 {
            info!(reclaimed, "reclaimed stale chunks");
        }
        Ok(reclaimed)
    }

    /// Populate the chunk queue from the upstream's current max id, a no-op if
    /// the queue already has rows.
    ///
    /// # Errors
    /// Returns an error if upstream discovery or the enqueue fails.
    pub async fn populate_if_empty(&self) -> CoordinatorResult<()> {
        populate_if_empty(&self.queue, &self.upstream, self.config.coordinator.chunk_size).await
    }

    /// Spawn `num_workers` independent worker tasks, each with a distinct id.
    pub fn launch_workers(&self) -> JoinSet<WorkerResult<WorkerSummary>> {
        let mut set = JoinSet::new();
        for worker_id in 0..self.config.coordinator.num_workers {
            let worker = Worker::new(
                i32::try_from(worker_id).unwrap_or(i32::MAX),
                Arc::clone(&self.queue),
                Arc::clone(&self.items),
                Arc::clone(&self.upstream),
                self.config.worker.concurrent_requests,
                self.config.worker.batch_size,
            );
            set.spawn(async move { worker.run().await });
        }
        set
    }

    /// Poll queue depth on `monitor_interval_seconds` and log progress until
    /// every worker in `workers` has exited. Worker panics and store errors
    /// are logged here, not propagated — they have already ended that worker's
    /// task, and its chunk (if any) is left for stale reclamation.
    pub async fn monitor(&self, mut workers: JoinSet<WorkerResult<WorkerSummary>>) -> RunSummary {
        let interval = Duration::from_secs(self.config.coordinator.monitor_interval_seconds);
        let workers_launched = self.config.coordinator.num_workers;
        let mut chunks_completed = 0u64;

        while !workers.is_empty() {
            tokio::select! {
                result = workers.join_next() => {
                    match result {
                        Some(Ok(Ok(summary))) => chunks_completed += summary.chunks_completed,
                        Some(Ok(Err(e))) => error!(error = %e, "worker exited with a store error"),
                        Some(Err(e)) => error!(error = %e, "worker task panicked"),
                        None => {}
                    }
                }
                () = tokio::time::sleep(interval) => {
                    match self.queue.queue_depth().await {
                        Ok(depth) => {
                            let total = depth.total();
                            #[allow(clippy::cast_precision_loss)]
                            let pct = if total == 0 {
                                0.0
                            } else {
                                (depth.completed as f64 / total as f64) * 100.0
                            };
                            info!(completed = depth.completed, total, pct, "crawl progress");
                        }
                        Err(e) => error!(error = %e, "failed to read queue depth"),
                    }
                }
            }
        }

        RunSummary {
            chunks_completed,
            workers_launched,
        }
    }

    /// Run one full crawl: reclaim stale chunks (skipped after a reset, since
    /// there is nothing to reclaim), populate if needed, launch workers, and
    /// monitor until they all exit.
    ///
    /// # Errors
    /// Returns an error if stale reclamation or population fails — both are
    /// fatal and leave no workers launched.
    pub async fn run(&self) -> CoordinatorResult<RunSummary> {
        if !self.config.reset {
            self.reclaim_stale().await?;
        }
        self.populate_if_empty().await?;
        let workers = self.launch_workers();
        Ok(self.monitor(workers).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hn_crawl_client::{FakeUpstreamClient, RawItem};
    use hn_crawl_store::{MockChunkQueue, MockItemStore};

    fn config(num_workers: usize, chunk_size: i64) -> CrawlConfig {
        let mut config = CrawlConfig::from_env();
        config.coordinator.num_workers = num_workers;
        config.coordinator.chunk_size = chunk_size;
        config.coordinator.monitor_interval_seconds = 1;
        config.worker.concurrent_requests = 8;
        config.worker.batch_size = 4;
        config
    }

    #[tokio::test]
    async fn run_populates_processes_and_reports_completion() {
        let queue: Arc<dyn ChunkQueue> = Arc::new(MockChunkQueue::new());
        let items: Arc<dyn ItemStore> = Arc::new(MockItemStore::new());

        let mut fake = FakeUpstreamClient::new(10);
        for id in 1..=10 {
            fake = fake.with_item(
                id,
                RawItem {
                    id,
                    ..Default::default()
                },
            );
        }
        let upstream: Arc<dyn UpstreamClient> = Arc::new(fake);

        let coordinator = Coordinator::new(queue.clone(), items.clone(), upstream, config(2, 5));
        let summary = coordinator.run().await.unwrap();

        assert_eq!(summary.workers_launched, 2);
        assert_eq!(summary.chunks_completed, 2);
        assert_eq!(queue.queue_depth().await.unwrap().completed, 2);
    }

    #[tokio::test]
    async fn monitor_returns_immediately_with_zero_workers() {
        let queue: Arc<dyn ChunkQueue> = Arc::new(MockChunkQueue::new());
        let items: Arc<dyn ItemStore> = Arc::new(MockItemStore::new());
        let upstream: Arc<dyn UpstreamClient> = Arc::new(FakeUpstreamClient::new(0));

        let coordinator = Coordinator::new(queue, items, upstream, config(0, 5));
        let workers = coordinator.launch_workers();
        let summary = coordinator.monitor(workers).await;

        assert_eq!(summary.workers_launched, 0);
        assert_eq!(summary.chunks_completed, 0);
    }

    #[tokio::test]
    async fn reclaim_stale_reports_zero_on_an_empty_queue() {
        let queue: Arc<dyn ChunkQueue> = Arc::new(MockChunkQueue::new());
        let items: Arc<dyn ItemStore> = Arc::new(MockItemStore::new());
        let upstream: Arc<dyn UpstreamClient> = Arc::new(FakeUpstreamClient::new(0));

        let coordinator = Coordinator::new(queue, items, upstream, config(1, 5));
        assert_eq!(coordinator.reclaim_stale().await.unwrap(), 0);
    }
}
