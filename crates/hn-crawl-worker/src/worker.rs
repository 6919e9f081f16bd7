//! Claim-fetch-upsert-complete pipeline for a single worker task.

use crate::error::{WorkerError, WorkerOperation, WorkerResult};
use futures::stream::{self, StreamExt};
use hn_crawl_client::{RawItem, UpstreamClient};
use hn_crawl_store::{ChunkQueue, Item, ItemStore};
use std::sync::Arc;
use tracing::{debug, info, warn};

fn raw_item_to_item(raw: RawItem) -> Item {
    Item {
        id: raw.id,
        item_type: raw.item_type,
        by: raw.by,
        text: raw.text,
        url: raw.url,
        title: raw.title,
        time: raw.time,
        parent: raw.parent,
        descendants: raw.descendants,
        score: raw.score,
        kids: raw.kids,
        deleted: raw.deleted,
        dead: raw.dead,
    }
}

/// Outcome of a worker's run, reported back to the coordinator for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkerSummary {
    pub chunks_completed: u64,
}

/// One claim-fetch-upsert-complete loop, bound to a distinct `worker_id`.
///
/// Holds no resources exclusively: the queue, item store and upstream client
/// are all cheaply-cloned handles shared with every other worker in the pool.
pub struct Worker {
    id: i32,
    queue: Arc<dyn ChunkQueue>,
    items: Arc<dyn ItemStore>,
    upstream: Arc<dyn UpstreamClient>,
    concurrent_requests: usize,
    batch_size: usize,
}

impl Worker {
    pub fn new(
        id: i32,
        queue: Arc<dyn ChunkQueue>,
        items: Arc<dyn ItemStore>,
        upstream: Arc<dyn UpstreamClient>,
        concurrent_requests: usize,
        batch_size: usize,
    ) -> Self {
        Self {
            id,
            queue,
            items,
            upstream,
            concurrent_requests,
            batch_size,
        }
    }

    /// Run until the queue reports no pending chunks, then return cleanly.
    ///
    /// Claim and complete failures are store-fatal and propagate: the caller
    /// (coordinator) is expected to let the task end and rely on stale
    /// reclamation to recover the chunk this worker was holding, if any.
    pub async fn run(&self) -> WorkerResult<WorkerSummary> {
        let mut chunks_completed = 0u64;

        loop {
            let claimed = self
                .queue
                .claim_chunk(self.id)
                .await
                .map_err(|source| WorkerError::Store {
                    operation: WorkerOperation::Claim,
                    source,
                })?;

            let Some(chunk) = claimed else {
                break;
            };

            info!(
                worker_id = self.id,
                chunk_id = chunk.id,
                start_id = chunk.start_id,
                end_id = chunk.end_id,
                "claimed chunk"
            );

            self.process_chunk(chunk.id, chunk.start_id, chunk.end_id)
                .await?;
            chunks_completed += 1;
        }

        info!(
            worker_id = self.id,
            chunks_completed, "worker exiting, no pending chunks"
        );
        Ok(WorkerSummary { chunks_completed })
    }

    /// Fetch every id in `[start_id, end_id]` with bounded concurrency, flushing
    /// accumulated items in batches, then mark the chunk completed.
    #[tracing::instrument(skip(self), fields(worker_id = self.id, chunk_id))]
    async fn process_chunk(&self, chunk_id: i64, start_id: i64, end_id: i64) -> WorkerResult<()> {
        let mut fetches = stream::iter(start_id..=end_id)
            .map(|id| self.fetch_one(id))
            .buffer_unordered(self.concurrent_requests);

        let mut batch = Vec::with_capacity(self.batch_size);
        while let Some(fetched) = fetches.next().await {
            if let Some(item) = fetched {
                batch.push(item);
            }
            if batch.len() >= self.batch_size {
                self.flush(chunk_id, &mut batch).await;
            }
        }
        if !batch.is_empty() {
            self.flush(chunk_id, &mut batch).await;
        }

        self.queue
            .complete_chunk(chunk_id)
            .await
            .map_err(|source| WorkerError::Store {
                operation: WorkerOperation::Complete { chunk_id },
                source,
            })?;

        debug!(worker_id = self.id, chunk_id, "chunk completed");
        Ok(())
    }

    /// Fetch one item, swallowing any transport/parse failure as "no result".
    ///
    /// A confirmed absence (404 or JSON `null`) and a genuine transport error
    /// are both folded into `None` here — the pipeline treats them identically
    /// even though `UpstreamClient` itself still distinguishes them.
    async fn fetch_one(&self, id: i64) -> Option<Item> {
        match self.upstream.fetch_item(id).await {
            Ok(Some(raw)) => Some(raw_item_to_item(raw)),
            Ok(None) => None,
            Err(e) => {
                warn!(worker_id = self.id, item_id = id, error = %e, "fetch failed, skipping id");
                None
            }
        }
    }

    /// Flush a batch via one multi-row upsert. Failures abort this batch only;
    /// the worker carries on with the next one (the chunk's remaining range
    /// still completes, and a reclaim-and-rerun would recover the lost rows).
    async fn flush(&self, chunk_id: i64, batch: &mut Vec<Item>) {
        if batch.is_empty() {
            return;
        }
        if let Err(e) = self.items.upsert_batch(batch).await {
            warn!(
                worker_id = self.id,
                chunk_id,
                batch_len = batch.len(),
                error = %e,
                "batch flush failed, ids lost for this chunk run"
            );
        }
        batch.clear();
    }
}
