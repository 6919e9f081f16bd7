//! One-time chunk-range computation and queue population.

use crate::error::{CoordinatorError, CoordinatorResult};
use hn_crawl_client::UpstreamClient;
use hn_crawl_store::ChunkQueue;
use std::sync::Arc;
use tracing::info;

/// Partition `[1, max_id]` into contiguous, non-overlapping ranges of at most
/// `chunk_size` ids each. The final range may be shorter.
///
/// Pure and total: `max_id <= 0` or `chunk_size <= 0` yields no ranges.
pub fn compute_chunk_ranges(max_id: i64, chunk_size: i64) -> Vec<(i64, i64)> {
    if max_id <= 0 || chunk_size <= 0 {
        return Vec::new();
    }

    let mut ranges =
        Vec::with_capacity((((max_id + chunk_size - 1) / chunk_size).max(1)) as usize);
    let mut start = 1;
    while start <= max_id {
        let end = (start + chunk_size - 1).min(max_id);
        ranges.push((start, end));
        start = end + 1;
    }
    ranges
}

/// Populate the chunk queue from the upstream's current max id, but only if
/// the queue is empty. Repeated coordinator launches are therefore idempotent
/// with respect to chunk population.
pub async fn populate_if_empty(
    queue: &Arc<dyn ChunkQueue>,
    upstream: &Arc<dyn UpstreamClient>,
    chunk_size: i64,
) -> CoordinatorResult<()> {
    let total = queue.total_chunks().await.map_err(CoordinatorError::Populate)?;
    if total > 0 {
        info!(total_chunks = total, "chunk queue already populated, skipping");
        return Ok(());
    }

    let max_id = upstream
        .max_item_id()
        .await
        .map_err(CoordinatorError::Discovery)?;

    let ranges = compute_chunk_ranges(max_id, chunk_size);
    info!(max_id, chunk_count = ranges.len(), chunk_size, "populating chunk queue");

    queue
        .enqueue_chunks(ranges)
        .await
        .map_err(CoordinatorError::Populate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hn_crawl_client::FakeUpstreamClient;
    use hn_crawl_store::MockChunkQueue;

    #[test]
    fn ranges_cover_without_overlap() {
        let ranges = compute_chunk_ranges(2501, 1000);
        assert_eq!(ranges, vec![(1, 1000), (1001, 2000), (2001, 2501)]);
    }

    #[test]
    fn exact_multiple_has_no_short_final_range() {
        let ranges = compute_chunk_ranges(3000, 1000);
        assert_eq!(ranges, vec![(1, 1000), (1001, 2000), (2001, 3000)]);
    }

    #[test]
    fn non_positive_max_id_yields_no_ranges() {
        assert!(compute_chunk_ranges(0, 1000).is_empty());
        assert!(compute_chunk_ranges(-5, 1000).is_empty());
    }

    #[tokio::test]
    async fn populate_is_a_no_op_when_queue_already_has_chunks() {
        let queue: Arc<dyn ChunkQueue> = Arc::new(MockChunkQueue::new());
        queue.enqueue_chunks(vec![(1, 10)]).await.unwrap();
        let upstream: Arc<dyn UpstreamClient> = Arc::new(FakeUpstreamClient::new(9999));

        populate_if_empty(&queue, &upstream, 1000).await.unwrap();

        assert_eq!(queue.total_chunks().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn populate_fills_empty_queue_from_discovered_max_id() {
        let queue: Arc<dyn ChunkQueue> = Arc::new(MockChunkQueue::new());
        let upstream: Arc<dyn UpstreamClient> = Arc::new(FakeUpstreamClient::new(2500));

        populate_if_empty(&queue, &upstream, 1000).await.unwrap();

        assert_eq!(queue.total_chunks().await.unwrap(), 3);
    }
}
