//! End-to-end crawl scenarios against the in-memory store and upstream doubles.
//!
//! No live `PostgreSQL` instance is available to this test binary, so these
//! exercise the full coordinator/worker contract against `MockChunkQueue` and
//! `FakeUpstreamClient`, which implement the same atomic claim/complete/reclaim
//! semantics the `PostgreSQL`-backed types do.

use hn_crawl_client::{FakeUpstreamClient, RawItem, UpstreamClient};
use hn_crawl_config::CrawlConfig;
use hn_crawl_coordinator::Coordinator;
use hn_crawl_store::{ChunkQueue, ItemStore, MockChunkQueue, MockItemStore};
use std::sync::Arc;

fn config(num_workers: usize, chunk_size: i64, concurrent_requests: usize) -> CrawlConfig {
    let mut config = CrawlConfig::from_env();
    config.coordinator.num_workers = num_workers;
    config.coordinator.chunk_size = chunk_size;
    config.coordinator.monitor_interval_seconds = 1;
    config.worker.concurrent_requests = concurrent_requests;
    config.worker.batch_size = 4;
    config
}

/// S1: a mix of stories, one null, and a run of errors. Only the stories land
/// in the store; every chunk still reaches `completed`.
#[tokio::test]
async fn mixed_responses_complete_every_chunk_and_store_only_successes() {
    let queue: Arc<dyn ChunkQueue> = Arc::new(MockChunkQueue::new());
    let items: Arc<MockItemStore> = Arc::new(MockItemStore::new());

    let mut fake = FakeUpstreamClient::new(10);
    for id in 1..=5 {
        fake = fake.with_item(
            id,
            RawItem {
                id,
                item_type: Some("story".to_string()),
                ..Default::default()
            },
        );
    }
    fake = fake.with_null(6);
    for id in 7..=10 {
        fake = fake.with_error(id);
    }
    let upstream: Arc<dyn UpstreamClient> = Arc::new(fake);

    let coordinator = Coordinator::new(queue.clone(), items.clone() as Arc<dyn ItemStore>, upstream, config(2, 3, 8));
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.chunks_completed, 4);
    let depth = queue.queue_depth().await.unwrap();
    assert_eq!(depth.completed, 4);
    assert_eq!(depth.pending, 0);
    assert_eq!(depth.in_progress, 0);

    assert_eq!(items.len(), 5);
    for id in 1..=5 {
        assert!(items.contains(id));
    }
    for id in 6..=10 {
        assert!(!items.contains(id));
    }
}

/// S4: a claimed chunk goes stale mid-flight; reclaiming it and re-running the
/// worker pool finishes the crawl with the same final item set as an
/// uninterrupted run.
#[tokio::test]
async fn stale_claim_is_reclaimed_and_eventually_completed() {
    let queue = Arc::new(MockChunkQueue::new());
    let items: Arc<MockItemStore> = Arc::new(MockItemStore::new());
    queue.enqueue_chunks(vec![(1, 5)]).await.unwrap();

    let claimed = queue.claim_chunk(0).await.unwrap().unwrap();
    queue.force_stale(claimed.id);

    let reclaimed = queue.reclaim_stale(900).await.unwrap();
    assert_eq!(reclaimed, 1);
    assert_eq!(queue.queue_depth().await.unwrap().pending, 1);

    let queue: Arc<dyn ChunkQueue> = queue;
    let mut fake = FakeUpstreamClient::new(5);
    for id in 1..=5 {
        fake = fake.with_item(
            id,
            RawItem {
                id,
                ..Default::default()
            },
        );
    }
    let upstream: Arc<dyn UpstreamClient> = Arc::new(fake);

    let coordinator = Coordinator::new(queue.clone(), items.clone() as Arc<dyn ItemStore>, upstream, config(1, 5, 8));
    // reclaim already ran above; this run should not re-reclaim (nothing is
    // stale any more) and should simply drain the re-pending chunk.
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.chunks_completed, 1);
    assert_eq!(queue.queue_depth().await.unwrap().completed, 1);
    assert_eq!(items.len(), 5);
}

/// S6: populating twice with the same discovered max id never duplicates
/// chunk rows or introduces gaps.
#[tokio::test]
async fn repeated_population_is_idempotent() {
    let queue: Arc<dyn ChunkQueue> = Arc::new(MockChunkQueue::new());
    let upstream: Arc<dyn UpstreamClient> = Arc::new(FakeUpstreamClient::new(2500));

    hn_crawl_coordinator::populate_if_empty(&queue, &upstream, 1000)
        .await
        .unwrap();
    let first_total = queue.total_chunks().await.unwrap();

    hn_crawl_coordinator::populate_if_empty(&queue, &upstream, 1000)
        .await
        .unwrap();
    let second_total = queue.total_chunks().await.unwrap();

    assert_eq!(first_total, 3);
    assert_eq!(first_total, second_total);
}
