//! PostgreSQL-backed chunk job queue.
//!
//! Implements a persistent, distributed chunk queue using the `SKIP LOCKED` pattern
//! for concurrent worker claims. The queue lives in the same transactional store as
//! the items it produces, so no external broker or lock service is needed.

use crate::error::{DatabaseErrorExt, DatabaseOperation, DatabaseResult};
use crate::models::Chunk;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};

/// Chunk queue operations backing the coordinator/worker protocol.
#[async_trait]
pub trait ChunkQueue: Send + Sync {
    /// Insert one chunk row per `[start_id, end_id]` range. Only called when the
    /// queue is empty; callers are responsible for that check (`populate_if_empty`).
    async fn enqueue_chunks(&self, ranges: Vec<(i64, i64)>) -> DatabaseResult<()>;

    /// Atomically claim the earliest pending chunk for `worker_id`.
    ///
    /// Uses `FOR UPDATE SKIP LOCKED` so concurrent claimers never block each other
    /// or observe the same row.
    async fn claim_chunk(&self, worker_id: i32) -> DatabaseResult<Option<Chunk>>;

    /// Mark a chunk completed.
    async fn complete_chunk(&self, chunk_id: i64) -> DatabaseResult<()>;

    /// Return all `in_progress` chunks whose `updated_at` is older than `stale_timeout_secs`
    /// back to `pending`, clearing their `worker_id`. Returns the number of chunks reclaimed.
    async fn reclaim_stale(&self, stale_timeout_secs: i64) -> DatabaseResult<u64>;

    /// Total number of chunk rows currently queued (any status). Used to decide whether
    /// `populate_if_empty` needs to run.
    async fn total_chunks(&self) -> DatabaseResult<i64>;

    /// Queue depth broken down by status, for progress reporting.
    async fn queue_depth(&self) -> DatabaseResult<QueueDepth>;
}

/// Snapshot of chunk counts per status, used by the coordinator's monitor loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueDepth {
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
}

impl QueueDepth {
    pub const fn total(&self) -> i64 {
        self.pending + self.in_progress + self.completed
    }
}

/// `PostgreSQL` implementation of the chunk queue.
#[derive(Clone)]
pub struct PostgresChunkQueue {
    pool: PgPool,
}

impl PostgresChunkQueue {
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChunkQueue for PostgresChunkQueue {
    async fn enqueue_chunks(&self, ranges: Vec<(i64, i64)>) -> DatabaseResult<()> {
        if ranges.is_empty() {
            return Ok(());
        }

        let operation = DatabaseOperation::Populate {
            chunk_count: ranges.len(),
        };

        let starts: Vec<i64> = ranges.iter().map(|(s, _)| *s).collect();
        let ends: Vec<i64> = ranges.iter().map(|(_, e)| *e).collect();

        sqlx::query(
            r"
            INSERT INTO job_chunks (start_id, end_id, status)
            SELECT unnest($1::bigint[]), unnest($2::bigint[]), 'pending'
            ",
        )
        .bind(&starts)
        .bind(&ends)
        .execute(&self.pool)
        .await
        .map_db_err(operation)?;

        Ok(())
    }

    async fn claim_chunk(&self, worker_id: i32) -> DatabaseResult<Option<Chunk>> {
        let operation = DatabaseOperation::Claim { worker_id };
        let now = Utc::now();

        let chunk = sqlx::query_as::<_, Chunk>(
            r"
            WITH claimed AS (
                SELECT id
                FROM job_chunks
                WHERE status = 'pending'
                ORDER BY start_id
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            UPDATE job_chunks
            SET status = 'in_progress',
                worker_id = $1,
                updated_at = $2
            FROM claimed
            WHERE job_chunks.id = claimed.id
            RETURNING job_chunks.id,
                      job_chunks.start_id,
                      job_chunks.end_id,
                      job_chunks.status,
                      job_chunks.worker_id,
                      job_chunks.created_at,
                      job_chunks.updated_at
            ",
        )
        .bind(worker_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_db_err(operation)?;

        Ok(chunk)
    }

    async fn complete_chunk(&self, chunk_id: i64) -> DatabaseResult<()> {
        let operation = DatabaseOperation::Complete { chunk_id };

        sqlx::query(
            r"
            UPDATE job_chunks
            SET status = 'completed',
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(chunk_id)
        .execute(&self.pool)
        .await
        .map_db_err(operation)?;

        Ok(())
    }

    async fn reclaim_stale(&self, stale_timeout_secs: i64) -> DatabaseResult<u64> {
        let operation = DatabaseOperation::ReclaimStale;

        let result = sqlx::query(
            r"
            UPDATE job_chunks
            SET status = 'pending',
                worker_id = NULL
            WHERE status = 'in_progress'
              AND updated_at < NOW() - make_interval(secs => $1)
            ",
        )
        .bind(stale_timeout_secs as f64)
        .execute(&self.pool)
        .await
        .map_db_err(operation)?;

        Ok(result.rows_affected())
    }

    async fn total_chunks(&self) -> DatabaseResult<i64> {
        let operation = DatabaseOperation::Query {
            description: "total_chunks".to_string(),
        };

        let row = sqlx::query("SELECT COUNT(*) AS count FROM job_chunks")
            .fetch_one(&self.pool)
            .await
            .map_db_err(operation)?;

        Ok(row.get("count"))
    }

    async fn queue_depth(&self) -> DatabaseResult<QueueDepth> {
        let operation = DatabaseOperation::QueueDepth;

        let row = sqlx::query(
            r"
            SELECT
                COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                COUNT(*) FILTER (WHERE status = 'in_progress') AS in_progress,
                COUNT(*) FILTER (WHERE status = 'completed') AS completed
            FROM job_chunks
            ",
        )
        .fetch_one(&self.pool)
        .await
        .map_db_err(operation)?;

        Ok(QueueDepth {
            pending: row.get("pending"),
            in_progress: row.get("in_progress"),
            completed: row.get("completed"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockChunkQueue;

    #[tokio::test]
    async fn enqueue_then_claim_returns_earliest_pending() {
        let queue = MockChunkQueue::new();
        queue
            .enqueue_chunks(vec![(1, 100), (101, 200), (201, 300)])
            .await
            .unwrap();

        let chunk = queue.claim_chunk(0).await.unwrap().unwrap();
        assert_eq!((chunk.start_id, chunk.end_id), (1, 100));
        assert_eq!(chunk.status(), crate::models::ChunkStatus::InProgress);
    }

    #[tokio::test]
    async fn concurrent_claims_never_overlap() {
        let queue = MockChunkQueue::new();
        queue
            .enqueue_chunks(vec![(1, 100), (101, 200)])
            .await
            .unwrap();

        let c1 = queue.claim_chunk(0).await.unwrap().unwrap();
        let c2 = queue.claim_chunk(1).await.unwrap().unwrap();
        assert_ne!(c1.id, c2.id);

        assert!(queue.claim_chunk(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn complete_then_reclaim_never_resets_completed() {
        let queue = MockChunkQueue::new();
        queue.enqueue_chunks(vec![(1, 100)]).await.unwrap();
        let chunk = queue.claim_chunk(0).await.unwrap().unwrap();
        queue.complete_chunk(chunk.id).await.unwrap();

        let reclaimed = queue.reclaim_stale(0).await.unwrap();
        assert_eq!(reclaimed, 0);

        let depth = queue.queue_depth().await.unwrap();
        assert_eq!(depth.completed, 1);
        assert_eq!(depth.pending, 0);
    }

    #[tokio::test]
    async fn stale_in_progress_chunk_is_reclaimed_to_pending() {
        let queue = MockChunkQueue::new();
        queue.enqueue_chunks(vec![(1, 100)]).await.unwrap();
        let chunk = queue.claim_chunk(0).await.unwrap().unwrap();
        queue.force_stale(chunk.id);

        let reclaimed = queue.reclaim_stale(900).await.unwrap();
        assert_eq!(reclaimed, 1);

        let depth = queue.queue_depth().await.unwrap();
        assert_eq!(depth.pending, 1);
        assert_eq!(depth.in_progress, 0);
    }

    #[tokio::test]
    async fn queue_depth_tracks_all_three_states() {
        let queue = MockChunkQueue::new();
        queue
            .enqueue_chunks(vec![(1, 10), (11, 20), (21, 30)])
            .await
            .unwrap();

        let claimed = queue.claim_chunk(0).await.unwrap().unwrap();
        queue.claim_chunk(1).await.unwrap().unwrap();
        queue.complete_chunk(claimed.id).await.unwrap();

        let depth = queue.queue_depth().await.unwrap();
        assert_eq!(depth.pending, 1);
        assert_eq!(depth.in_progress, 1);
        assert_eq!(depth.completed, 1);
        assert_eq!(depth.total(), 3);
    }
}
