//! In-memory test doubles for `ChunkQueue` and `ItemStore`.

use crate::chunk_queue::{ChunkQueue, QueueDepth};
use crate::error::DatabaseResult;
use crate::items::ItemStore;
use crate::models::{Chunk, ChunkStatus, Item};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex};

/// In-memory `ChunkQueue` double backed by a `Vec` guarded by a `Mutex`.
#[derive(Clone, Default)]
pub struct MockChunkQueue {
    chunks: Arc<Mutex<Vec<Chunk>>>,
}

impl MockChunkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force a claimed chunk's `updated_at` far enough into the past to be
    /// eligible for `reclaim_stale`. Test-only helper; no production equivalent
    /// needed since real staleness comes from wall-clock drift.
    pub fn force_stale(&self, chunk_id: i64) {
        let mut chunks = self.chunks.lock().unwrap();
        if let Some(chunk) = chunks.iter_mut().find(|c| c.id == chunk_id) {
            chunk.updated_at = Utc::now() - chrono::Duration::hours(1);
        }
    }
}

#[async_trait]
impl ChunkQueue for MockChunkQueue {
    async fn enqueue_chunks(&self, ranges: Vec<(i64, i64)>) -> DatabaseResult<()> {
        let mut chunks = self.chunks.lock().unwrap();
        let mut next_id = chunks.iter().map(|c| c.id).max().unwrap_or(0);
        let now = Utc::now();
        for (start_id, end_id) in ranges {
            next_id += 1;
            chunks.push(Chunk {
                id: next_id,
                start_id,
                end_id,
                status: ChunkStatus::Pending.to_string(),
                worker_id: None,
                created_at: now,
                updated_at: now,
            });
        }
        Ok(())
    }

    async fn claim_chunk(&self, worker_id: i32) -> DatabaseResult<Option<Chunk>> {
        let mut chunks = self.chunks.lock().unwrap();
        let mut candidates: Vec<usize> = chunks
            .iter()
            .enumerate()
            .filter(|(_, c)| c.status() == ChunkStatus::Pending)
            .map(|(i, _)| i)
            .collect();
        candidates.sort_by_key(|&i| chunks[i].start_id);

        let Some(&idx) = candidates.first() else {
            return Ok(None);
        };

        let chunk = &mut chunks[idx];
        chunk.status = ChunkStatus::InProgress.to_string();
        chunk.worker_id = Some(worker_id);
        chunk.updated_at = Utc::now();
        Ok(Some(chunk.clone()))
    }

    async fn complete_chunk(&self, chunk_id: i64) -> DatabaseResult<()> {
        let mut chunks = self.chunks.lock().unwrap();
        if let Some(chunk) = chunks.iter_mut().find(|c| c.id == chunk_id) {
            chunk.status = ChunkStatus::Completed.to_string();
            chunk.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn reclaim_stale(&self, stale_timeout_secs: i64) -> DatabaseResult<u64> {
        let mut chunks = self.chunks.lock().unwrap();
        let threshold = Utc::now() - chrono::Duration::seconds(stale_timeout_secs);
        let mut reclaimed = 0u64;
        for chunk in chunks.iter_mut() {
            if chunk.status() == ChunkStatus::InProgress && chunk.updated_at < threshold {
                chunk.status = ChunkStatus::Pending.to_string();
                chunk.worker_id = None;
                reclaimed += 1;
            }
        }
        Ok(reclaimed)
    }

    async fn total_chunks(&self) -> DatabaseResult<i64> {
        let chunks = self.chunks.lock().unwrap();
        Ok(chunks.len() as i64)
    }

    async fn queue_depth(&self) -> DatabaseResult<QueueDepth> {
        let chunks = self.chunks.lock().unwrap();
        let pending = chunks
            .iter()
            .filter(|c| c.status() == ChunkStatus::Pending)
            .count() as i64;
        let in_progress = chunks
            .iter()
            .filter(|c| c.status() == ChunkStatus::InProgress)
            .count() as i64;
        let completed = chunks
            .iter()
            .filter(|c| c.status() == ChunkStatus::Completed)
            .count() as i64;
        Ok(QueueDepth {
            pending,
            in_progress,
            completed,
        })
    }
}

/// In-memory `ItemStore` double backed by a `HashMap`, preserving the
/// `ON CONFLICT DO NOTHING` semantics of the real upsert.
#[derive(Clone, Default)]
pub struct MockItemStore {
    items: Arc<Mutex<std::collections::HashMap<i64, Item>>>,
}

impl MockItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: i64) -> bool {
        self.items.lock().unwrap().contains_key(&id)
    }
}

#[async_trait]
impl ItemStore for MockItemStore {
    async fn upsert_batch(&self, items: &[Item]) -> DatabaseResult<()> {
        let mut store = self.items.lock().unwrap();
        for item in items {
            store.entry(item.id).or_insert_with(|| item.clone());
        }
        Ok(())
    }
}
