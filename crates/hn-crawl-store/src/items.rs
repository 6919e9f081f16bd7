//! Bulk item upsert.

use crate::error::{DatabaseErrorExt, DatabaseOperation, DatabaseResult};
use crate::models::Item;
use async_trait::async_trait;
use sqlx::PgPool;

/// Storage for fetched items.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Insert a batch of items, ignoring any row whose `id` already exists.
    ///
    /// Built as a single `UNNEST`-based multi-row `INSERT` rather than a loop of
    /// per-row inserts, so replaying an already-stored chunk is a cheap no-op.
    async fn upsert_batch(&self, items: &[Item]) -> DatabaseResult<()>;
}

/// `PostgreSQL` implementation of `ItemStore`.
#[derive(Clone)]
pub struct PostgresItemStore {
    pool: PgPool,
}

impl PostgresItemStore {
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemStore for PostgresItemStore {
    async fn upsert_batch(&self, items: &[Item]) -> DatabaseResult<()> {
        if items.is_empty() {
            return Ok(());
        }

        let operation = DatabaseOperation::UpsertBatch {
            count: items.len(),
        };

        let len = items.len();
        let mut ids = Vec::with_capacity(len);
        let mut item_types = Vec::with_capacity(len);
        let mut bys = Vec::with_capacity(len);
        let mut texts = Vec::with_capacity(len);
        let mut urls = Vec::with_capacity(len);
        let mut titles = Vec::with_capacity(len);
        let mut times = Vec::with_capacity(len);
        let mut parents = Vec::with_capacity(len);
        let mut descendants = Vec::with_capacity(len);
        let mut scores = Vec::with_capacity(len);
        let mut kids = Vec::with_capacity(len);
        let mut deleted = Vec::with_capacity(len);
        let mut dead = Vec::with_capacity(len);

        for item in items {
            ids.push(item.id);
            item_types.push(item.item_type.clone());
            bys.push(item.by.clone());
            texts.push(item.text.clone());
            urls.push(item.url.clone());
            titles.push(item.title.clone());
            times.push(item.time);
            parents.push(item.parent);
            descendants.push(item.descendants);
            scores.push(item.score);
            kids.push(item.kids.clone());
            deleted.push(item.deleted);
            dead.push(item.dead);
        }

        sqlx::query(
            r"
            INSERT INTO items (
                id, item_type, by, text, url, title, time, parent,
                descendants, score, kids, deleted, dead
            )
            SELECT
                unnest($1::bigint[]),
                unnest($2::text[]),
                unnest($3::text[]),
                unnest($4::text[]),
                unnest($5::text[]),
                unnest($6::text[]),
                unnest($7::bigint[]),
                unnest($8::bigint[]),
                unnest($9::int[]),
                unnest($10::int[]),
                unnest($11::jsonb[]),
                unnest($12::bool[]),
                unnest($13::bool[])
            ON CONFLICT (id) DO NOTHING
            ",
        )
        .bind(&ids)
        .bind(&item_types)
        .bind(&bys)
        .bind(&texts)
        .bind(&urls)
        .bind(&titles)
        .bind(&times)
        .bind(&parents)
        .bind(&descendants)
        .bind(&scores)
        .bind(&kids)
        .bind(&deleted)
        .bind(&dead)
        .execute(&self.pool)
        .await
        .map_db_err(operation)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockItemStore;

    fn item(id: i64) -> Item {
        Item {
            id,
            item_type: Some("story".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn upsert_batch_is_idempotent() {
        let store = MockItemStore::new();
        let batch = vec![item(1), item(2), item(3)];

        store.upsert_batch(&batch).await.unwrap();
        store.upsert_batch(&batch).await.unwrap();

        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let store = MockItemStore::new();
        store.upsert_batch(&[]).await.unwrap();
        assert_eq!(store.len(), 0);
    }
}
