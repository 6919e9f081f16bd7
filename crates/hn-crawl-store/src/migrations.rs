//! Database migration runner with advisory lock support.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};

/// Advisory lock ID for migrations (arbitrary but stable).
const MIGRATION_LOCK_ID: i64 = 4817;

/// Run all pending migrations with advisory locking.
///
/// # Errors
/// Returns an error if the advisory lock cannot be acquired or a migration fails to apply.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT pg_advisory_lock($1)")
        .bind(MIGRATION_LOCK_ID)
        .execute(pool)
        .await
        .context("failed to acquire migration lock")?;

    let result = run_migrations_inner(pool).await;

    sqlx::query("SELECT pg_advisory_unlock($1)")
        .bind(MIGRATION_LOCK_ID)
        .execute(pool)
        .await
        .context("failed to release migration lock")?;

    result
}

async fn run_migrations_inner(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TIMESTAMPTZ DEFAULT NOW()
        )
        ",
    )
    .execute(pool)
    .await
    .context("failed to create migrations table")?;

    let applied: Vec<i32> = sqlx::query("SELECT version FROM schema_migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .context("failed to fetch applied migrations")?
        .iter()
        .map(|row| row.get(0))
        .collect();

    let migrations: Vec<(i32, &str, &str)> = vec![
        (
            1,
            "initial_schema",
            include_str!("../migrations/001_initial_schema.sql"),
        ),
        (2, "indexes", include_str!("../migrations/002_indexes.sql")),
    ];

    for (version, name, sql) in migrations {
        if applied.contains(&version) {
            tracing::debug!(version, name, "migration already applied");
            continue;
        }

        tracing::info!(version, name, "applying migration");

        let mut tx = pool.begin().await.context("failed to start transaction")?;

        sqlx::query(sql)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to execute migration {version} ({name})"))?;

        sqlx::query("INSERT INTO schema_migrations (version, name) VALUES ($1, $2)")
            .bind(version)
            .bind(name)
            .execute(&mut *tx)
            .await
            .context("failed to record migration")?;

        tx.commit().await.context("failed to commit migration")?;

        tracing::info!(version, name, "migration applied");
    }

    Ok(())
}

/// Drop the crawler's tables and the migration ledger, forcing a clean rebuild on the next
/// `run_migrations` call. Used by `bootstrap(reset = true)`.
///
/// # Errors
/// Returns an error if the drop statements fail.
pub async fn reset_schema(pool: &PgPool) -> Result<()> {
    sqlx::query("DROP TABLE IF EXISTS job_chunks, items, schema_migrations")
        .execute(pool)
        .await
        .context("failed to drop existing schema")?;
    Ok(())
}
