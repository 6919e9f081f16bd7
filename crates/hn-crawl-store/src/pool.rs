//! Database connection pool management.

use anyhow::{Context, Result};
use hn_crawl_config::DatabaseConfig;
use sqlx::PgPool;

/// Create a database connection pool.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection parameters are invalid
/// - Database server is unreachable or refuses connections
/// - Authentication credentials are invalid
/// - Connection timeout is exceeded
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    config
        .create_pool()
        .await
        .context("failed to create database pool")
}

/// Create a pool and run migrations, returning a ready-to-use store handle.
///
/// # Errors
///
/// Returns an error if pool creation or migration fails.
pub async fn initialize_store(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = create_pool(config).await?;

    crate::migrations::run_migrations(&pool)
        .await
        .context("failed to run database migrations")?;

    Ok(pool)
}
