//! Run database migrations against the configured store.
//!
//! Usage: cargo run --example `run_migrations`

use hn_crawl_config::CrawlConfig;
use hn_crawl_store::initialize_store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CrawlConfig::from_env();

    println!(
        "Setting up database at: {}",
        config.database.safe_connection_string()
    );

    let pool = initialize_store(&config.database).await?;

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT table_name FROM information_schema.tables
         WHERE table_schema = 'public'
         ORDER BY table_name",
    )
    .fetch_all(&pool)
    .await?;

    println!("\nCreated tables:");
    for table in tables {
        println!("  - {table}");
    }

    Ok(())
}
