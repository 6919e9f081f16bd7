//! Entry point for the Hacker News crawl binary.
//!
//! Parses configuration, bootstraps the store, and runs one coordinator pass
//! to completion: reclaim stale chunks, populate the queue if empty, launch
//! the worker pool, and monitor until every worker has exited.

use anyhow::Context;
use clap::Parser;
use hn_crawl_config::CrawlConfig;
use hn_crawl_config::validation::Validate;
use hn_crawl_coordinator::{Coordinator, RunSummary};
use std::path::{Path, PathBuf};
use tracing::info;

/// Crawl every Hacker News item into a local store.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Destroy prior queue and item state before populating.
    #[arg(long)]
    reset_db: bool,

    /// Number of worker tasks to launch.
    #[arg(long)]
    num_workers: Option<usize>,

    /// Number of item ids covered by a single chunk.
    #[arg(long)]
    chunk_size: Option<i64>,

    /// Database connection string.
    #[arg(long)]
    database_url: Option<String>,

    /// Optional TOML config file. CLI flags above still take precedence.
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    hn_crawl_common::initialize_environment();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match run().await {
        Ok(summary) => {
            info!(
                chunks_completed = summary.chunks_completed,
                workers_launched = summary.workers_launched,
                "crawl finished"
            );
            std::process::ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = ?e, "crawl failed");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<RunSummary> {
    let args = Args::parse();
    let config = build_config(&args).context("invalid configuration")?;

    let (coordinator, pool) = Coordinator::build(config)
        .await
        .context("failed to bootstrap coordinator")?;

    let summary = coordinator.run().await.context("crawl run failed")?;
    pool.close().await;
    Ok(summary)
}

/// Layer config-file overrides (if given) and then CLI-flag overrides on top
/// of the environment-derived defaults, then validate the result.
fn build_config(args: &Args) -> anyhow::Result<CrawlConfig> {
    let mut config = match &args.config {
        Some(path) => load_config_file(path)?,
        None => CrawlConfig::from_env(),
    };

    if args.reset_db {
        config.reset = true;
    }
    if let Some(num_workers) = args.num_workers {
        config.coordinator.num_workers = num_workers;
    }
    if let Some(chunk_size) = args.chunk_size {
        config.coordinator.chunk_size = chunk_size;
    }
    if let Some(url) = &args.database_url {
        config.database.url.clone_from(url);
    }

    config.validate().context("configuration failed validation")?;
    Ok(config)
}

fn load_config_file(path: &Path) -> anyhow::Result<CrawlConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file '{}'", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file '{}'", path.display()))
}
