//! Startup and orchestration error classification.

use thiserror::Error;

/// Errors that can stop the coordinator before or during a run.
///
/// Bootstrap and populate failures are fatal by design (§ failure semantics):
/// no workers are launched unless both steps succeed.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("failed to bootstrap store schema: {0}")]
    Bootstrap(#[source] anyhow::Error),

    #[error("failed to discover upstream max item id: {0}")]
    Discovery(#[source] hn_crawl_client::UpstreamError),

    #[error("failed to populate chunk queue: {0}")]
    Populate(#[source] hn_crawl_store::DatabaseError),

    #[error("failed to reclaim stale chunks: {0}")]
    Reclaim(#[source] hn_crawl_store::DatabaseError),
}

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;
