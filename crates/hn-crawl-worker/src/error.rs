//! Worker-loop error classification.

use thiserror::Error;

/// What the worker was doing when a fatal error occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerOperation {
    Claim,
    Complete { chunk_id: i64 },
}

impl std::fmt::Display for WorkerOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Claim => write!(f, "claim chunk"),
            Self::Complete { chunk_id } => write!(f, "complete chunk {chunk_id}"),
        }
    }
}

/// Errors that stop a worker's loop outright.
///
/// Per-item fetch failures never reach this type — they are swallowed at the
/// fetch site. Only store errors on the claim/complete/flush path are fatal to
/// the worker task; the coordinator reclaims its in-progress chunk on timeout.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("store error during {operation}: {source}")]
    Store {
        operation: WorkerOperation,
        #[source]
        source: hn_crawl_store::DatabaseError,
    },
}

pub type WorkerResult<T> = Result<T, WorkerError>;
