//! Structured error handling for the store layer.

use std::fmt;
use thiserror::Error;

/// Result type alias for store operations.
pub type DatabaseResult<T> = std::result::Result<T, DatabaseError>;

/// Identifies which logical operation was attempted, for error context.
#[derive(Debug, Clone)]
pub enum DatabaseOperation {
    Claim { worker_id: i32 },
    Complete { chunk_id: i64 },
    ReclaimStale,
    UpsertBatch { count: usize },
    QueueDepth,
    Populate { chunk_count: usize },
    Query { description: String },
}

impl fmt::Display for DatabaseOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Claim { worker_id } => write!(f, "claim(worker_id={worker_id})"),
            Self::Complete { chunk_id } => write!(f, "complete(chunk_id={chunk_id})"),
            Self::ReclaimStale => write!(f, "reclaim_stale()"),
            Self::UpsertBatch { count } => write!(f, "upsert_batch(count={count})"),
            Self::QueueDepth => write!(f, "queue_depth()"),
            Self::Populate { chunk_count } => write!(f, "populate(chunk_count={chunk_count})"),
            Self::Query { description } => write!(f, "query({description})"),
        }
    }
}

/// Comprehensive store error with operation context.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Query execution error.
    #[error("query failed for operation '{operation}': {message}")]
    QueryFailed {
        operation: Box<DatabaseOperation>,
        message: String,
        #[source]
        source: sqlx::Error,
    },
}

impl DatabaseError {
    /// Build a `QueryFailed` from a raw `sqlx::Error`, attaching operation context.
    pub fn query_failed(operation: DatabaseOperation, source: sqlx::Error) -> Self {
        let message = source.to_string();
        Self::QueryFailed {
            operation: Box::new(operation),
            message,
            source,
        }
    }
}

/// Extension trait for converting `sqlx` errors with operation context.
pub trait DatabaseErrorExt<T> {
    /// Convert to `DatabaseError`, attaching the operation that was attempted.
    ///
    /// # Errors
    /// Returns `DatabaseError::QueryFailed` wrapping the original `sqlx::Error`.
    fn map_db_err(self, operation: DatabaseOperation) -> DatabaseResult<T>;
}

impl<T> DatabaseErrorExt<T> for std::result::Result<T, sqlx::Error> {
    fn map_db_err(self, operation: DatabaseOperation) -> DatabaseResult<T> {
        self.map_err(|e| DatabaseError::query_failed(operation, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_display_carries_context() {
        let op = DatabaseOperation::Claim { worker_id: 3 };
        assert_eq!(op.to_string(), "claim(worker_id=3)");
    }

    #[test]
    fn upsert_batch_display() {
        let op = DatabaseOperation::UpsertBatch { count: 42 };
        assert_eq!(op.to_string(), "upsert_batch(count=42)");
    }
}
