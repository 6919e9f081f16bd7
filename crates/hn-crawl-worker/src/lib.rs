//! Bounded-concurrency fetch/upsert pipeline run by each worker task.

pub mod error;
pub mod worker;

pub use error::{WorkerError, WorkerOperation, WorkerResult};
pub use worker::{Worker, WorkerSummary};
