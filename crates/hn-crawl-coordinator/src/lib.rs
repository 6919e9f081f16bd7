//! Bootstrap, population, worker launch and progress monitoring for a crawl run.

pub mod coordinator;
pub mod error;
pub mod populate;

pub use coordinator::{Coordinator, RunSummary};
pub use error::{CoordinatorError, CoordinatorResult};
pub use populate::{compute_chunk_ranges, populate_if_empty};
