//! PostgreSQL-backed job queue and item store for the crawler.

pub mod chunk_queue;
pub mod error;
pub mod items;
pub mod migrations;
pub mod mock;
pub mod models;
pub mod pool;

pub use chunk_queue::{ChunkQueue, PostgresChunkQueue, QueueDepth};
pub use error::{DatabaseError, DatabaseErrorExt, DatabaseOperation, DatabaseResult};
pub use items::{ItemStore, PostgresItemStore};
pub use migrations::run_migrations;
pub use mock::{MockChunkQueue, MockItemStore};
pub use models::{Chunk, ChunkStatus, Item};
pub use pool::{create_pool, initialize_store};
