//! Domain models for the job queue and item store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a `job_chunks` row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChunkStatus {
    Pending,
    InProgress,
    Completed,
}

impl std::str::FromStr for ChunkStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("invalid chunk status: {s}")),
        }
    }
}

impl From<String> for ChunkStatus {
    fn from(s: String) -> Self {
        s.as_str().parse().unwrap_or(Self::Pending)
    }
}

impl std::fmt::Display for ChunkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        };
        write!(f, "{status}")
    }
}

/// A contiguous ID range claimed and processed as one unit of work.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Chunk {
    pub id: i64,
    pub start_id: i64,
    pub end_id: i64,
    pub status: String,
    pub worker_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chunk {
    /// Parsed lifecycle state.
    pub fn status(&self) -> ChunkStatus {
        self.status.clone().into()
    }
}

/// A fetched item, ready to be upserted into the `items` table.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Item {
    pub id: i64,
    pub item_type: Option<String>,
    pub by: Option<String>,
    pub text: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub time: Option<i64>,
    pub parent: Option<i64>,
    pub descendants: Option<i32>,
    pub score: Option<i32>,
    pub kids: Option<serde_json::Value>,
    pub deleted: bool,
    pub dead: bool,
}
