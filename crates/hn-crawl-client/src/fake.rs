//! In-memory `UpstreamClient` double for worker/coordinator tests.

use crate::client::{RawItem, UpstreamClient};
use crate::error::{UpstreamError, UpstreamResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Canned behavior for one item ID.
#[derive(Clone)]
pub enum FakeResponse {
    Item(RawItem),
    Null,
    Error,
}

/// Deterministic fake upstream client driven by a fixed response table.
pub struct FakeUpstreamClient {
    max_id: i64,
    responses: Mutex<HashMap<i64, FakeResponse>>,
}

impl FakeUpstreamClient {
    pub fn new(max_id: i64) -> Self {
        Self {
            max_id,
            responses: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_item(self, id: i64, item: RawItem) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(id, FakeResponse::Item(item));
        self
    }

    pub fn with_null(self, id: i64) -> Self {
        self.responses.lock().unwrap().insert(id, FakeResponse::Null);
        self
    }

    pub fn with_error(self, id: i64) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(id, FakeResponse::Error);
        self
    }
}

#[async_trait]
impl UpstreamClient for FakeUpstreamClient {
    async fn max_item_id(&self) -> UpstreamResult<i64> {
        Ok(self.max_id)
    }

    async fn fetch_item(&self, id: i64) -> UpstreamResult<Option<RawItem>> {
        let responses = self.responses.lock().unwrap();
        match responses.get(&id) {
            Some(FakeResponse::Item(item)) => Ok(Some(item.clone())),
            Some(FakeResponse::Null) | None => Ok(None),
            Some(FakeResponse::Error) => Err(UpstreamError::Simulated {
                reason: format!("injected failure for item {id}"),
            }),
        }
    }
}
