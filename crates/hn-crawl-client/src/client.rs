//! Upstream item API client.

use crate::error::{UpstreamError, UpstreamResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// One item as returned by the upstream API. Any field may be absent.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct RawItem {
    pub id: i64,
    #[serde(rename = "type")]
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
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub dead: bool,
}

/// Abstraction over the upstream item API.
///
/// `fetch_item` distinguishes a genuine transport error (`Err`) from a confirmed
/// absence (`Ok(None)`, covering both a JSON `null` body and a 404), so tests can
/// assert on which failure mode fired even though the worker pipeline treats both
/// identically.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// `GET /v0/maxitem.json`.
    async fn max_item_id(&self) -> UpstreamResult<i64>;

    /// `GET /v0/item/{id}.json`.
    async fn fetch_item(&self, id: i64) -> UpstreamResult<Option<RawItem>>;
}

/// `reqwest`-backed client with connection pooling and keep-alive.
#[derive(Clone)]
pub struct HnApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl HnApiClient {
    /// Build a client with the given base URL and per-request timeout.
    ///
    /// # Errors
    /// Returns an error if the underlying `reqwest` client cannot be constructed.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl UpstreamClient for HnApiClient {
    async fn max_item_id(&self) -> UpstreamResult<i64> {
        let url = format!("{}/maxitem.json", self.base_url.trim_end_matches('/'));
        let response = self.http.get(&url).send().await?.error_for_status()?;
        let max_id = response.json::<i64>().await?;
        Ok(max_id)
    }

    async fn fetch_item(&self, id: i64) -> UpstreamResult<Option<RawItem>> {
        let url = format!("{}/item/{id}.json", self.base_url.trim_end_matches('/'));

        let response = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(e) => return Err(UpstreamError::from(e)),
        };

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = response.error_for_status()?;
        let body: serde_json::Value = response.json().await?;

        if body.is_null() {
            return Ok(None);
        }

        match serde_json::from_value::<RawItem>(body) {
            Ok(item) => Ok(Some(item)),
            Err(e) => {
                tracing::warn!(item_id = id, error = %e, "failed to parse item payload");
                Err(UpstreamError::Malformed(e))
            }
        }
    }
}
