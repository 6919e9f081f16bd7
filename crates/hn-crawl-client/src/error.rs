//! Upstream item API error classification.

use thiserror::Error;

/// Result alias for upstream client operations.
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Classified failure modes for a request against the upstream item API.
///
/// Mirrors the connect/timeout/status/decode taxonomy this codebase already
/// uses for classifying `reqwest` errors, so log messages stay consistent
/// regardless of which layer issued the request.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("failed to connect to upstream: {0}")]
    Connect(#[source] reqwest::Error),

    #[error("upstream request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("upstream returned error status {status}: {source}")]
    Status {
        status: u16,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to decode upstream response: {0}")]
    Decode(#[source] reqwest::Error),

    /// The response body was valid JSON but didn't match the expected item shape.
    #[error("failed to parse item payload: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("upstream request failed: {0}")]
    Other(#[source] reqwest::Error),

    /// A transient failure injected by a test double rather than observed over the wire.
    #[error("simulated upstream failure: {reason}")]
    Simulated { reason: String },
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            Self::Connect(e)
        } else if e.is_timeout() {
            Self::Timeout(e)
        } else if e.is_decode() {
            Self::Decode(e)
        } else if e.is_status() {
            let status = e.status().map_or(0, |s| s.as_u16());
            Self::Status { status, source: e }
        } else {
            Self::Other(e)
        }
    }
}
