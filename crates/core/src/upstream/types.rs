use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::release::Release;

/// Result of an upstream health probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpstreamHealth {
    pub healthy: bool,
    /// Total releases reported by the API, when it reported a number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_releases: Option<u64>,
}

/// Errors that can occur talking to the upstream API.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Source of recent releases for a query.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Fetch up to `count` recent releases matching `query`.
    async fn fetch_recent(&self, query: &str, count: u32) -> Result<Vec<Release>, UpstreamError>;

    /// Probe the upstream statistics endpoint.
    async fn health(&self) -> Result<UpstreamHealth, UpstreamError>;
}
