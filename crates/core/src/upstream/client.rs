//! HTTP client for the upstream release API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::UpstreamConfig;
use crate::release::Release;

use super::{ReleaseSource, UpstreamError, UpstreamHealth};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    data: SearchData,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    #[serde(default)]
    rows: Vec<Value>,
}

/// Release API client.
pub struct UpstreamClient {
    client: Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| UpstreamError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn search_url(&self, query: &str, count: u32) -> String {
        format!(
            "{}/?q={}&count={}",
            self.base_url,
            urlencoding::encode(query),
            count
        )
    }

    async fn get_json(&self, url: &str) -> Result<Value, UpstreamError> {
        let response = self.client.get(url).send().await.map_err(map_request_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| UpstreamError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

fn map_request_error(e: reqwest::Error) -> UpstreamError {
    if e.is_timeout() {
        UpstreamError::Timeout
    } else if e.is_connect() {
        UpstreamError::ConnectionFailed(e.to_string())
    } else {
        UpstreamError::ApiError(e.to_string())
    }
}

/// Decode a search response. Rows that fail validation are logged and dropped.
fn parse_rows(body: Value) -> Result<Vec<Release>, UpstreamError> {
    let response: SearchResponse = serde_json::from_value(body)
        .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))?;

    let mut releases = Vec::with_capacity(response.data.rows.len());
    for row in response.data.rows {
        match serde_json::from_value::<Release>(row) {
            Ok(release) => match release.validate() {
                Ok(()) => releases.push(release),
                Err(reason) => warn!(reason = %reason, "Dropping invalid release row"),
            },
            Err(e) => warn!(error = %e, "Dropping malformed release row"),
        }
    }
    Ok(releases)
}

/// Healthy iff `status == "success"` and `data.total` is a positive number.
fn parse_health(body: &Value) -> UpstreamHealth {
    let success = body.get("status").and_then(Value::as_str) == Some("success");
    let total = body
        .get("data")
        .and_then(|d| d.get("total"))
        .and_then(Value::as_f64);

    UpstreamHealth {
        healthy: success && total.is_some_and(|t| t > 0.0),
        total_releases: total.filter(|t| *t >= 0.0).map(|t| t as u64),
    }
}

#[async_trait]
impl ReleaseSource for UpstreamClient {
    async fn fetch_recent(&self, query: &str, count: u32) -> Result<Vec<Release>, UpstreamError> {
        let url = self.search_url(query, count);
        debug!(query = query, "Fetching recent releases");

        let body = self.get_json(&url).await?;
        let releases = parse_rows(body)?;

        debug!(query = query, rows = releases.len(), "Fetched recent releases");
        Ok(releases)
    }

    async fn health(&self) -> Result<UpstreamHealth, UpstreamError> {
        let url = format!("{}/stats", self.base_url);
        let body = self.get_json(&url).await?;
        Ok(parse_health(&body))
    }
}
