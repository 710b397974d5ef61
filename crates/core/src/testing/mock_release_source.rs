//! Mock upstream API for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::matcher::canonical;
use crate::release::Release;
use crate::upstream::{ReleaseSource, UpstreamError, UpstreamHealth};

/// A recorded fetch for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFetch {
    pub query: String,
    pub count: u32,
}

/// Mock implementation of the `ReleaseSource` trait.
///
/// Rows are configured per canonical query. Errors can be queued per query;
/// each queued error fails exactly one fetch.
#[derive(Debug, Clone)]
pub struct MockReleaseSource {
    rows: Arc<RwLock<HashMap<String, Vec<Release>>>>,
    errors: Arc<RwLock<HashMap<String, VecDeque<UpstreamError>>>>,
    fetches: Arc<RwLock<Vec<RecordedFetch>>>,
    health: Arc<RwLock<Result<UpstreamHealth, UpstreamError>>>,
}

impl Default for MockReleaseSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockReleaseSource {
    /// Create a mock source with no rows that reports healthy.
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(HashMap::new())),
            errors: Arc::new(RwLock::new(HashMap::new())),
            fetches: Arc::new(RwLock::new(Vec::new())),
            health: Arc::new(RwLock::new(Ok(UpstreamHealth {
                healthy: true,
                total_releases: Some(1),
            }))),
        }
    }

    /// Rows returned for `query`.
    pub async fn set_rows(&self, query: &str, rows: Vec<Release>) {
        self.rows.write().await.insert(canonical(query), rows);
    }

    /// Fail the next fetch for `query`.
    pub async fn fail_next(&self, query: &str, error: UpstreamError) {
        self.errors
            .write()
            .await
            .entry(canonical(query))
            .or_default()
            .push_back(error);
    }

    pub async fn set_health(&self, health: Result<UpstreamHealth, UpstreamError>) {
        *self.health.write().await = health;
    }

    /// Get recorded fetches.
    pub async fn recorded_fetches(&self) -> Vec<RecordedFetch> {
        self.fetches.read().await.clone()
    }

    pub async fn fetch_count(&self) -> usize {
        self.fetches.read().await.len()
    }
}

#[async_trait]
impl ReleaseSource for MockReleaseSource {
    async fn fetch_recent(&self, query: &str, count: u32) -> Result<Vec<Release>, UpstreamError> {
        self.fetches.write().await.push(RecordedFetch {
            query: query.to_string(),
            count,
        });

        let key = canonical(query);
        if let Some(error) = self
            .errors
            .write()
            .await
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
        {
            return Err(error);
        }

        let rows = self.rows.read().await.get(&key).cloned().unwrap_or_default();
        Ok(rows.into_iter().take(count as usize).collect())
    }

    async fn health(&self) -> Result<UpstreamHealth, UpstreamError> {
        self.health.read().await.clone()
    }
}
