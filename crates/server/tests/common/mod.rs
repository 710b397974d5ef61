//! Common test utilities for in-process API testing.
//!
//! Builds the router over an in-memory store with a mock upstream and a
//! recording notifier, so requests can be driven with `oneshot`.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use prealert_core::{
    config::{
        DatabaseConfig, NotificationConfig, PollingConfig, ServerConfig, StreamConfig,
        SubscriptionConfig, UpstreamConfig,
    },
    testing::{MemoryKvStore, MockReleaseSource, RecordingNotifier},
    Config, NotifyMode,
};
use prealert_server::state::AppState;

/// Re-export fixtures for test convenience
pub use prealert_core::testing::fixtures;

/// In-process server with controllable collaborators.
pub struct TestFixture {
    pub router: Router,
    pub state: Arc<AppState>,
    pub store: Arc<MemoryKvStore>,
    pub upstream: Arc<MockReleaseSource>,
    pub notifier: Arc<RecordingNotifier>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub max_per_owner: usize,
    pub mode: NotifyMode,
    pub default_channel: Option<String>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            max_per_owner: 0,
            mode: NotifyMode::Direct,
            default_channel: None,
        }
    }
}

impl TestConfig {
    /// Channel routing with a fallback channel.
    pub fn channel_mode(default_channel: &str) -> Self {
        Self {
            mode: NotifyMode::Channel,
            default_channel: Some(default_channel.to_string()),
            ..Self::default()
        }
    }
}

impl TestFixture {
    pub fn new() -> Self {
        Self::with_config(TestConfig::default())
    }

    pub fn with_config(test_config: TestConfig) -> Self {
        let config = Config {
            upstream: UpstreamConfig {
                url: "http://127.0.0.1:1".to_string(),
                timeout_secs: 1,
                page_size: 5,
            },
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 8080,
            },
            database: DatabaseConfig::default(),
            stream: StreamConfig::default(),
            polling: PollingConfig::default(),
            subscriptions: SubscriptionConfig {
                max_per_owner: test_config.max_per_owner,
                ..SubscriptionConfig::default()
            },
            notifications: NotificationConfig {
                mode: test_config.mode,
                default_channel: test_config.default_channel,
                webhook_url: Some("https://hooks.example.org/secret-token".to_string()),
            },
        };

        let store = Arc::new(MemoryKvStore::new());
        let upstream = Arc::new(MockReleaseSource::new());
        let notifier = Arc::new(RecordingNotifier::new());

        let state = Arc::new(AppState::new(
            config,
            store.clone(),
            upstream.clone(),
            notifier.clone(),
        ));
        let router = prealert_server::api::create_router(Arc::clone(&state));

        Self {
            router,
            state,
            store,
            upstream,
            notifier,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a GET request and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
