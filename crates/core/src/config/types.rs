use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub subscriptions: SubscriptionConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("prealert.db")
}

/// Upstream release API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Base URL of the release API (e.g., "https://api.example.org")
    pub url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Rows requested per poll (default: 5)
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_timeout() -> u32 {
    30
}

fn default_page_size() -> u32 {
    5
}

/// Real-time stream configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Fixed delay before reconnecting after a close or error.
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,
    /// Path appended to the upstream URL (scheme is switched to ws/wss).
    #[serde(default = "default_stream_path")]
    pub path: String,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reconnect_delay_secs: default_reconnect_delay(),
            path: default_stream_path(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_reconnect_delay() -> u64 {
    5
}

fn default_stream_path() -> String {
    "/ws".to_string()
}

/// Fallback polling configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollingConfig {
    /// Polling is off unless explicitly enabled.
    #[serde(default)]
    pub enabled: bool,
    /// Minimum time between tick starts.
    #[serde(default = "default_base_interval")]
    pub base_interval_secs: u64,
    /// Request budget the scheduler stays within.
    #[serde(default = "default_safe_rpm")]
    pub safe_requests_per_minute: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_interval_secs: default_base_interval(),
            safe_requests_per_minute: default_safe_rpm(),
        }
    }
}

fn default_base_interval() -> u64 {
    60
}

fn default_safe_rpm() -> u32 {
    30
}

/// Subscription limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubscriptionConfig {
    /// Maximum subscriptions per owner (0 = unlimited).
    #[serde(default)]
    pub max_per_owner: usize,
    #[serde(default = "default_min_query_len")]
    pub min_query_len: usize,
    #[serde(default = "default_max_query_len")]
    pub max_query_len: usize,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            max_per_owner: 0,
            min_query_len: default_min_query_len(),
            max_query_len: default_max_query_len(),
        }
    }
}

fn default_min_query_len() -> usize {
    4
}

fn default_max_query_len() -> usize {
    50
}

/// How delivery targets are derived from owners.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotifyMode {
    /// Each owner is addressed directly.
    #[default]
    Direct,
    /// Owners are routed to their community's alerts channel.
    Channel,
}

/// Notification delivery configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NotificationConfig {
    #[serde(default)]
    pub mode: NotifyMode,
    /// Channel used when an owner's community has no alerts channel set.
    #[serde(default)]
    pub default_channel: Option<String>,
    /// Webhook receiving one POST per delivery target.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub upstream: UpstreamConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub stream: StreamConfig,
    pub polling: PollingConfig,
    pub subscriptions: SubscriptionConfig,
    pub notifications: SanitizedNotificationConfig,
}

/// Sanitized notification config (webhook URL hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedNotificationConfig {
    pub mode: NotifyMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_channel: Option<String>,
    pub webhook_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            upstream: config.upstream.clone(),
            server: config.server.clone(),
            database: config.database.clone(),
            stream: config.stream.clone(),
            polling: config.polling.clone(),
            subscriptions: config.subscriptions.clone(),
            notifications: SanitizedNotificationConfig {
                mode: config.notifications.mode,
                default_channel: config.notifications.default_channel.clone(),
                webhook_configured: config
                    .notifications
                    .webhook_url
                    .as_deref()
                    .is_some_and(|url| !url.is_empty()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> &'static str {
        r#"
[upstream]
url = "https://api.example.org"
"#
    }

    #[test]
    fn test_deserialize_minimal_config_defaults() {
        let config: Config = toml::from_str(minimal()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.database.path.to_str().unwrap(), "prealert.db");
        assert_eq!(config.upstream.timeout_secs, 30);
        assert_eq!(config.upstream.page_size, 5);
        assert!(config.stream.enabled);
        assert_eq!(config.stream.reconnect_delay_secs, 5);
        assert_eq!(config.stream.path, "/ws");
        assert!(!config.polling.enabled);
        assert_eq!(config.polling.base_interval_secs, 60);
        assert_eq!(config.polling.safe_requests_per_minute, 30);
        assert_eq!(config.subscriptions.max_per_owner, 0);
        assert_eq!(config.subscriptions.min_query_len, 4);
        assert_eq!(config.subscriptions.max_query_len, 50);
        assert_eq!(config.notifications.mode, NotifyMode::Direct);
    }

    #[test]
    fn test_deserialize_missing_upstream_fails() {
        let toml = r#"
[server]
port = 8080
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_channel_mode() {
        let toml = r#"
[upstream]
url = "https://api.example.org"

[notifications]
mode = "channel"
default_channel = "chan-1"
webhook_url = "https://hooks.example.org/alerts"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.notifications.mode, NotifyMode::Channel);
        assert_eq!(
            config.notifications.default_channel.as_deref(),
            Some("chan-1")
        );
    }

    #[test]
    fn test_sanitized_config_hides_webhook() {
        let mut config: Config = toml::from_str(minimal()).unwrap();
        config.notifications.webhook_url = Some("https://hooks.example.org/secret".to_string());

        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.notifications.webhook_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_sanitized_config_without_webhook() {
        let config: Config = toml::from_str(minimal()).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(!sanitized.notifications.webhook_configured);
        assert_eq!(sanitized.server.port, 8080);
    }
}
