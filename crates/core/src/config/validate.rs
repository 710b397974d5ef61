use super::{types::Config, ConfigError, NotifyMode};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Upstream URL is http(s)
/// - Polling budget and interval are positive
/// - Query length bounds are ordered
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let url = config.upstream.url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "upstream.url must be an http(s) URL, got {:?}",
            config.upstream.url
        )));
    }

    if config.polling.safe_requests_per_minute == 0 {
        return Err(ConfigError::ValidationError(
            "polling.safe_requests_per_minute must be greater than 0".to_string(),
        ));
    }

    if config.polling.base_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "polling.base_interval_secs must be greater than 0".to_string(),
        ));
    }

    let subs = &config.subscriptions;
    if subs.min_query_len > subs.max_query_len {
        return Err(ConfigError::ValidationError(format!(
            "subscriptions.min_query_len ({}) exceeds max_query_len ({})",
            subs.min_query_len, subs.max_query_len
        )));
    }

    if config.notifications.mode == NotifyMode::Channel
        && config.notifications.default_channel.is_none()
    {
        tracing::warn!(
            "Channel notifications without default_channel: owners outside a mapped community will be skipped"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn base() -> Config {
        load_config_from_str(
            r#"
[upstream]
url = "https://api.example.org"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&base()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = base();
        config.server.port = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let mut config = base();
        config.upstream.url = "ftp://api.example.org".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("upstream.url"));
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        let mut config = base();
        config.polling.safe_requests_per_minute = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_base_interval() {
        let mut config = base();
        config.polling.base_interval_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_query_bounds() {
        let mut config = base();
        config.subscriptions.min_query_len = 60;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_channel_mode_without_default_is_allowed() {
        let mut config = base();
        config.notifications.mode = NotifyMode::Channel;
        assert!(validate_config(&config).is_ok());
    }
}
