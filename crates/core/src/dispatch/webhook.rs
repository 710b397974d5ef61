//! Webhook delivery.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::{Delivery, DeliveryError, Notifier};

/// POSTs each delivery as JSON to a fixed URL.
///
/// Body: `{"target": {"kind", "id"}, "release": {..}, "queries": [..], "owners": [..]}`.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeliveryError::Unreachable(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn deliver(&self, delivery: &Delivery) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.url)
            .json(delivery)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DeliveryError::Timeout
                } else {
                    DeliveryError::Unreachable(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        debug!(to = %delivery.target, "Webhook accepted delivery");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DeliveryTarget;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_unreachable_webhook_fails() {
        let notifier =
            WebhookNotifier::new("http://127.0.0.1:1/hook", Duration::from_secs(2)).unwrap();
        let delivery = Delivery {
            target: DeliveryTarget::Direct("u1".to_string()),
            release: fixtures::release("Foo.Bar-GRP", 1, 100),
            queries: vec!["foo bar".to_string()],
            owners: vec!["u1".to_string()],
        };

        let err = notifier.deliver(&delivery).await.unwrap_err();
        assert!(matches!(
            err,
            DeliveryError::Unreachable(_) | DeliveryError::Timeout
        ));
    }
}
