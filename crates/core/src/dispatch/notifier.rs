use async_trait::async_trait;
use tracing::info;

use super::{Delivery, DeliveryError};

/// Outbound delivery channel.
///
/// Called once per target per release.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, delivery: &Delivery) -> Result<(), DeliveryError>;
}

/// Writes deliveries to the log. Used when no webhook is configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, delivery: &Delivery) -> Result<(), DeliveryError> {
        info!(
            to = %delivery.target,
            release = %delivery.release.name,
            queries = ?delivery.queries,
            owners = delivery.owners.len(),
            "New release match"
        );
        Ok(())
    }
}
