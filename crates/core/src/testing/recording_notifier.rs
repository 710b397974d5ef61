//! Notifier that records deliveries.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::dispatch::{Delivery, DeliveryError, DeliveryTarget, Notifier};

/// Records every delivery; can be told to fail specific targets.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    deliveries: Arc<RwLock<Vec<Delivery>>>,
    failing: Arc<RwLock<HashSet<DeliveryTarget>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Successful deliveries, in order.
    pub async fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.read().await.clone()
    }

    pub async fn delivery_count(&self) -> usize {
        self.deliveries.read().await.len()
    }

    /// Make deliveries to `target` fail.
    pub async fn fail_for(&self, target: DeliveryTarget) {
        self.failing.write().await.insert(target);
    }

    pub async fn clear(&self) {
        self.deliveries.write().await.clear();
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, delivery: &Delivery) -> Result<(), DeliveryError> {
        if self.failing.read().await.contains(&delivery.target) {
            return Err(DeliveryError::Unreachable(delivery.target.to_string()));
        }
        self.deliveries.write().await.push(delivery.clone());
        Ok(())
    }
}
