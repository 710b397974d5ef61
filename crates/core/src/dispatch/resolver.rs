use std::sync::Arc;

use crate::config::{NotificationConfig, NotifyMode};
use crate::store::{keys, KvStore, KvStoreExt, StoreError};

use super::DeliveryTarget;

/// Maps owners to delivery targets.
///
/// In direct mode every owner is its own target. In channel mode an owner id
/// of the form `<communityId>:<userId>` routes to the community's alerts
/// channel, falling back to the configured default channel.
#[derive(Clone)]
pub struct TargetResolver {
    store: Arc<dyn KvStore>,
    mode: NotifyMode,
    default_channel: Option<String>,
}

impl TargetResolver {
    pub fn new(store: Arc<dyn KvStore>, config: &NotificationConfig) -> Self {
        Self {
            store,
            mode: config.mode,
            default_channel: config.default_channel.clone().filter(|c| !c.is_empty()),
        }
    }

    pub fn mode(&self) -> NotifyMode {
        self.mode
    }

    /// Set the alerts channel of a community.
    pub fn set_alerts_channel(&self, community_id: &str, target: &str) -> Result<(), StoreError> {
        self.store
            .set_as(&keys::alerts_channel(community_id), &target.to_string())
    }

    pub fn alerts_channel(&self, community_id: &str) -> Result<Option<String>, StoreError> {
        self.store.get_as(&keys::alerts_channel(community_id))
    }

    pub fn clear_alerts_channel(&self, community_id: &str) -> Result<bool, StoreError> {
        self.store.delete(&keys::alerts_channel(community_id))
    }

    /// Target for `owner_id`, or `None` when it cannot be routed.
    pub fn resolve(&self, owner_id: &str) -> Result<Option<DeliveryTarget>, StoreError> {
        match self.mode {
            NotifyMode::Direct => Ok(Some(DeliveryTarget::Direct(owner_id.to_string()))),
            NotifyMode::Channel => {
                if let Some((community_id, _)) = owner_id.split_once(':') {
                    if let Some(channel) = self.alerts_channel(community_id)? {
                        return Ok(Some(DeliveryTarget::Channel(channel)));
                    }
                }
                Ok(self.default_channel.clone().map(DeliveryTarget::Channel))
            }
        }
    }
}
