use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::release::Release;

/// Where a notification is sent.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum DeliveryTarget {
    /// A single owner, addressed directly.
    Direct(String),
    /// A shared channel.
    Channel(String),
}

impl fmt::Display for DeliveryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryTarget::Direct(id) => write!(f, "direct:{}", id),
            DeliveryTarget::Channel(id) => write!(f, "channel:{}", id),
        }
    }
}

/// One outbound notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub target: DeliveryTarget,
    pub release: Release,
    /// Matched queries routed to this target.
    pub queries: Vec<String>,
    /// Owners routed to this target.
    pub owners: Vec<String>,
}

/// Delivery failures. Always isolated to one target.
#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    #[error("target unreachable: {0}")]
    Unreachable(String),

    #[error("delivery rejected: {0}")]
    Rejected(String),

    #[error("delivery timed out")]
    Timeout,
}

/// What happened to one release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    /// Queries whose words all appear in the release name.
    pub matched_queries: Vec<String>,
    /// Matched queries suppressed by their watermark.
    pub skipped_queries: Vec<String>,
    /// Targets that accepted the notification.
    pub delivered: Vec<DeliveryTarget>,
    /// Targets whose delivery failed.
    pub failed: Vec<DeliveryTarget>,
    /// Owners with no resolvable target.
    pub unroutable_owners: Vec<String>,
}

impl DispatchReport {
    pub fn notified(&self) -> bool {
        !self.delivered.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_serialization() {
        let value = serde_json::to_value(DeliveryTarget::Channel("c1".to_string())).unwrap();
        assert_eq!(value, serde_json::json!({"kind": "channel", "id": "c1"}));
    }

    #[test]
    fn test_target_display() {
        assert_eq!(DeliveryTarget::Direct("u1".to_string()).to_string(), "direct:u1");
        assert_eq!(DeliveryTarget::Channel("c1".to_string()).to_string(), "channel:c1");
    }
}
