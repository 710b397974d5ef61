//! Persisted key layout.

use crate::matcher::storage_key;

/// Global query registry.
pub const ALL_QUERIES: &str = "meta:all_queries";

/// Ordered subscription list of an owner.
pub fn user(owner_id: &str) -> String {
    format!("user:{}", owner_id)
}

/// Owner set of a query.
pub fn query(query: &str) -> String {
    format!("query:{}", storage_key(query))
}

/// Watermark of a query.
pub fn last_seen(query: &str) -> String {
    format!("lastSeen:{}", storage_key(query))
}

/// Alerts channel of a community.
pub fn alerts_channel(community_id: &str) -> String {
    format!("alertsChannel:{}", community_id)
}
