//! Subscription data types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;

/// A keyword subscription held by one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Unique within the owner's list.
    pub id: String,
    pub owner_id: String,
    /// Query as entered by the owner.
    pub query: String,
    /// Epoch milliseconds.
    pub created_at: i64,
}

/// Persisted form inside `user:<ownerId>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SubscriptionRecord {
    pub id: String,
    pub query: String,
    pub created: i64,
}

impl SubscriptionRecord {
    pub fn into_subscription(self, owner_id: &str) -> Subscription {
        Subscription {
            id: self.id,
            owner_id: owner_id.to_string(),
            query: self.query,
            created_at: self.created,
        }
    }
}

/// Result of removing a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedSubscription {
    pub id: String,
    pub deleted_query: String,
    /// Whether the query lost its last subscriber and was unregistered.
    pub query_retired: bool,
}

/// Errors from subscription operations.
#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("already subscribed to {query:?}")]
    Duplicate { query: String },

    #[error("subscription not found")]
    NotFound,

    #[error("subscription limit of {limit} reached")]
    LimitExceeded { limit: usize },

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SubscriptionError {
    /// Message suitable for showing to the owner.
    pub fn user_message(&self) -> String {
        match self {
            SubscriptionError::Duplicate { query } => {
                format!("You're already monitoring \"{}\"", query)
            }
            SubscriptionError::NotFound => "Subscription not found.".to_string(),
            SubscriptionError::LimitExceeded { limit } => format!(
                "Maximum {} subscriptions per user. Remove some first.",
                limit
            ),
            SubscriptionError::InvalidQuery(reason) => reason.clone(),
            SubscriptionError::Store(_) => {
                "Failed to update subscriptions. Try again later.".to_string()
            }
        }
    }
}
