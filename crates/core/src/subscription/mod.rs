//! Owner subscriptions and the query index derived from them.

mod store;
mod types;

pub use store::SubscriptionStore;
pub use types::*;
