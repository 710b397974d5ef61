//! Match releases against registered queries and deliver batched notifications.
//!
//! The dispatcher groups every owner of every newly matched query by delivery
//! target and makes exactly one outbound call per target per release.

mod dispatcher;
mod notifier;
mod resolver;
mod types;
mod webhook;

pub use dispatcher::Dispatcher;
pub use notifier::{LogNotifier, Notifier};
pub use resolver::TargetResolver;
pub use types::*;
pub use webhook::WebhookNotifier;
