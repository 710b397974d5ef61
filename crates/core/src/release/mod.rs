//! Release records and feed events.
//!
//! Payloads from the upstream feed are validated here and converted to typed
//! values before anything else sees them.

mod event;
mod types;

pub use event::{parse_event, EventParseError, ReleaseAction, ReleaseEvent};
pub use types::*;
