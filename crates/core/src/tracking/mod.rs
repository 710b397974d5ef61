//! Global query registry and per-query dedup watermarks.

mod last_seen;
mod registry;

pub use last_seen::{LastSeenTracker, Watermark};
pub use registry::QueryRegistry;
