//! Upstream release API.
//!
//! Provides a `ReleaseSource` trait for fetching recent releases per query and
//! checking upstream health, with an HTTP implementation.

mod client;
mod types;

pub use client::UpstreamClient;
pub use types::*;
