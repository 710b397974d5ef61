//! Testing utilities and in-memory collaborators.
//!
//! This module provides doubles for every external seam of the engine (the
//! key-value store, the upstream API, the real-time feed and the outbound
//! notifier), so the whole pipeline can be exercised without infrastructure.
//!
//! # Example
//!
//! ```rust,ignore
//! use prealert_core::testing::{fixtures, MemoryKvStore, MockReleaseSource, RecordingNotifier};
//!
//! let store = Arc::new(MemoryKvStore::new());
//! let source = MockReleaseSource::new();
//! source.set_rows("foo bar", vec![fixtures::release("Foo.Bar-GRP", 1, 100)]).await;
//!
//! let notifier = RecordingNotifier::new();
//! // build a Dispatcher around `store` and `notifier`...
//! assert_eq!(notifier.deliveries().await.len(), 1);
//! ```

mod memory_store;
mod mock_release_source;
mod recording_notifier;
mod scripted_event_source;

pub use memory_store::MemoryKvStore;
pub use mock_release_source::MockReleaseSource;
pub use recording_notifier::RecordingNotifier;
pub use scripted_event_source::{ScriptedEventSource, Session};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::release::{Release, ReleaseEvent};

    /// Create a test release with reasonable defaults.
    pub fn release(name: &str, id: u64, pre_at: i64) -> Release {
        Release {
            id,
            name: name.to_string(),
            team: "GRP".to_string(),
            cat: "TV-HD".to_string(),
            genre: None,
            url: None,
            size: 1024 * 1024 * 700, // 700 MB
            files: 12,
            pre_at,
            nuke: None,
        }
    }

    /// JSON frame as sent by the feed.
    pub fn event_frame(action: &str, release: &Release) -> String {
        serde_json::json!({ "action": action, "row": release }).to_string()
    }

    /// `insert` event for a release.
    pub fn insert(name: &str, id: u64, pre_at: i64) -> ReleaseEvent {
        ReleaseEvent::insert(release(name, id, pre_at))
    }
}
