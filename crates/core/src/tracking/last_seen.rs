use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::release::Release;
use crate::store::{keys, KvStore, KvStoreExt, StoreError};

/// Last release delivered for a query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Watermark {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_at: Option<i64>,
}

impl Watermark {
    /// A release is new when it is strictly newer than the watermark.
    pub fn admits(&self, release: &Release) -> bool {
        match self.pre_at {
            Some(pre_at) => release.pre_at > pre_at,
            None => true,
        }
    }
}

/// Per-query dedup watermarks.
///
/// Watermarks only move forward. `reset` is the only way back.
#[derive(Clone)]
pub struct LastSeenTracker {
    store: Arc<dyn KvStore>,
}

impl LastSeenTracker {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn get(&self, query: &str) -> Result<Option<Watermark>, StoreError> {
        self.store.get_as(&keys::last_seen(query))
    }

    /// Whether `release` would be new for `query`. Read-only.
    pub fn is_new(&self, query: &str, release: &Release) -> Result<bool, StoreError> {
        Ok(self
            .get(query)?
            .map_or(true, |watermark| watermark.admits(release)))
    }

    /// Check and advance in one atomic step.
    ///
    /// Returns `true` and moves the watermark to `release` if it is new for
    /// `query`; returns `false` and leaves the watermark untouched otherwise.
    /// Two concurrent claims for the same release cannot both succeed.
    pub fn claim(&self, query: &str, release: &Release) -> Result<bool, StoreError> {
        self.store
            .modify(&keys::last_seen(query), |current: Option<Watermark>| {
                let is_new = current.as_ref().map_or(true, |w| w.admits(release));
                if is_new {
                    let next = Watermark {
                        id: Some(release.id),
                        pre_at: Some(release.pre_at),
                    };
                    (Some(next), true)
                } else {
                    (current, false)
                }
            })
    }

    /// Forget the watermark of `query`.
    pub fn reset(&self, query: &str) -> Result<bool, StoreError> {
        self.store.delete(&keys::last_seen(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MemoryKvStore};

    fn tracker() -> LastSeenTracker {
        LastSeenTracker::new(Arc::new(MemoryKvStore::new()))
    }

    #[test]
    fn test_no_watermark_everything_is_new() {
        let tracker = tracker();
        let release = fixtures::release("Foo.Bar-GRP", 1, 100);
        assert!(tracker.get("foo bar").unwrap().is_none());
        assert!(tracker.is_new("foo bar", &release).unwrap());
    }

    #[test]
    fn test_claim_advances_and_blocks_older() {
        let tracker = tracker();
        assert!(tracker
            .claim("foo bar", &fixtures::release("a", 1, 100))
            .unwrap());

        let watermark = tracker.get("foo bar").unwrap().unwrap();
        assert_eq!(watermark.id, Some(1));
        assert_eq!(watermark.pre_at, Some(100));

        // equal and older are not new
        assert!(!tracker
            .claim("foo bar", &fixtures::release("b", 2, 100))
            .unwrap());
        assert!(!tracker
            .claim("foo bar", &fixtures::release("c", 3, 50))
            .unwrap());
        assert_eq!(tracker.get("foo bar").unwrap().unwrap().id, Some(1));

        assert!(tracker
            .claim("foo bar", &fixtures::release("d", 4, 101))
            .unwrap());
        assert_eq!(tracker.get("foo bar").unwrap().unwrap().pre_at, Some(101));
    }

    #[test]
    fn test_watermark_keyed_by_normalized_query() {
        let tracker = tracker();
        tracker
            .claim("Foo  Bar", &fixtures::release("a", 1, 100))
            .unwrap();
        assert!(tracker.get("foo bar").unwrap().is_some());
        assert!(!tracker
            .is_new("FOO BAR", &fixtures::release("a", 1, 100))
            .unwrap());
    }

    #[test]
    fn test_reset_makes_releases_new_again() {
        let tracker = tracker();
        let release = fixtures::release("a", 1, 100);
        tracker.claim("foo bar", &release).unwrap();
        assert!(tracker.reset("foo bar").unwrap());
        assert!(tracker.is_new("foo bar", &release).unwrap());
        assert!(!tracker.reset("foo bar").unwrap());
    }

    #[test]
    fn test_empty_watermark_admits_all() {
        let watermark = Watermark::default();
        assert!(watermark.admits(&fixtures::release("a", 1, 0)));
    }

    #[test]
    fn test_watermark_wire_format() {
        let watermark = Watermark {
            id: Some(5),
            pre_at: Some(10),
        };
        let value = serde_json::to_value(&watermark).unwrap();
        assert_eq!(value, serde_json::json!({"id": 5, "preAt": 10}));
    }
}
