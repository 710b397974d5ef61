use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::SubscriptionConfig;
use crate::matcher::{canonical, is_similar, query_words};
use crate::store::{keys, KvStore, KvStoreExt};
use crate::tracking::{LastSeenTracker, QueryRegistry};

use super::types::{DeletedSubscription, Subscription, SubscriptionError, SubscriptionRecord};

/// Owner subscriptions plus the `query:` index and registry derived from them.
///
/// An owner appears in a query's index iff it holds at least one subscription
/// with that canonical query. Removing the last subscriber of a query also
/// unregisters it and resets its watermark.
#[derive(Clone)]
pub struct SubscriptionStore {
    store: Arc<dyn KvStore>,
    registry: QueryRegistry,
    last_seen: LastSeenTracker,
    config: SubscriptionConfig,
}

impl SubscriptionStore {
    pub fn new(store: Arc<dyn KvStore>, config: SubscriptionConfig) -> Self {
        Self {
            registry: QueryRegistry::new(Arc::clone(&store)),
            last_seen: LastSeenTracker::new(Arc::clone(&store)),
            store,
            config,
        }
    }

    /// Subscribe `owner_id` to `query`.
    ///
    /// Fails without touching the store when the query is invalid, duplicates
    /// an existing subscription of the owner, or the owner is at the limit.
    pub fn create(&self, owner_id: &str, query: &str) -> Result<Subscription, SubscriptionError> {
        let query = self.validate_query(query)?;
        let canon = canonical(&query);
        let user_key = keys::user(owner_id);

        let existing: Vec<SubscriptionRecord> =
            self.store.get_as(&user_key)?.unwrap_or_default();
        admit(&existing, &canon, self.config.max_per_owner)?;

        let record = SubscriptionRecord {
            id: Uuid::new_v4().to_string(),
            query: query.clone(),
            created: Utc::now().timestamp_millis(),
        };

        let limit = self.config.max_per_owner;
        let inserted = record.clone();
        self.store
            .modify(&user_key, move |current: Option<Vec<SubscriptionRecord>>| {
                let verdict = admit(current.as_deref().unwrap_or_default(), &canon, limit);
                match verdict {
                    Err(e) => (current, Err(e)),
                    Ok(()) => {
                        let mut records = current.unwrap_or_default();
                        records.push(inserted);
                        (Some(records), Ok(()))
                    }
                }
            })??;

        let canon = canonical(&query);
        self.store
            .modify(&keys::query(&canon), |current: Option<Vec<String>>| {
                let mut owners = current.unwrap_or_default();
                if !owners.iter().any(|o| o == owner_id) {
                    owners.push(owner_id.to_string());
                }
                (Some(owners), ())
            })?;
        self.registry.register(&canon)?;

        info!(owner = owner_id, query = %query, "Subscription created");
        Ok(record.into_subscription(owner_id))
    }

    /// Existing subscriptions of `owner_id` that look close to `query`.
    pub fn similar(
        &self,
        owner_id: &str,
        query: &str,
    ) -> Result<Vec<Subscription>, SubscriptionError> {
        Ok(self
            .list_by_owner(owner_id)?
            .into_iter()
            .filter(|sub| is_similar(query, &sub.query))
            .collect())
    }

    /// Subscriptions of `owner_id` in insertion order.
    pub fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Subscription>, SubscriptionError> {
        let records: Vec<SubscriptionRecord> = self
            .store
            .get_as(&keys::user(owner_id))?
            .unwrap_or_default();
        Ok(records
            .into_iter()
            .map(|r| r.into_subscription(owner_id))
            .collect())
    }

    /// Owners subscribed to `query`.
    pub fn owners_for(&self, query: &str) -> Result<Vec<String>, SubscriptionError> {
        Ok(self
            .store
            .get_as::<Vec<String>>(&keys::query(query))?
            .unwrap_or_default())
    }

    /// Remove one subscription of `owner_id`.
    pub fn delete(
        &self,
        owner_id: &str,
        subscription_id: &str,
    ) -> Result<DeletedSubscription, SubscriptionError> {
        let removed = self.store.modify(
            &keys::user(owner_id),
            |current: Option<Vec<SubscriptionRecord>>| {
                let Some(mut records) = current else {
                    return (None, None);
                };
                let Some(pos) = records.iter().position(|r| r.id == subscription_id) else {
                    return (Some(records), None);
                };
                let record = records.remove(pos);
                let canon = canonical(&record.query);
                let still_subscribed = records.iter().any(|r| canonical(&r.query) == canon);
                let next = if records.is_empty() {
                    None
                } else {
                    Some(records)
                };
                (next, Some((record, still_subscribed)))
            },
        )?;

        let Some((record, still_subscribed)) = removed else {
            return Err(SubscriptionError::NotFound);
        };

        let canon = canonical(&record.query);
        let mut query_retired = false;
        if !still_subscribed {
            query_retired = self.store.modify(
                &keys::query(&canon),
                |current: Option<Vec<String>>| {
                    let mut owners = current.unwrap_or_default();
                    owners.retain(|o| o != owner_id);
                    if owners.is_empty() {
                        (None, true)
                    } else {
                        (Some(owners), false)
                    }
                },
            )?;
        }

        if query_retired {
            query_retired = self.retire_query(&canon)?;
        }

        info!(owner = owner_id, query = %record.query, "Subscription deleted");
        Ok(DeletedSubscription {
            id: record.id,
            deleted_query: record.query,
            query_retired,
        })
    }

    /// Drop an unsubscribed query from the registry and forget its watermark.
    ///
    /// A create that lands on `query:` after it was emptied may have
    /// registered before the unregister below, so the index is read again
    /// afterwards and the query restored if it has owners. Returns whether
    /// the query stayed retired.
    fn retire_query(&self, canon: &str) -> Result<bool, SubscriptionError> {
        self.registry.unregister(canon)?;
        if !self.owners_for(canon)?.is_empty() {
            self.registry.register(canon)?;
            debug!(query = %canon, "Query resubscribed while retiring, kept registered");
            return Ok(false);
        }
        self.last_seen.reset(canon)?;
        debug!(query = %canon, "Query has no subscribers left");
        Ok(true)
    }

    /// Remove the first subscription of `owner_id` whose query equals `query`.
    pub fn unsubscribe(
        &self,
        owner_id: &str,
        query: &str,
    ) -> Result<DeletedSubscription, SubscriptionError> {
        let canon = canonical(query);
        let target = self
            .list_by_owner(owner_id)?
            .into_iter()
            .find(|sub| canonical(&sub.query) == canon)
            .ok_or(SubscriptionError::NotFound)?;
        self.delete(owner_id, &target.id)
    }

    fn validate_query(&self, query: &str) -> Result<String, SubscriptionError> {
        let query = query.trim();
        let len = query.chars().count();
        if len < self.config.min_query_len || len > self.config.max_query_len {
            return Err(SubscriptionError::InvalidQuery(format!(
                "Query must be between {} and {} characters.",
                self.config.min_query_len, self.config.max_query_len
            )));
        }
        if query_words(query).is_empty() {
            return Err(SubscriptionError::InvalidQuery(
                "Query needs at least one word of 3 or more characters.".to_string(),
            ));
        }
        Ok(query.to_string())
    }
}

fn admit(
    records: &[SubscriptionRecord],
    canon: &str,
    limit: usize,
) -> Result<(), SubscriptionError> {
    if let Some(existing) = records.iter().find(|r| canonical(&r.query) == canon) {
        return Err(SubscriptionError::Duplicate {
            query: existing.query.clone(),
        });
    }
    if limit != 0 && records.len() >= limit {
        return Err(SubscriptionError::LimitExceeded { limit });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use serde_json::Value;

    use super::*;
    use crate::store::{StoreError, UpdateFn};
    use crate::testing::{fixtures, MemoryKvStore};

    fn setup(max_per_owner: usize) -> (Arc<MemoryKvStore>, SubscriptionStore) {
        let store = Arc::new(MemoryKvStore::new());
        let config = SubscriptionConfig {
            max_per_owner,
            ..SubscriptionConfig::default()
        };
        let subs = SubscriptionStore::new(store.clone(), config);
        (store, subs)
    }

    #[test]
    fn test_create_writes_all_keys() {
        let (store, subs) = setup(0);
        let sub = subs.create("u1", "Foo Bar").unwrap();
        assert_eq!(sub.owner_id, "u1");
        assert_eq!(sub.query, "Foo Bar");
        assert!(!sub.id.is_empty());

        assert_eq!(subs.list_by_owner("u1").unwrap(), vec![sub]);
        assert_eq!(subs.owners_for("foo bar").unwrap(), vec!["u1"]);
        assert_eq!(
            store.get_as::<Vec<String>>("query:foo+bar").unwrap(),
            Some(vec!["u1".to_string()])
        );
        assert_eq!(
            store.get_as::<Vec<String>>(keys::ALL_QUERIES).unwrap(),
            Some(vec!["foo bar".to_string()])
        );
    }

    #[test]
    fn test_create_duplicate_is_case_insensitive() {
        let (_, subs) = setup(0);
        subs.create("u1", "foo bar").unwrap();
        let err = subs.create("u1", "FOO   BAR").unwrap_err();
        assert!(matches!(err, SubscriptionError::Duplicate { ref query } if query == "foo bar"));

        // another owner may subscribe to the same query
        subs.create("u2", "Foo Bar").unwrap();
        assert_eq!(subs.owners_for("foo bar").unwrap(), vec!["u1", "u2"]);
    }

    #[test]
    fn test_create_at_limit_does_not_mutate() {
        let (store, subs) = setup(2);
        subs.create("u1", "first query").unwrap();
        subs.create("u1", "second query").unwrap();

        let before = store.snapshot();
        let writes = store.writes();
        let err = subs.create("u1", "third query").unwrap_err();

        assert!(matches!(err, SubscriptionError::LimitExceeded { limit: 2 }));
        assert_eq!(store.writes(), writes);
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_create_validates_length() {
        let (store, subs) = setup(0);
        assert!(matches!(
            subs.create("u1", "abc"),
            Err(SubscriptionError::InvalidQuery(_))
        ));
        assert!(matches!(
            subs.create("u1", &"x".repeat(51)),
            Err(SubscriptionError::InvalidQuery(_))
        ));
        assert!(matches!(
            subs.create("u1", "a b c d"),
            Err(SubscriptionError::InvalidQuery(_))
        ));
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let (_, subs) = setup(0);
        for q in ["zeta query", "alpha query", "mid query"] {
            subs.create("u1", q).unwrap();
        }
        let queries: Vec<_> = subs
            .list_by_owner("u1")
            .unwrap()
            .into_iter()
            .map(|s| s.query)
            .collect();
        assert_eq!(queries, vec!["zeta query", "alpha query", "mid query"]);
    }

    #[test]
    fn test_delete_last_subscriber_retires_query() {
        let (store, subs) = setup(0);
        let sub = subs.create("u1", "foo bar").unwrap();
        subs.create("u1", "other thing").unwrap();
        store
            .set_as("lastSeen:foo+bar", &serde_json::json!({"id": 1, "preAt": 100}))
            .unwrap();

        let deleted = subs.delete("u1", &sub.id).unwrap();
        assert_eq!(deleted.deleted_query, "foo bar");
        assert!(deleted.query_retired);

        assert!(store.get("query:foo+bar").unwrap().is_none());
        assert!(store.get("lastSeen:foo+bar").unwrap().is_none());
        assert_eq!(
            store.get_as::<Vec<String>>(keys::ALL_QUERIES).unwrap(),
            Some(vec!["other thing".to_string()])
        );
        assert_eq!(subs.list_by_owner("u1").unwrap().len(), 1);
    }

    #[test]
    fn test_delete_keeps_query_with_other_subscribers() {
        let (store, subs) = setup(0);
        let sub = subs.create("u1", "foo bar").unwrap();
        subs.create("u2", "foo bar").unwrap();
        store
            .set_as("lastSeen:foo+bar", &serde_json::json!({"id": 1, "preAt": 100}))
            .unwrap();

        let deleted = subs.delete("u1", &sub.id).unwrap();
        assert!(!deleted.query_retired);
        assert_eq!(subs.owners_for("foo bar").unwrap(), vec!["u2"]);
        assert!(store.get("lastSeen:foo+bar").unwrap().is_some());
        assert!(store.get("user:u1").unwrap().is_none());
    }

    #[test]
    fn test_delete_unknown_is_not_found() {
        let (_, subs) = setup(0);
        assert!(matches!(
            subs.delete("u1", "missing"),
            Err(SubscriptionError::NotFound)
        ));
        subs.create("u1", "foo bar").unwrap();
        assert!(matches!(
            subs.delete("u1", "missing"),
            Err(SubscriptionError::NotFound)
        ));
        assert_eq!(subs.list_by_owner("u1").unwrap().len(), 1);
    }

    #[test]
    fn test_unsubscribe_by_query() {
        let (_, subs) = setup(0);
        subs.create("u1", "Foo Bar").unwrap();
        let deleted = subs.unsubscribe("u1", "foo  bar").unwrap();
        assert_eq!(deleted.deleted_query, "Foo Bar");
        assert!(subs.list_by_owner("u1").unwrap().is_empty());
        assert!(matches!(
            subs.unsubscribe("u1", "foo bar"),
            Err(SubscriptionError::NotFound)
        ));
    }

    #[test]
    fn test_similar_reports_close_queries() {
        let (_, subs) = setup(0);
        subs.create("u1", "ubuntu server").unwrap();
        subs.create("u1", "debian stable").unwrap();

        let similar = subs.similar("u1", "ubuntu server lts").unwrap();
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].query, "ubuntu server");

        assert!(subs.similar("u1", "ubuntu desktop").unwrap().is_empty());
        assert!(subs.similar("u2", "ubuntu server").unwrap().is_empty());
    }

    /// Writes another owner onto `query:foo+bar` right before the registry
    /// drops the query, like a create racing the delete.
    struct CreateDuringRetire {
        inner: MemoryKvStore,
        armed: AtomicBool,
    }

    impl KvStore for CreateDuringRetire {
        fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &Value) -> Result<(), StoreError> {
            self.inner.set(key, value)
        }

        fn delete(&self, key: &str) -> Result<bool, StoreError> {
            self.inner.delete(key)
        }

        fn update(&self, key: &str, apply: &mut UpdateFn<'_>) -> Result<(), StoreError> {
            if key == keys::ALL_QUERIES && self.armed.swap(false, Ordering::SeqCst) {
                self.inner
                    .set_as(&keys::query("foo bar"), &vec!["u2".to_string()])?;
            }
            self.inner.update(key, apply)
        }
    }

    #[test]
    fn test_delete_keeps_query_resubscribed_while_retiring() {
        let store = Arc::new(CreateDuringRetire {
            inner: MemoryKvStore::new(),
            armed: AtomicBool::new(false),
        });
        let subs = SubscriptionStore::new(store.clone(), SubscriptionConfig::default());
        let tracker = LastSeenTracker::new(store.clone());
        let registry = QueryRegistry::new(store.clone());

        let sub = subs.create("u1", "foo bar").unwrap();
        tracker
            .claim("foo bar", &fixtures::release("Foo.Bar-GRP", 1, 100))
            .unwrap();

        store.armed.store(true, Ordering::SeqCst);
        let deleted = subs.delete("u1", &sub.id).unwrap();

        assert!(!deleted.query_retired);
        assert!(registry.contains("foo bar").unwrap());
        assert_eq!(subs.owners_for("foo bar").unwrap(), vec!["u2"]);
        assert!(tracker.get("foo bar").unwrap().is_some());
    }

    #[test]
    fn test_resubscribe_starts_without_watermark() {
        let (store, subs) = setup(0);
        let tracker = LastSeenTracker::new(store.clone());
        let release = fixtures::release("Foo.Bar-GRP", 1, 100);

        let sub = subs.create("u1", "foo bar").unwrap();
        assert!(tracker.claim("foo bar", &release).unwrap());
        subs.delete("u1", &sub.id).unwrap();

        subs.create("u1", "foo bar").unwrap();
        assert!(tracker.get("foo bar").unwrap().is_none());
        assert!(tracker.is_new("foo bar", &release).unwrap());
    }
}
