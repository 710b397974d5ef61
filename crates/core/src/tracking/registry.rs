use std::sync::Arc;

use crate::matcher::canonical;
use crate::store::{keys, KvStore, KvStoreExt, StoreError};

/// The set of queries at least one owner is subscribed to.
///
/// Backs the poll fan-out so the scheduler never scans owner records. Entries
/// are kept in canonical form and in insertion order.
#[derive(Clone)]
pub struct QueryRegistry {
    store: Arc<dyn KvStore>,
}

impl QueryRegistry {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Add `query`. Returns `false` if it was already registered.
    pub fn register(&self, query: &str) -> Result<bool, StoreError> {
        let query = canonical(query);
        self.store
            .modify(keys::ALL_QUERIES, |current: Option<Vec<String>>| {
                let mut queries = current.unwrap_or_default();
                if queries.contains(&query) {
                    (Some(queries), false)
                } else {
                    queries.push(query);
                    (Some(queries), true)
                }
            })
    }

    /// Remove `query`. The key is deleted once the set is empty.
    pub fn unregister(&self, query: &str) -> Result<bool, StoreError> {
        let query = canonical(query);
        self.store
            .modify(keys::ALL_QUERIES, |current: Option<Vec<String>>| {
                let mut queries = current.unwrap_or_default();
                let before = queries.len();
                queries.retain(|q| q != &query);
                let removed = queries.len() != before;
                if queries.is_empty() {
                    (None, removed)
                } else {
                    (Some(queries), removed)
                }
            })
    }

    /// All registered queries.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .store
            .get_as::<Vec<String>>(keys::ALL_QUERIES)?
            .unwrap_or_default())
    }

    pub fn contains(&self, query: &str) -> Result<bool, StoreError> {
        let query = canonical(query);
        Ok(self.list()?.contains(&query))
    }
}
