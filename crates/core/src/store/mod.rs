//! Key-value persistence contract.
//!
//! Every component receives an `Arc<dyn KvStore>` at construction. Values are
//! JSON documents; `KvStoreExt` adds typed access on top of the raw contract.

pub mod keys;
mod kv;
mod sqlite;

pub use kv::{KvStore, KvStoreExt, StoreError, UpdateFn};
pub use sqlite::SqliteKvStore;
