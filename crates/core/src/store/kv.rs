//! Store trait and typed helpers.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Errors raised by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("failed to (de)serialize value at {key}: {message}")]
    Serialization { key: String, message: String },
}

/// Closure applied by [`KvStore::update`]. Returning `None` deletes the key.
pub type UpdateFn<'a> = dyn FnMut(Option<Value>) -> Result<Option<Value>, StoreError> + 'a;

/// Trait for key-value storage backends.
pub trait KvStore: Send + Sync {
    /// Read the value stored at `key`.
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Overwrite the value stored at `key`.
    fn set(&self, key: &str, value: &Value) -> Result<(), StoreError>;

    /// Remove `key`. Returns whether it existed.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Read-modify-write `key` as one atomic step.
    ///
    /// No other mutation of `key` may interleave between the read handed to
    /// `apply` and the write of its result.
    fn update(&self, key: &str, apply: &mut UpdateFn<'_>) -> Result<(), StoreError>;
}

/// Typed access layered over [`KvStore`].
pub trait KvStoreExt: KvStore {
    /// Read and deserialize `key`.
    fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        self.get(key)?
            .map(|value| decode(key, value))
            .transpose()
    }

    /// Serialize and write `value` at `key`.
    fn set_as<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = encode(key, value)?;
        self.set(key, &value)
    }

    /// Atomically transform the typed value at `key`.
    ///
    /// `f` receives the current value and returns the replacement (`None`
    /// deletes) plus a result handed back to the caller.
    fn modify<T, R, F>(&self, key: &str, f: F) -> Result<R, StoreError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(Option<T>) -> (Option<T>, R),
    {
        let mut f = Some(f);
        let mut out = None;
        self.update(key, &mut |current| {
            let current = current.map(|v| decode::<T>(key, v)).transpose()?;
            let f = f.take().ok_or_else(|| {
                StoreError::Database(format!("update of {} applied more than once", key))
            })?;
            let (next, result) = f(current);
            out = Some(result);
            next.map(|v| encode(key, &v)).transpose()
        })?;
        out.ok_or_else(|| StoreError::Database(format!("update of {} was not applied", key)))
    }
}

impl<S: KvStore + ?Sized> KvStoreExt for S {}

fn decode<T: DeserializeOwned>(key: &str, value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|e| StoreError::Serialization {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn encode<T: Serialize>(key: &str, value: &T) -> Result<Value, StoreError> {
    serde_json::to_value(value).map_err(|e| StoreError::Serialization {
        key: key.to_string(),
        message: e.to_string(),
    })
}
