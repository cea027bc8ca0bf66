//! Key-value storage trait backing the search cache.

use crate::error::Result;

/// Flat string key-value storage.
///
/// Mirrors what a browser's local storage offers: string keys and values,
/// no expiry. All operations are synchronous to match rusqlite's API.
/// A write that would exceed the backend's capacity fails with
/// [`crate::FinderError::StorageQuotaExceeded`].
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set a value, overwriting any existing one.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Returns whether it existed.
    fn remove(&self, key: &str) -> Result<bool>;

    /// Keys starting with `prefix` that sort after `cursor`, ascending, at
    /// most `limit` of them.
    fn keys_after(&self, prefix: &str, cursor: Option<&str>, limit: usize) -> Result<Vec<String>>;
}
