//! Pluggable storage backends for blacklist entries.
//!
//! The sweeper only needs a flat key-value view of storage: list the keys
//! under a prefix, fetch a payload, delete a key. The available backends
//! depend on the enabled features.

use crate::tidy::error::StorageError;
use async_trait::async_trait;

// Always available
mod memory;
pub use memory::MemoryStorage;

// Feature-gated storage backends
#[cfg(feature = "sqlite-storage")]
mod sqlite;
#[cfg(feature = "sqlite-storage")]
pub use sqlite::SqliteStorage;

#[cfg(feature = "redis-storage")]
mod redis;
#[cfg(feature = "redis-storage")]
pub use redis::RedisStorage;

/// Prefix under which role tag blacklist entries live.
pub const DEFAULT_PREFIX: &str = "blacklist/roletag";

/// Builds the storage key of `tag` under `prefix`.
///
/// This is the only place keys are assembled; fetches and deletes both go
/// through it so they always address the same record.
///
/// ```rust
/// use roletag_tidy::storage::join_key;
///
/// assert_eq!(join_key("blacklist/roletag", "abc"), "blacklist/roletag/abc");
/// assert_eq!(join_key("blacklist/roletag/", "abc"), "blacklist/roletag/abc");
/// ```
pub fn join_key(prefix: &str, tag: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let mut key = String::with_capacity(prefix.len() + tag.len() + 1);
    key.push_str(prefix);
    key.push('/');
    key.push_str(tag);
    key
}

/// Builds the listing prefix for `prefix`, always ending in a single `/`.
pub fn list_prefix(prefix: &str) -> String {
    join_key(prefix, "")
}

/// Maps a full key to its direct child name under `list_prefix`.
///
/// Keys nested deeper are folded into their first path segment with a
/// trailing `/`, the way a hierarchical listing reports sub-folders.
pub(crate) fn child_name(list_prefix: &str, key: &str) -> Option<String> {
    let rest = key.strip_prefix(list_prefix)?;
    if rest.is_empty() {
        return None;
    }
    match rest.find('/') {
        Some(idx) => Some(rest[..=idx].to_string()),
        None => Some(rest.to_string()),
    }
}

/// Collects the sorted, de-duplicated direct children of `list_prefix`.
pub(crate) fn collect_children<'a, I>(list_prefix: &str, keys: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut children: Vec<String> = keys
        .into_iter()
        .filter_map(|key| child_name(list_prefix, key))
        .collect();
    children.sort();
    children.dedup();
    children
}

/// Statistics about the storage backend.
#[derive(Debug, Clone)]
pub struct StorageStats {
    /// Total number of records in storage
    pub total_records: usize,
    /// Additional backend-specific information
    pub backend_info: String,
}

/// Abstract storage backend the sweeper reads from and deletes in.
///
/// Operations are individually atomic per key; no multi-key transaction is
/// assumed. The sweeper performs no caching, so the backend is the sole source
/// of truth.
///
/// # Available Implementations
///
/// - [`MemoryStorage`] - Always available, in-memory map
/// - `SqliteStorage` - Available with `sqlite-storage` feature
/// - `RedisStorage` - Available with `redis-storage` feature
///
/// # Example Implementation
///
/// ```rust
/// use roletag_tidy::storage::{BlacklistStorage, StorageStats};
/// use roletag_tidy::StorageError;
/// use async_trait::async_trait;
/// use std::collections::BTreeMap;
/// use tokio::sync::RwLock;
///
/// #[derive(Default)]
/// pub struct CustomStorage {
///     data: RwLock<BTreeMap<String, Vec<u8>>>,
/// }
///
/// #[async_trait]
/// impl BlacklistStorage for CustomStorage {
///     async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
///         let data = self.data.read().await;
///         Ok(data
///             .keys()
///             .filter_map(|k| k.strip_prefix(prefix))
///             .filter(|rest| !rest.contains('/'))
///             .map(str::to_string)
///             .collect())
///     }
///
///     async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
///         Ok(self.data.read().await.get(key).cloned())
///     }
///
///     async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
///         self.data.write().await.insert(key.to_string(), value.to_vec());
///         Ok(())
///     }
///
///     async fn delete(&self, key: &str) -> Result<(), StorageError> {
///         self.data.write().await.remove(key);
///         Ok(())
///     }
///
///     async fn get_stats(&self) -> Result<StorageStats, StorageError> {
///         Ok(StorageStats {
///             total_records: self.data.read().await.len(),
///             backend_info: "Custom storage".to_string(),
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait BlacklistStorage: Send + Sync {
    /// Optional method for storage backend initialization.
    ///
    /// Called once by `SweeperBuilder::build_and_init`. Implementations can
    /// use it for schema creation or connection checks.
    async fn init(&self) -> Result<(), StorageError> {
        Ok(())
    }

    /// Lists the key suffixes directly under `prefix`.
    ///
    /// `prefix` ends with `/`. Returned names are relative to it; deeper keys
    /// appear once as their first segment followed by `/`.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Fetches the payload stored at `key`.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(bytes))` - The record exists (its payload may be empty)
    /// * `Ok(None)` - No record exists at `key`
    /// * `Err(StorageError)` - The backend failed
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Stores `value` at `key`, replacing any previous payload.
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Removes the record at `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Returns statistics about the storage backend.
    async fn get_stats(&self) -> Result<StorageStats, StorageError>;
}
