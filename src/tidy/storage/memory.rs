//! In-memory storage backend implementation.
//!
//! This module provides a simple in-memory storage backend backed by an
//! ordered map. It's ideal for testing, development, and single-instance
//! deployments where persistence across restarts is not required.

use super::{BlacklistStorage, StorageStats, collect_children};
use crate::tidy::error::StorageError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A simple in-memory storage implementation.
///
/// Data lives in a `BTreeMap` wrapped in `Arc<RwLock<>>`, so clones of the
/// storage share the same records and listings come back in key order.
///
/// # Example
///
/// ```rust
/// use roletag_tidy::storage::{BlacklistStorage, MemoryStorage};
///
/// # async fn example() -> Result<(), roletag_tidy::StorageError> {
/// let storage = MemoryStorage::new();
///
/// storage.put("blacklist/roletag/abc", b"{}").await?;
/// assert_eq!(storage.list("blacklist/roletag/").await?, vec!["abc"]);
/// assert!(storage.get("blacklist/roletag/abc").await?.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    data: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    /// Creates a new, empty in-memory storage instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently stored.
    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    /// Whether the storage holds no records.
    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }
}

#[async_trait]
impl BlacklistStorage for MemoryStorage {
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let data = self.data.read().await;
        let keys = data
            .range(prefix.to_string()..)
            .map(|(key, _)| key.as_str())
            .take_while(|key| key.starts_with(prefix));
        Ok(collect_children(prefix, keys))
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let data = self.data.read().await;
        Ok(data.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        data.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        data.remove(key);
        Ok(())
    }

    async fn get_stats(&self) -> Result<StorageStats, StorageError> {
        let data = self.data.read().await;
        let payload_bytes: usize = data.iter().map(|(k, v)| k.len() + v.len()).sum();
        Ok(StorageStats {
            total_records: data.len(),
            backend_info: format!("In-memory BTreeMap storage (~{} bytes)", payload_bytes),
        })
    }
}
