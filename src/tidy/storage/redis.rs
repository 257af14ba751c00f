//! Redis storage backend implementation.
//!
//! This module stores blacklist entries as plain Redis strings, with the
//! storage key namespaced under a configurable Redis key prefix. Listing uses
//! SCAN rather than KEYS.

use super::{BlacklistStorage, StorageStats, collect_children};
use crate::tidy::error::StorageError;
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Redis-based storage backend.
///
/// # Example
///
/// ```rust
/// use roletag_tidy::storage::RedisStorage;
///
/// # fn example() -> Result<(), roletag_tidy::StorageError> {
/// let storage = RedisStorage::new("redis://localhost:6379", "vault_aws")?;
/// # Ok(())
/// # }
/// ```
pub struct RedisStorage {
    client: Client,
    key_prefix: String,
    /// Shared persistent connection
    conn: Arc<Mutex<Option<MultiplexedConnection>>>,
}

impl RedisStorage {
    /// Create a new Redis storage backend.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "redis://localhost:6379")
    /// * `key_prefix` - Redis namespace prepended to every storage key
    pub fn new(redis_url: &str, key_prefix: &str) -> Result<Self, StorageError> {
        let client = Client::open(redis_url)
            .map_err(|e| StorageError::connection(format!("Redis client error: {e}")))?;

        Ok(Self {
            client,
            key_prefix: key_prefix.to_string(),
            conn: Arc::new(Mutex::new(None)),
        })
    }

    /// Get or create a persistent connection.
    async fn get_connection(&self) -> Result<MultiplexedConnection, StorageError> {
        let mut conn_guard = self.conn.lock().await;

        if let Some(conn) = conn_guard.as_ref() {
            let mut test_conn = conn.clone();
            match redis::cmd("PING")
                .query_async::<_, String>(&mut test_conn)
                .await
            {
                Ok(_) => return Ok(conn.clone()),
                Err(_) => {
                    *conn_guard = None;
                }
            }
        }

        let new_conn = self
            .client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e| StorageError::connection(format!("Redis connection failed: {e}")))?;

        *conn_guard = Some(new_conn.clone());
        Ok(new_conn)
    }

    /// Redis key for a storage key.
    fn redis_key(&self, key: &str) -> String {
        let mut redis_key = String::with_capacity(self.key_prefix.len() + key.len() + 1);
        redis_key.push_str(&self.key_prefix);
        redis_key.push(':');
        redis_key.push_str(key);
        redis_key
    }

    /// Escape glob metacharacters so a storage prefix matches literally.
    fn escape_pattern(raw: &str) -> String {
        let mut escaped = String::with_capacity(raw.len());
        for ch in raw.chars() {
            if matches!(ch, '*' | '?' | '[' | ']' | '\\') {
                escaped.push('\\');
            }
            escaped.push(ch);
        }
        escaped
    }

    /// Scan keys matching `pattern`.
    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, StorageError> {
        let mut conn = self.get_connection().await?;
        let mut keys = Vec::new();
        let mut cursor = 0u64;

        loop {
            let (new_cursor, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await
                .map_err(|e| StorageError::backend(e.to_string()))?;

            keys.extend(batch);
            cursor = new_cursor;

            if cursor == 0 {
                break;
            }
        }

        Ok(keys)
    }
}

#[async_trait]
impl BlacklistStorage for RedisStorage {
    async fn init(&self) -> Result<(), StorageError> {
        let mut conn = self.get_connection().await?;

        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| StorageError::connection(format!("Redis ping failed: {e}")))?;

        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let full_prefix = self.redis_key(prefix);
        let pattern = format!("{}*", Self::escape_pattern(&full_prefix));
        let keys = self.scan_keys(&pattern).await?;

        // SCAN may return a key more than once; collect_children dedups.
        Ok(collect_children(&full_prefix, keys.iter().map(String::as_str)))
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let mut conn = self.get_connection().await?;

        let value: Option<Vec<u8>> = conn
            .get(self.redis_key(key))
            .await
            .map_err(|e| StorageError::backend(e.to_string()))?;

        Ok(value)
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let mut conn = self.get_connection().await?;

        conn.set::<_, _, ()>(self.redis_key(key), value)
            .await
            .map_err(|e| StorageError::backend(e.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut conn = self.get_connection().await?;

        conn.del::<_, ()>(self.redis_key(key))
            .await
            .map_err(|e| StorageError::backend(e.to_string()))
    }

    async fn get_stats(&self) -> Result<StorageStats, StorageError> {
        let pattern = format!("{}:*", Self::escape_pattern(&self.key_prefix));
        let total_records = self.scan_keys(&pattern).await?.len();

        Ok(StorageStats {
            total_records,
            backend_info: format!(
                "Redis storage (prefix: {}, persistent conn)",
                self.key_prefix
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These tests require a running Redis instance and skip otherwise.
    async fn get_test_storage(namespace: &str) -> Option<RedisStorage> {
        let storage = RedisStorage::new("redis://localhost:6379", namespace).ok()?;
        match storage.init().await {
            Ok(()) => Some(storage),
            Err(_) => {
                println!("Skipping Redis tests - no Redis server available");
                None
            }
        }
    }

    async fn clear(storage: &RedisStorage) {
        if let Ok(children) = storage.list("blacklist/roletag/").await {
            for child in children {
                let _ = storage
                    .delete(&format!("blacklist/roletag/{child}"))
                    .await;
            }
        }
    }

    #[test]
    fn test_redis_key_and_pattern() {
        let storage = RedisStorage::new("redis://localhost:6379", "ns").unwrap();
        assert_eq!(
            storage.redis_key("blacklist/roletag/t1"),
            "ns:blacklist/roletag/t1"
        );
        assert_eq!(RedisStorage::escape_pattern("a*b?[c]"), "a\\*b\\?\\[c\\]");
    }

    #[tokio::test]
    async fn test_redis_storage_basic_operations() {
        let Some(storage) = get_test_storage("test_roletag_tidy_basic").await else {
            return;
        };
        clear(&storage).await;

        storage.put("blacklist/roletag/t1", b"payload").await.unwrap();
        assert_eq!(
            storage.get("blacklist/roletag/t1").await.unwrap(),
            Some(b"payload".to_vec())
        );
        assert_eq!(
            storage.list("blacklist/roletag/").await.unwrap(),
            vec!["t1"]
        );

        storage.delete("blacklist/roletag/t1").await.unwrap();
        assert_eq!(storage.get("blacklist/roletag/t1").await.unwrap(), None);
    }
}
