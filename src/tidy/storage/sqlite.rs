//! SQLite storage backend implementation.
//!
//! This module provides a persistent key-value table for blacklist entries.
//! It's ideal for single-instance deployments that need entries to survive
//! restarts.

use super::{BlacklistStorage, StorageStats, collect_children};
use crate::tidy::error::StorageError;
use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use std::sync::{Arc, Mutex, MutexGuard};

/// SQLite-based storage backend.
///
/// Records live in a single `blacklist_kv` table keyed by the full storage
/// key. Prefix listing matches on the leading characters of the key.
///
/// # Example
///
/// ```rust
/// use roletag_tidy::storage::{BlacklistStorage, SqliteStorage};
///
/// # async fn example() -> Result<(), roletag_tidy::StorageError> {
/// // File-based storage
/// let storage = SqliteStorage::new("roletag_tidy.db")?;
/// storage.init().await?;
///
/// // Or in-memory SQLite (for testing)
/// let memory_storage = SqliteStorage::new(":memory:")?;
/// # Ok(())
/// # }
/// ```
pub struct SqliteStorage {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Create a new SQLite storage backend.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the SQLite database file, or ":memory:" for in-memory database
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        let connection = if db_path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(db_path)
        };

        let connection = connection.map_err(|e| StorageError::connection(e.to_string()))?;

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.connection
            .lock()
            .map_err(|_| StorageError::backend("SQLite connection mutex poisoned"))
    }

    /// Create the schema if it doesn't exist.
    fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS blacklist_kv (
                key TEXT PRIMARY KEY NOT NULL,
                value BLOB NOT NULL
            )
            "#,
            [],
        )
        .map_err(|e| StorageError::backend(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl BlacklistStorage for SqliteStorage {
    async fn init(&self) -> Result<(), StorageError> {
        self.init_schema()
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare("SELECT key FROM blacklist_kv WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key")
            .map_err(|e| StorageError::backend(e.to_string()))?;

        let keys = stmt
            .query_map(params![prefix], |row| row.get::<_, String>(0))
            .map_err(|e| StorageError::backend(e.to_string()))?
            .collect::<Result<Vec<String>, _>>()
            .map_err(|e| StorageError::backend(e.to_string()))?;

        Ok(collect_children(prefix, keys.iter().map(String::as_str)))
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let conn = self.lock()?;

        conn.query_row(
            "SELECT value FROM blacklist_kv WHERE key = ?1",
            params![key],
            |row| row.get::<_, Vec<u8>>(0),
        )
        .optional()
        .map_err(|e| StorageError::backend(e.to_string()))
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO blacklist_kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .map_err(|e| StorageError::backend(e.to_string()))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let conn = self.lock()?;

        conn.execute("DELETE FROM blacklist_kv WHERE key = ?1", params![key])
            .map_err(|e| StorageError::backend(e.to_string()))?;

        Ok(())
    }

    async fn get_stats(&self) -> Result<StorageStats, StorageError> {
        let conn = self.lock()?;

        let count: usize = conn
            .query_row("SELECT COUNT(*) FROM blacklist_kv", [], |row| row.get(0))
            .map_err(|e| StorageError::backend(e.to_string()))?;

        let page_count: i64 = conn
            .query_row("PRAGMA page_count", [], |row| row.get(0))
            .unwrap_or(0);

        let page_size: i64 = conn
            .query_row("PRAGMA page_size", [], |row| row.get(0))
            .unwrap_or(4096);

        Ok(StorageStats {
            total_records: count,
            backend_info: format!(
                "SQLite storage ({} bytes, {} pages)",
                page_count * page_size,
                page_count
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_storage() -> Result<SqliteStorage, StorageError> {
        let storage = SqliteStorage::new(":memory:")?;
        storage.init().await?;
        Ok(storage)
    }

    #[tokio::test]
    async fn test_sqlite_storage_basic_operations() -> Result<(), StorageError> {
        let storage = memory_storage().await?;

        storage.put("blacklist/roletag/t1", b"payload").await?;
        assert_eq!(
            storage.get("blacklist/roletag/t1").await?,
            Some(b"payload".to_vec())
        );

        storage.put("blacklist/roletag/t1", b"replaced").await?;
        assert_eq!(
            storage.get("blacklist/roletag/t1").await?,
            Some(b"replaced".to_vec())
        );

        storage.delete("blacklist/roletag/t1").await?;
        assert_eq!(storage.get("blacklist/roletag/t1").await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_sqlite_storage_list() -> Result<(), StorageError> {
        let storage = memory_storage().await?;
        storage.put("blacklist/roletag/b", b"1").await?;
        storage.put("blacklist/roletag/a", b"1").await?;
        storage.put("blacklist/roletag/sub/c", b"1").await?;
        storage.put("blacklist/roletagX", b"1").await?;

        let listed = storage.list("blacklist/roletag/").await?;
        assert_eq!(listed, vec!["a", "b", "sub/"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_sqlite_storage_empty_payload() -> Result<(), StorageError> {
        let storage = memory_storage().await?;
        storage.put("blacklist/roletag/t1", b"").await?;
        assert_eq!(storage.get("blacklist/roletag/t1").await?, Some(Vec::new()));
        Ok(())
    }

    #[tokio::test]
    async fn test_sqlite_storage_stats() -> Result<(), StorageError> {
        let storage = memory_storage().await?;
        storage.put("blacklist/roletag/t1", b"1").await?;

        let stats = storage.get_stats().await?;
        assert_eq!(stats.total_records, 1);
        assert!(stats.backend_info.contains("SQLite"));
        Ok(())
    }

    #[tokio::test]
    async fn test_sqlite_storage_requires_init() -> Result<(), StorageError> {
        let storage = SqliteStorage::new(":memory:")?;
        assert!(storage.list("blacklist/roletag/").await.is_err());
        Ok(())
    }
}
