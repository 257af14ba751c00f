use thiserror::Error;

/// Errors reported by a storage backend.
///
/// Backends map their native errors (SQLite, Redis, ...) into one of these
/// variants so the sweeper can attach key context without knowing which
/// backend produced the failure.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backend rejected or failed an operation.
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// The backend could not be reached.
    #[error("Storage connection error: {0}")]
    Connection(String),
}

impl StorageError {
    /// Creates a [`StorageError::Backend`] from any message.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Creates a [`StorageError::Connection`] from any message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }
}

/// Error types that can occur during a blacklist tidy operation.
///
/// Every variant is returned to the caller as-is. The sweeper never skips an
/// entry it cannot process: a single anomaly aborts the whole sweep so that a
/// revoked tag is never silently left behind and storage corruption is never
/// masked.
///
/// # Error Categories
///
/// - **Concurrency**: `AlreadyRunning`
/// - **Storage**: `ListFailure`, `FetchFailure`, `DeleteFailure`, `Storage`
/// - **Data consistency**: `MissingEntry`, `EmptyEntry`, `DecodeFailure`
/// - **Input**: `InvalidSafetyBuffer`
///
/// # Example
///
/// ```rust
/// use roletag_tidy::{Sweeper, TidyError};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let sweeper = Sweeper::builder().build();
///
/// match sweeper.sweep(Duration::from_secs(72 * 3600)).await {
///     Ok(report) => println!("Deleted {} entries", report.deleted),
///     Err(TidyError::AlreadyRunning) => println!("Another tidy is in flight"),
///     Err(TidyError::EmptyEntry { key }) => println!("Corrupt entry at {key}"),
///     Err(e) => println!("Tidy failed: {e}"),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Error, Debug)]
pub enum TidyError {
    /// Another sweep on the same sweeper currently holds the guard.
    ///
    /// No storage operation was performed. Callers can treat this as benign
    /// and retry later.
    #[error("roletag blacklist tidy operation already running")]
    AlreadyRunning,

    /// Listing the blacklist namespace failed.
    #[error("failed to list blacklist entries: {0}")]
    ListFailure(#[source] StorageError),

    /// Fetching a listed entry failed.
    ///
    /// # When This Occurs
    ///
    /// - The backend connection dropped mid-sweep
    /// - The backend refused the read
    #[error("error fetching tag {key:?}: {source}")]
    FetchFailure {
        /// Storage key of the entry
        key: String,
        #[source]
        source: StorageError,
    },

    /// A listed key resolved to no record.
    ///
    /// The listing and the fetch disagree, which points at concurrent removal
    /// by another process or at an inconsistent backend.
    #[error("tag entry for tag {key:?} is missing")]
    MissingEntry {
        /// Storage key of the entry
        key: String,
    },

    /// A listed key resolved to a record with an empty payload.
    #[error("found entry for tag {key:?} but actual tag is empty")]
    EmptyEntry {
        /// Storage key of the entry
        key: String,
    },

    /// The payload could not be decoded as a blacklist entry.
    ///
    /// # Resolution
    ///
    /// Inspect the record at `key`; remove or repair it manually so that
    /// subsequent sweeps can make progress.
    #[error("failed to decode tag entry {key:?}: {source}")]
    DecodeFailure {
        /// Storage key of the entry
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Deleting an expired entry failed.
    #[error("error deleting tag {key:?} from storage: {source}")]
    DeleteFailure {
        /// Storage key of the entry
        key: String,
        #[source]
        source: StorageError,
    },

    /// The requested safety buffer is negative, malformed, or out of range.
    #[error("invalid safety buffer: {0}")]
    InvalidSafetyBuffer(String),

    /// A storage operation outside of a sweep failed (e.g. backend init).
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl TidyError {
    /// Returns a stable, machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            TidyError::AlreadyRunning => "already_running",
            TidyError::ListFailure(_) => "list_failure",
            TidyError::FetchFailure { .. } => "fetch_failure",
            TidyError::MissingEntry { .. } => "missing_entry",
            TidyError::EmptyEntry { .. } => "empty_entry",
            TidyError::DecodeFailure { .. } => "decode_failure",
            TidyError::DeleteFailure { .. } => "delete_failure",
            TidyError::InvalidSafetyBuffer(_) => "invalid_safety_buffer",
            TidyError::Storage(_) => "storage_error",
        }
    }

    /// Returns the storage key the error refers to, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            TidyError::FetchFailure { key, .. }
            | TidyError::MissingEntry { key }
            | TidyError::EmptyEntry { key }
            | TidyError::DecodeFailure { key, .. }
            | TidyError::DeleteFailure { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Whether the sweep was rejected because another one is in flight.
    pub fn is_already_running(&self) -> bool {
        matches!(self, TidyError::AlreadyRunning)
    }
}
