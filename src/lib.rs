//! # Roletag Tidy
//!
//! A single-flight sweeper that removes expired role tag blacklist entries
//! from a key-value store.
//!
//! Role tags that have been blacklisted are stored as JSON records under a
//! common prefix (`blacklist/roletag/<tag>`), each carrying the time at which
//! the tag would have stopped being valid anyway. Once that time plus a safety
//! buffer has passed, the blacklist record is no longer needed and can be
//! removed. This crate performs that removal.
//!
//! ## Features
//!
//! - **Single-flight**: Only one sweep runs at a time per sweeper; concurrent
//!   calls are rejected without touching storage
//! - **Guaranteed release**: The guard is released on every exit path,
//!   including cancelled futures
//! - **Safety buffer**: Entries are kept until `expiration + buffer` has
//!   strictly passed (72 hours by default)
//! - **Fail-fast**: A single missing, empty, or undecodable entry aborts the
//!   sweep before anything is deleted
//! - **Pluggable storage**: In-memory, SQLite (`sqlite-storage`) and Redis
//!   (`redis-storage`) backends
//! - **Scheduling**: Optional background task sweeping on an interval
//!
//! ## Quick Start
//!
//! ```rust
//! use roletag_tidy::{BlacklistEntry, Sweeper, TidyRequest};
//! use roletag_tidy::storage::{BlacklistStorage, MemoryStorage, join_key};
//! use chrono::{Duration, Utc};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = Arc::new(MemoryStorage::new());
//!
//! // Blacklisted ten days ago for one hour: long past the 72h buffer.
//! let old = BlacklistEntry::new(Utc::now() - Duration::days(10), Duration::hours(1));
//! storage.put(&join_key("blacklist/roletag", "old"), &old.to_bytes()?).await?;
//!
//! // Blacklisted just now: still needed.
//! let recent = BlacklistEntry::new(Utc::now(), Duration::hours(1));
//! storage.put(&join_key("blacklist/roletag", "recent"), &recent.to_bytes()?).await?;
//!
//! let sweeper = Sweeper::builder().with_storage(storage).build();
//! let report = sweeper.handle_request(&TidyRequest::default()).await?;
//!
//! assert_eq!(report.deleted, 1);
//! assert_eq!(report.retained, 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! [`TidyConfig`] reads its defaults from the environment:
//!
//! ```bash
//! export ROLETAG_TIDY_SAFETY_BUFFER=259200   # seconds
//! export ROLETAG_TIDY_PREFIX=blacklist/roletag
//! export ROLETAG_TIDY_INTERVAL=3600          # seconds between scheduled sweeps
//! ```
//!
//! ## Architecture
//!
//! - **[`Sweeper`]**: Owns the single-flight guard and runs sweeps
//! - **[`BlacklistStorage`]**: The storage collaborator (list, get, delete)
//! - **[`BlacklistEntry`]**: The stored record shape
//! - **[`TidyError`]**: Every way a sweep can fail
//! - **[`spawn_tidy_task`]**: Periodic trigger that logs outcomes

pub mod tidy;

// Re-export commonly used types
pub use tidy::{
    BlacklistEntry, BlacklistStorage, ClockFn, ConfigPreset, SafetyBuffer, StorageError, SweepReport,
    Sweeper, SweeperBuilder, TidyConfig, TidyError, TidyRequest, TidySchedule, spawn_tidy_task,
};
pub use tidy::storage;

#[cfg(feature = "metrics")]
pub use tidy::metrics;
