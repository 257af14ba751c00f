use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use super::config::TidyRequest;
use super::entry::BlacklistEntry;
use super::storage::{self, BlacklistStorage, MemoryStorage};
use super::time_utils;
use super::{SweeperBuilder, TidyError};

#[cfg(feature = "metrics")]
use super::metrics::{MetricEvent, MetricsCollector};

/// A function that provides the current time to the sweeper.
pub type ClockFn = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Outcome of a completed sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Entries listed and examined
    pub scanned: usize,
    /// Entries deleted
    pub deleted: usize,
    /// Entries kept because they are not yet past expiration plus buffer
    pub retained: usize,
    /// Wall time of the sweep
    pub elapsed: Duration,
}

/// Holds the single-flight flag for the duration of a sweep.
///
/// Dropping the guard releases the flag, so it is released on every return
/// path, on panic unwinding, and when the sweep future is dropped.
struct SweepGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SweepGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Removes expired role tag blacklist entries from storage.
///
/// Only one sweep runs at a time per `Sweeper`; a concurrent call fails with
/// [`TidyError::AlreadyRunning`] without touching storage. The flag is owned
/// by the instance, so independent sweepers never block each other. It does
/// not coordinate sweepers in separate processes sharing one backend.
///
/// A sweep is fail-fast: the first missing, empty, undecodable, or unreadable
/// entry aborts it before anything is deleted.
///
/// To create an instance, use the `Sweeper::builder()` method.
///
/// # Example
///
/// ```rust
/// use roletag_tidy::{BlacklistEntry, Sweeper};
/// use roletag_tidy::storage::{BlacklistStorage, MemoryStorage, join_key};
/// use chrono::{Duration, Utc};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let storage = Arc::new(MemoryStorage::new());
/// let stale = BlacklistEntry::new(Utc::now() - Duration::days(30), Duration::days(1));
/// storage
///     .put(&join_key("blacklist/roletag", "old-tag"), &stale.to_bytes()?)
///     .await?;
///
/// let sweeper = Sweeper::builder().with_storage(storage).build();
/// let report = sweeper.sweep(std::time::Duration::from_secs(72 * 3600)).await?;
/// assert_eq!(report.deleted, 1);
/// # Ok(())
/// # }
/// ```
pub struct Sweeper<S: BlacklistStorage> {
    pub(crate) storage: Arc<S>,
    pub(crate) prefix: String,
    pub(crate) running: AtomicBool,
    pub(crate) clock: ClockFn,
    #[cfg(feature = "metrics")]
    pub(crate) metrics_collector: Arc<dyn MetricsCollector>,
}

impl Sweeper<MemoryStorage> {
    /// Creates a new `SweeperBuilder`.
    ///
    /// The builder defaults to `MemoryStorage` and the `blacklist/roletag`
    /// prefix.
    pub fn builder() -> SweeperBuilder<MemoryStorage> {
        SweeperBuilder::new()
    }
}

impl<S: BlacklistStorage> Sweeper<S> {
    /// Runs one sweep with the given safety buffer.
    ///
    /// An entry is deleted iff `now > expiration_time + safety_buffer`.
    pub async fn sweep(&self, safety_buffer: Duration) -> Result<SweepReport, TidyError> {
        let started = Instant::now();
        let result = self.sweep_inner(safety_buffer, started).await;

        #[cfg(feature = "metrics")]
        {
            let event = match &result {
                Ok(report) => MetricEvent::SweepCompleted {
                    scanned: report.scanned,
                    deleted: report.deleted,
                    duration: report.elapsed,
                },
                Err(e) => MetricEvent::from_error(e, started.elapsed()),
            };
            self.metrics_collector.record_event(event).await;
        }

        result
    }

    /// Runs a sweep with the safety buffer carried by `request`.
    pub async fn handle_request(&self, request: &TidyRequest) -> Result<SweepReport, TidyError> {
        let safety_buffer = request.safety_buffer()?;
        self.sweep(safety_buffer).await
    }

    async fn sweep_inner(
        &self,
        safety_buffer: Duration,
        started: Instant,
    ) -> Result<SweepReport, TidyError> {
        let _guard = SweepGuard::try_acquire(&self.running).ok_or(TidyError::AlreadyRunning)?;
        let buffer = time_utils::to_chrono(safety_buffer)?;

        let tags = self
            .storage
            .list(&storage::list_prefix(&self.prefix))
            .await
            .map_err(TidyError::ListFailure)?;
        tracing::debug!(prefix = %self.prefix, entries = tags.len(), "Listed blacklist entries");

        // Every entry is validated before anything is deleted, so one bad
        // record leaves the whole namespace untouched.
        let mut expired = Vec::new();
        for tag in &tags {
            let key = storage::join_key(&self.prefix, tag);
            let entry = self.fetch_entry(&key).await?;

            if time_utils::is_expired((self.clock)(), entry.expiration_time, buffer) {
                expired.push(key);
            }
        }

        for key in &expired {
            self.storage
                .delete(key)
                .await
                .map_err(|source| TidyError::DeleteFailure {
                    key: key.clone(),
                    source,
                })?;
            tracing::trace!(key = %key, "Deleted expired blacklist entry");
        }

        Ok(SweepReport {
            scanned: tags.len(),
            deleted: expired.len(),
            retained: tags.len() - expired.len(),
            elapsed: started.elapsed(),
        })
    }

    async fn fetch_entry(&self, key: &str) -> Result<BlacklistEntry, TidyError> {
        let payload = self
            .storage
            .get(key)
            .await
            .map_err(|source| TidyError::FetchFailure {
                key: key.to_string(),
                source,
            })?
            .ok_or_else(|| TidyError::MissingEntry {
                key: key.to_string(),
            })?;

        if payload.is_empty() {
            return Err(TidyError::EmptyEntry {
                key: key.to_string(),
            });
        }

        BlacklistEntry::from_slice(&payload).map_err(|source| TidyError::DecodeFailure {
            key: key.to_string(),
            source,
        })
    }

    /// Whether a sweep currently holds the guard.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// The storage prefix this sweeper cleans.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns a reference to the storage backend.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}
