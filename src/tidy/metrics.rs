//! Metrics collection for tidy sweeps.
//!
//! This module provides a pluggable metrics system for tracking how often
//! sweeps run, how much they delete, and why they fail. Metrics collection is
//! optional and enabled via the `metrics` feature.

use crate::TidyError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Core metrics tracked across sweeps.
#[derive(Debug, Clone, Default)]
pub struct TidyMetrics {
    /// Sweeps that ran to completion
    pub sweeps_completed: u64,
    /// Sweeps that acquired the guard but aborted
    pub sweeps_failed: u64,
    /// Sweeps rejected because another was in flight
    pub sweeps_rejected: u64,
    /// Entries examined by completed sweeps
    pub entries_scanned: u64,
    /// Entries deleted by completed sweeps
    pub entries_deleted: u64,
    /// Failure counts by category
    pub error_counts: ErrorMetrics,
    /// Average wall time of a completed sweep (microseconds)
    pub avg_sweep_time_us: u64,
}

/// Failure counts by category.
#[derive(Debug, Clone, Default)]
pub struct ErrorMetrics {
    /// Listing, fetch and delete failures
    pub storage_errors: u64,
    /// Missing, empty and undecodable entries
    pub data_errors: u64,
    /// Anything else
    pub other_errors: u64,
}

/// Events that can be tracked by the metrics system.
#[derive(Debug, Clone)]
pub enum MetricEvent {
    /// A sweep completed
    SweepCompleted {
        /// Entries examined
        scanned: usize,
        /// Entries deleted
        deleted: usize,
        /// Time taken
        duration: Duration,
    },
    /// A sweep was rejected by the single-flight guard
    SweepRejected,
    /// A sweep aborted
    SweepFailed {
        /// The error code that occurred
        error_code: &'static str,
        /// Error message
        error_message: String,
        /// Time taken until the abort
        duration: Duration,
    },
}

impl MetricEvent {
    /// Builds the failure or rejection event for `error`.
    pub fn from_error(error: &TidyError, duration: Duration) -> Self {
        if error.is_already_running() {
            return MetricEvent::SweepRejected;
        }
        MetricEvent::SweepFailed {
            error_code: error.code(),
            error_message: error.to_string(),
            duration,
        }
    }
}

/// Trait for metrics collection backends.
///
/// Implementations must be thread-safe; events may be recorded concurrently
/// from several sweepers.
#[async_trait]
pub trait MetricsCollector: Send + Sync {
    /// Record a metric event.
    async fn record_event(&self, event: MetricEvent);

    /// Get current metrics snapshot.
    async fn get_metrics(&self) -> Result<TidyMetrics, TidyError>;

    /// Reset all metrics to zero.
    async fn reset_metrics(&self) -> Result<(), TidyError>;

    /// Flush any buffered metrics.
    async fn flush(&self) -> Result<(), TidyError> {
        Ok(())
    }
}

/// Simple in-memory metrics collector using atomic counters.
///
/// # Example
///
/// ```rust
/// use roletag_tidy::metrics::{InMemoryMetricsCollector, MetricsCollector, MetricEvent};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), roletag_tidy::TidyError> {
/// let collector = InMemoryMetricsCollector::new();
///
/// collector.record_event(MetricEvent::SweepCompleted {
///     scanned: 10,
///     deleted: 3,
///     duration: Duration::from_millis(5),
/// }).await;
///
/// let metrics = collector.get_metrics().await?;
/// assert_eq!(metrics.entries_deleted, 3);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct InMemoryMetricsCollector {
    sweeps_completed: AtomicU64,
    sweeps_failed: AtomicU64,
    sweeps_rejected: AtomicU64,
    entries_scanned: AtomicU64,
    entries_deleted: AtomicU64,

    storage_errors: AtomicU64,
    data_errors: AtomicU64,
    other_errors: AtomicU64,

    sweep_time_total: AtomicU64,
}

impl InMemoryMetricsCollector {
    /// Create a new in-memory metrics collector.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetricsCollector for InMemoryMetricsCollector {
    async fn record_event(&self, event: MetricEvent) {
        match event {
            MetricEvent::SweepCompleted {
                scanned,
                deleted,
                duration,
            } => {
                self.sweeps_completed.fetch_add(1, Ordering::Relaxed);
                self.entries_scanned
                    .fetch_add(scanned as u64, Ordering::Relaxed);
                self.entries_deleted
                    .fetch_add(deleted as u64, Ordering::Relaxed);
                self.sweep_time_total
                    .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
            }
            MetricEvent::SweepRejected => {
                self.sweeps_rejected.fetch_add(1, Ordering::Relaxed);
            }
            MetricEvent::SweepFailed { error_code, .. } => {
                self.sweeps_failed.fetch_add(1, Ordering::Relaxed);
                let counter = match error_code {
                    "list_failure" | "fetch_failure" | "delete_failure" | "storage_error" => {
                        &self.storage_errors
                    }
                    "missing_entry" | "empty_entry" | "decode_failure" => &self.data_errors,
                    _ => &self.other_errors,
                };
                counter.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    async fn get_metrics(&self) -> Result<TidyMetrics, TidyError> {
        let sweeps_completed = self.sweeps_completed.load(Ordering::Relaxed);
        let sweep_time_total = self.sweep_time_total.load(Ordering::Relaxed);

        Ok(TidyMetrics {
            sweeps_completed,
            sweeps_failed: self.sweeps_failed.load(Ordering::Relaxed),
            sweeps_rejected: self.sweeps_rejected.load(Ordering::Relaxed),
            entries_scanned: self.entries_scanned.load(Ordering::Relaxed),
            entries_deleted: self.entries_deleted.load(Ordering::Relaxed),
            error_counts: ErrorMetrics {
                storage_errors: self.storage_errors.load(Ordering::Relaxed),
                data_errors: self.data_errors.load(Ordering::Relaxed),
                other_errors: self.other_errors.load(Ordering::Relaxed),
            },
            avg_sweep_time_us: sweep_time_total
                .checked_div(sweeps_completed)
                .unwrap_or(0),
        })
    }

    async fn reset_metrics(&self) -> Result<(), TidyError> {
        for counter in [
            &self.sweeps_completed,
            &self.sweeps_failed,
            &self.sweeps_rejected,
            &self.entries_scanned,
            &self.entries_deleted,
            &self.storage_errors,
            &self.data_errors,
            &self.other_errors,
            &self.sweep_time_total,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        Ok(())
    }
}

/// A collector that discards every event.
#[derive(Debug, Default)]
pub struct NoOpMetricsCollector;

impl NoOpMetricsCollector {
    /// Create a new no-op collector.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MetricsCollector for NoOpMetricsCollector {
    async fn record_event(&self, _event: MetricEvent) {}

    async fn get_metrics(&self) -> Result<TidyMetrics, TidyError> {
        Ok(TidyMetrics::default())
    }

    async fn reset_metrics(&self) -> Result<(), TidyError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StorageError;

    #[tokio::test]
    async fn test_in_memory_collector_completed_sweeps() {
        let collector = InMemoryMetricsCollector::new();

        collector
            .record_event(MetricEvent::SweepCompleted {
                scanned: 4,
                deleted: 1,
                duration: Duration::from_micros(100),
            })
            .await;
        collector
            .record_event(MetricEvent::SweepCompleted {
                scanned: 6,
                deleted: 2,
                duration: Duration::from_micros(300),
            })
            .await;

        let metrics = collector.get_metrics().await.unwrap();
        assert_eq!(metrics.sweeps_completed, 2);
        assert_eq!(metrics.entries_scanned, 10);
        assert_eq!(metrics.entries_deleted, 3);
        assert_eq!(metrics.avg_sweep_time_us, 200);
    }

    #[tokio::test]
    async fn test_in_memory_collector_failures() {
        let collector = InMemoryMetricsCollector::new();

        let errors = [
            TidyError::AlreadyRunning,
            TidyError::ListFailure(StorageError::backend("x")),
            TidyError::EmptyEntry {
                key: "k".to_string(),
            },
            TidyError::InvalidSafetyBuffer("-1".to_string()),
        ];
        for error in &errors {
            collector
                .record_event(MetricEvent::from_error(error, Duration::ZERO))
                .await;
        }

        let metrics = collector.get_metrics().await.unwrap();
        assert_eq!(metrics.sweeps_rejected, 1);
        assert_eq!(metrics.sweeps_failed, 3);
        assert_eq!(metrics.error_counts.storage_errors, 1);
        assert_eq!(metrics.error_counts.data_errors, 1);
        assert_eq!(metrics.error_counts.other_errors, 1);
        assert_eq!(metrics.avg_sweep_time_us, 0);
    }

    #[tokio::test]
    async fn test_reset_metrics() {
        let collector = InMemoryMetricsCollector::new();
        collector.record_event(MetricEvent::SweepRejected).await;
        collector.reset_metrics().await.unwrap();

        let metrics = collector.get_metrics().await.unwrap();
        assert_eq!(metrics.sweeps_rejected, 0);
    }

    #[tokio::test]
    async fn test_noop_collector() {
        let collector = NoOpMetricsCollector::new();
        collector.record_event(MetricEvent::SweepRejected).await;
        let metrics = collector.get_metrics().await.unwrap();
        assert_eq!(metrics.sweeps_rejected, 0);
        collector.flush().await.unwrap();
    }
}
