// Core components
mod config;
mod entry;
mod error;
mod sweeper;
mod sweeper_builder;
mod time_utils;

// Storage and scheduling
pub mod schedule;
pub mod storage;

// Metrics (optional feature)
#[cfg(feature = "metrics")]
pub mod metrics;

// Core components exports
pub use config::{
    ConfigPreset, DEFAULT_INTERVAL_SECS, DEFAULT_SAFETY_BUFFER_SECS, SafetyBuffer, TidyConfig,
    TidyRequest, TidySchedule,
};
pub use entry::BlacklistEntry;
pub use error::{StorageError, TidyError};
pub use sweeper::{ClockFn, SweepReport, Sweeper};
pub use sweeper_builder::SweeperBuilder;

// Storage and scheduling exports
pub use schedule::spawn_tidy_task;
pub use storage::{BlacklistStorage, MemoryStorage, StorageStats};

// Metrics exports (optional feature)
#[cfg(feature = "metrics")]
pub use metrics::{
    ErrorMetrics, InMemoryMetricsCollector, MetricEvent, MetricsCollector, NoOpMetricsCollector,
    TidyMetrics,
};
