use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use chrono::{DateTime, Utc};

use crate::tidy::config::TidyConfig;
use crate::tidy::storage::{BlacklistStorage, DEFAULT_PREFIX, MemoryStorage};
use crate::tidy::sweeper::ClockFn;
use crate::tidy::{Sweeper, TidyError};

#[cfg(feature = "metrics")]
use crate::tidy::metrics::{MetricsCollector, NoOpMetricsCollector};

/// A builder for creating a `Sweeper` instance.
///
/// This builder defaults to `MemoryStorage`, the `blacklist/roletag` prefix,
/// and the system clock.
#[must_use = "The builder does nothing unless `.build()` or `.build_and_init()` is called."]
pub struct SweeperBuilder<S: BlacklistStorage> {
    storage: Arc<S>,
    prefix: Option<String>,
    clock: Option<ClockFn>,
    #[cfg(feature = "metrics")]
    metrics_collector: Option<Arc<dyn MetricsCollector>>,
}

impl SweeperBuilder<MemoryStorage> {
    pub(crate) fn new() -> Self {
        Self {
            storage: Arc::new(MemoryStorage::new()),
            prefix: None,
            clock: None,
            #[cfg(feature = "metrics")]
            metrics_collector: None,
        }
    }
}

impl<S: BlacklistStorage> SweeperBuilder<S> {
    /// Specifies the storage backend to sweep instead of the default `MemoryStorage`.
    pub fn with_storage<T: BlacklistStorage>(self, storage: Arc<T>) -> SweeperBuilder<T> {
        SweeperBuilder {
            storage,
            prefix: self.prefix,
            clock: self.clock,
            #[cfg(feature = "metrics")]
            metrics_collector: self.metrics_collector,
        }
    }

    /// Sets the storage prefix holding the blacklist entries.
    ///
    /// If not set, defaults to `blacklist/roletag`. A trailing `/` is
    /// accepted and normalized.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Applies the storage prefix from a [`TidyConfig`].
    pub fn with_config(self, config: &TidyConfig) -> Self {
        self.with_prefix(config.prefix.clone())
    }

    /// Replaces the clock used for expiration checks.
    ///
    /// ```rust
    /// use roletag_tidy::Sweeper;
    /// use chrono::{TimeZone, Utc};
    ///
    /// let frozen = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    /// let sweeper = Sweeper::builder().with_clock(move || frozen).build();
    /// ```
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Sets the collector that receives sweep metrics.
    #[cfg(feature = "metrics")]
    pub fn with_metrics_collector(mut self, collector: Arc<dyn MetricsCollector>) -> Self {
        self.metrics_collector = Some(collector);
        self
    }

    /// Builds the sweeper without touching storage.
    pub fn build(self) -> Sweeper<S> {
        Sweeper {
            storage: self.storage,
            prefix: self
                .prefix
                .map(|p| p.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            running: AtomicBool::new(false),
            clock: self.clock.unwrap_or_else(|| Box::new(Utc::now) as ClockFn),
            #[cfg(feature = "metrics")]
            metrics_collector: self
                .metrics_collector
                .unwrap_or_else(|| Arc::new(NoOpMetricsCollector::new())),
        }
    }

    /// Initializes the storage backend, then builds the sweeper.
    pub async fn build_and_init(self) -> Result<Sweeper<S>, TidyError> {
        self.storage.init().await?;
        Ok(self.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_builder_defaults() {
        let sweeper = Sweeper::builder().build();
        assert_eq!(sweeper.prefix(), "blacklist/roletag");
        assert!(!sweeper.is_running());
    }

    #[test]
    fn test_builder_normalizes_prefix() {
        let sweeper = Sweeper::builder().with_prefix("custom/prefix/").build();
        assert_eq!(sweeper.prefix(), "custom/prefix");
    }

    #[test]
    fn test_builder_with_storage_keeps_settings() {
        let storage = Arc::new(MemoryStorage::new());
        let sweeper = Sweeper::builder()
            .with_prefix("custom")
            .with_storage(Arc::clone(&storage))
            .build();

        assert_eq!(sweeper.prefix(), "custom");
        assert!(Arc::ptr_eq(sweeper.storage(), &storage));
    }

    #[test]
    fn test_builder_with_config() {
        let config = TidyConfig {
            prefix: "blacklist/other/".to_string(),
            ..TidyConfig::from(crate::ConfigPreset::Development)
        };
        let sweeper = Sweeper::builder().with_config(&config).build();
        assert_eq!(sweeper.prefix(), "blacklist/other");
    }

    #[test]
    fn test_builder_with_clock() {
        let frozen = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let sweeper = Sweeper::builder().with_clock(move || frozen).build();
        assert_eq!((sweeper.clock)(), frozen);
    }

    #[tokio::test]
    async fn test_build_and_init() {
        let sweeper = Sweeper::builder().build_and_init().await.unwrap();
        assert!(sweeper.sweep(std::time::Duration::ZERO).await.is_ok());
    }
}
