//! Background tidy task.
//!
//! Periodically sweeps the blacklist with the configured safety buffer and
//! logs the outcome. The sweeper itself only returns errors; this task is the
//! place they get reported.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{Level, debug, info, warn};

use super::config::TidySchedule;
use super::storage::BlacklistStorage;
use super::{Sweeper, TidyError};

/// Shortest interval the task will tick at.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Spawns a background task that sweeps every `schedule.interval`.
///
/// The task sweeps whatever prefix `sweeper` was built with; build it with
/// [`SweeperBuilder::with_config`](crate::SweeperBuilder::with_config) and
/// pass [`TidyConfig::schedule`](crate::TidyConfig::schedule) to drive both
/// from one configuration.
///
/// The first tick is skipped so the task does not sweep at startup. A tick
/// that finds another sweep in flight on the same sweeper (e.g. one started
/// by an administrative call) is skipped rather than queued.
///
/// Returns a `JoinHandle` that can be used to abort the task during shutdown.
///
/// # Example
///
/// ```rust
/// use roletag_tidy::{ConfigPreset, Sweeper, TidyConfig, spawn_tidy_task};
/// use std::sync::Arc;
///
/// # async fn example() {
/// let config = TidyConfig::from(ConfigPreset::Production);
/// let sweeper = Arc::new(Sweeper::builder().with_config(&config).build());
/// let handle = spawn_tidy_task(sweeper, config.schedule());
/// // Later, during shutdown:
/// handle.abort();
/// # }
/// ```
pub fn spawn_tidy_task<S>(sweeper: Arc<Sweeper<S>>, schedule: TidySchedule) -> JoinHandle<()>
where
    S: BlacklistStorage + 'static,
{
    if schedule.interval < MIN_INTERVAL {
        warn!(
            requested_ms = schedule.interval.as_millis() as u64,
            "Tidy interval below 1s; clamping"
        );
    }

    let period = schedule.interval.max(MIN_INTERVAL);
    let safety_buffer = schedule.safety_buffer;

    tokio::spawn(async move {
        info!(
            interval_secs = period.as_secs(),
            safety_buffer_secs = safety_buffer.as_secs(),
            prefix = %sweeper.prefix(),
            "Starting blacklist tidy task"
        );

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Skip the first immediate tick
        ticker.tick().await;

        loop {
            ticker.tick().await;
            run_once(&sweeper, safety_buffer).await;
        }
    })
}

/// Runs one sweep and logs its outcome.
async fn run_once<S: BlacklistStorage>(sweeper: &Sweeper<S>, safety_buffer: Duration) {
    match sweeper.sweep(safety_buffer).await {
        Ok(report) if report.deleted > 0 => {
            info!(
                deleted = report.deleted,
                retained = report.retained,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Blacklist tidy completed"
            );
        }
        Ok(report) => {
            debug!(retained = report.retained, "Blacklist tidy: no expired entries");
        }
        Err(TidyError::AlreadyRunning) => {
            debug!("Blacklist tidy skipped: another sweep is in flight");
        }
        Err(e) => {
            warn!(
                error = %e,
                code = e.code(),
                key = e.key().unwrap_or(""),
                "Blacklist tidy failed"
            );
        }
    }

    // Stats can cost a full scan of the backend; only pay for it when logged.
    if !tracing::enabled!(Level::DEBUG) {
        return;
    }
    match sweeper.storage().get_stats().await {
        Ok(stats) => {
            debug!(
                total_records = stats.total_records,
                backend = %stats.backend_info,
                "Blacklist storage status"
            );
        }
        Err(e) => {
            debug!(error = %e, "Failed to get storage stats");
        }
    }
}
