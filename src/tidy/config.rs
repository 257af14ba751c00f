use serde::Deserialize;
use std::time::Duration;

use crate::tidy::error::TidyError;
use crate::tidy::storage::DEFAULT_PREFIX;
use crate::tidy::time_utils;

/// Default safety buffer: 72 hours.
pub const DEFAULT_SAFETY_BUFFER_SECS: u64 = 259_200;

/// Default interval between scheduled sweeps: 1 hour.
pub const DEFAULT_INTERVAL_SECS: u64 = 3600;

/// Predefined configuration presets for common deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPreset {
    /// Production-ready configuration.
    ///
    /// - Safety buffer: 72 hours (tolerates clock skew and lagging revocation)
    /// - Interval: 1 hour
    Production,

    /// Development-friendly configuration.
    ///
    /// - Safety buffer: 1 hour
    /// - Interval: 5 minutes
    Development,

    /// Load configuration from environment variables.
    ///
    /// Reads configuration from:
    /// - `ROLETAG_TIDY_SAFETY_BUFFER`: Safety buffer in seconds (default: 259200)
    /// - `ROLETAG_TIDY_PREFIX`: Storage prefix (default: `blacklist/roletag`)
    /// - `ROLETAG_TIDY_INTERVAL`: Interval between scheduled sweeps in seconds (default: 3600)
    FromEnv,
}

/// Configuration for the blacklist tidy.
///
/// # Environment Variables
///
/// - `ROLETAG_TIDY_SAFETY_BUFFER`: Safety buffer in seconds (default: 259200)
/// - `ROLETAG_TIDY_PREFIX`: Storage prefix (default: `blacklist/roletag`)
/// - `ROLETAG_TIDY_INTERVAL`: Interval between scheduled sweeps in seconds (default: 3600)
///
/// # Example
///
/// ```rust
/// use roletag_tidy::{ConfigPreset, TidyConfig};
/// use std::time::Duration;
///
/// let config = TidyConfig::from(ConfigPreset::Production);
/// assert_eq!(config.safety_buffer, Duration::from_secs(72 * 3600));
///
/// let config = TidyConfig {
///     safety_buffer: Duration::from_secs(24 * 3600),
///     ..TidyConfig::from(ConfigPreset::Production)
/// };
/// assert!(config.validate().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct TidyConfig {
    /// Extra time past expiration before an entry may be deleted
    pub safety_buffer: Duration,
    /// Storage prefix holding the blacklist entries
    pub prefix: String,
    /// Interval between scheduled sweeps
    pub interval: Duration,
}

impl Default for TidyConfig {
    fn default() -> Self {
        Self {
            safety_buffer: Duration::from_secs(
                std::env::var("ROLETAG_TIDY_SAFETY_BUFFER")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_SAFETY_BUFFER_SECS),
            ),
            prefix: std::env::var("ROLETAG_TIDY_PREFIX")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            interval: Duration::from_secs(
                std::env::var("ROLETAG_TIDY_INTERVAL")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_INTERVAL_SECS),
            ),
        }
    }
}

impl TidyConfig {
    /// Validates the configuration and returns any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.safety_buffer.is_zero() {
            warnings.push(
                "Zero safety buffer deletes entries as soon as they expire, with no allowance for clock skew"
                    .to_string(),
            );
        } else if self.safety_buffer.as_secs() < 3600 {
            warnings.push("Very short safety buffer (< 1 hour) may delete entries early under clock skew".to_string());
        }

        if self.interval.as_secs() < 60 {
            warnings.push("Very short tidy interval (< 1 minute) may cause heavy storage load".to_string());
        }
        if self.interval.is_zero() {
            warnings.push("Zero tidy interval is not allowed for scheduled sweeps".to_string());
        }

        if self.prefix.trim_matches('/').is_empty() {
            warnings.push("Empty prefix sweeps the storage root".to_string());
        }

        warnings
    }

    /// Returns a summary of the current configuration.
    pub fn summary(&self) -> String {
        format!(
            "TidyConfig {{ Safety Buffer: {}s, Prefix: {}, Interval: {}s }}",
            self.safety_buffer.as_secs(),
            self.prefix,
            self.interval.as_secs(),
        )
    }

    /// The timing half of this configuration, for [`spawn_tidy_task`].
    ///
    /// The prefix is applied when building the sweeper, see
    /// [`SweeperBuilder::with_config`].
    ///
    /// [`spawn_tidy_task`]: crate::spawn_tidy_task
    /// [`SweeperBuilder::with_config`]: crate::SweeperBuilder::with_config
    pub fn schedule(&self) -> TidySchedule {
        TidySchedule::from(self)
    }
}

/// When and how aggressively the background task sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TidySchedule {
    /// Interval between scheduled sweeps
    pub interval: Duration,
    /// Safety buffer passed to every scheduled sweep
    pub safety_buffer: Duration,
}

impl Default for TidySchedule {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            safety_buffer: Duration::from_secs(DEFAULT_SAFETY_BUFFER_SECS),
        }
    }
}

impl From<&TidyConfig> for TidySchedule {
    fn from(config: &TidyConfig) -> Self {
        Self {
            interval: config.interval,
            safety_buffer: config.safety_buffer,
        }
    }
}

impl From<ConfigPreset> for TidyConfig {
    fn from(preset: ConfigPreset) -> Self {
        match preset {
            ConfigPreset::Production => Self {
                safety_buffer: Duration::from_secs(DEFAULT_SAFETY_BUFFER_SECS),
                prefix: DEFAULT_PREFIX.to_string(),
                interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            },
            ConfigPreset::Development => Self {
                safety_buffer: Duration::from_secs(3600),
                prefix: DEFAULT_PREFIX.to_string(),
                interval: Duration::from_secs(300),
            },
            ConfigPreset::FromEnv => Self::default(),
        }
    }
}

/// A safety buffer as supplied by a caller: seconds or a duration string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SafetyBuffer {
    /// Whole seconds, e.g. `259200`
    Seconds(i64),
    /// Seconds or a human-readable duration, e.g. `"72h"` or `"1h 30m"`
    Text(String),
}

impl SafetyBuffer {
    /// Resolves to a non-negative duration.
    pub fn to_duration(&self) -> Result<Duration, TidyError> {
        match self {
            SafetyBuffer::Seconds(secs) => u64::try_from(*secs)
                .map(Duration::from_secs)
                .map_err(|_| TidyError::InvalidSafetyBuffer(format!("{secs} is negative"))),
            SafetyBuffer::Text(text) => time_utils::parse_duration(text),
        }
    }
}

/// Parameters of a tidy request coming from an administrative trigger.
///
/// ```rust
/// use roletag_tidy::TidyRequest;
/// use std::time::Duration;
///
/// let request: TidyRequest = serde_json::from_str(r#"{"safety_buffer": "1h"}"#).unwrap();
/// assert_eq!(request.safety_buffer().unwrap(), Duration::from_secs(3600));
///
/// let request: TidyRequest = serde_json::from_str("{}").unwrap();
/// assert_eq!(request.safety_buffer().unwrap(), Duration::from_secs(259_200));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TidyRequest {
    /// Safety buffer; 72 hours when omitted
    #[serde(default)]
    pub safety_buffer: Option<SafetyBuffer>,
}

impl TidyRequest {
    /// Request with an explicit safety buffer in seconds.
    pub fn with_seconds(secs: i64) -> Self {
        Self {
            safety_buffer: Some(SafetyBuffer::Seconds(secs)),
        }
    }

    /// The effective safety buffer, applying the 72 hour default.
    pub fn safety_buffer(&self) -> Result<Duration, TidyError> {
        match &self.safety_buffer {
            Some(buffer) => buffer.to_duration(),
            None => Ok(Duration::from_secs(DEFAULT_SAFETY_BUFFER_SECS)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env_vars() {
        unsafe {
            std::env::remove_var("ROLETAG_TIDY_SAFETY_BUFFER");
            std::env::remove_var("ROLETAG_TIDY_PREFIX");
            std::env::remove_var("ROLETAG_TIDY_INTERVAL");
        }
    }

    #[test]
    fn test_production_preset() {
        let config = TidyConfig::from(ConfigPreset::Production);
        assert_eq!(config.safety_buffer.as_secs(), 259_200);
        assert_eq!(config.prefix, "blacklist/roletag");
        assert_eq!(config.interval.as_secs(), 3600);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_schedule_carries_timing_only() {
        let config = TidyConfig {
            prefix: "blacklist/elsewhere".to_string(),
            ..TidyConfig::from(ConfigPreset::Development)
        };
        let schedule = config.schedule();
        assert_eq!(schedule.interval, Duration::from_secs(300));
        assert_eq!(schedule.safety_buffer, Duration::from_secs(3600));

        let defaults = TidySchedule::default();
        assert_eq!(defaults, TidyConfig::from(ConfigPreset::Production).schedule());
    }

    #[test]
    fn test_development_preset() {
        let config = TidyConfig::from(ConfigPreset::Development);
        assert_eq!(config.safety_buffer.as_secs(), 3600);
        assert_eq!(config.interval.as_secs(), 300);
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_env_vars();

        unsafe {
            std::env::set_var("ROLETAG_TIDY_SAFETY_BUFFER", "7200");
            std::env::set_var("ROLETAG_TIDY_PREFIX", "blacklist/custom");
            std::env::set_var("ROLETAG_TIDY_INTERVAL", "600");
        }

        let config = TidyConfig::from(ConfigPreset::FromEnv);
        assert_eq!(config.safety_buffer.as_secs(), 7200);
        assert_eq!(config.prefix, "blacklist/custom");
        assert_eq!(config.interval.as_secs(), 600);

        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_env_defaults_and_garbage() {
        clear_env_vars();

        unsafe {
            std::env::set_var("ROLETAG_TIDY_SAFETY_BUFFER", "not-a-number");
        }

        let config = TidyConfig::default();
        assert_eq!(config.safety_buffer.as_secs(), DEFAULT_SAFETY_BUFFER_SECS);
        assert_eq!(config.prefix, DEFAULT_PREFIX);
        assert_eq!(config.interval.as_secs(), DEFAULT_INTERVAL_SECS);

        clear_env_vars();
    }

    #[test]
    fn test_validation_warnings() {
        let config = TidyConfig {
            safety_buffer: Duration::ZERO,
            prefix: "/".to_string(),
            interval: Duration::from_secs(10),
        };
        let warnings = config.validate();
        assert!(warnings.iter().any(|w| w.contains("Zero safety buffer")));
        assert!(warnings.iter().any(|w| w.contains("Very short tidy interval")));
        assert!(warnings.iter().any(|w| w.contains("Empty prefix")));

        let config = TidyConfig {
            safety_buffer: Duration::from_secs(600),
            ..TidyConfig::from(ConfigPreset::Production)
        };
        assert!(
            config
                .validate()
                .iter()
                .any(|w| w.contains("Very short safety buffer"))
        );
    }

    #[test]
    fn test_summary() {
        let summary = TidyConfig::from(ConfigPreset::Production).summary();
        assert!(summary.contains("259200s"));
        assert!(summary.contains("blacklist/roletag"));
    }

    #[test]
    fn test_request_defaults_to_72_hours() {
        let request: TidyRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.safety_buffer().unwrap(), Duration::from_secs(259_200));

        let request: TidyRequest = serde_json::from_str(r#"{"safety_buffer": null}"#).unwrap();
        assert_eq!(request.safety_buffer().unwrap(), Duration::from_secs(259_200));
    }

    #[test]
    fn test_request_accepts_seconds_and_strings() {
        let request: TidyRequest = serde_json::from_str(r#"{"safety_buffer": 60}"#).unwrap();
        assert_eq!(request.safety_buffer().unwrap(), Duration::from_secs(60));

        let request: TidyRequest = serde_json::from_str(r#"{"safety_buffer": "120"}"#).unwrap();
        assert_eq!(request.safety_buffer().unwrap(), Duration::from_secs(120));

        let request: TidyRequest = serde_json::from_str(r#"{"safety_buffer": "72h"}"#).unwrap();
        assert_eq!(request.safety_buffer().unwrap(), Duration::from_secs(259_200));

        let request: TidyRequest = serde_json::from_str(r#"{"safety_buffer": "1h 30m"}"#).unwrap();
        assert_eq!(request.safety_buffer().unwrap(), Duration::from_secs(5400));

        let request: TidyRequest = serde_json::from_str(r#"{"safety_buffer": "500ms"}"#).unwrap();
        assert_eq!(request.safety_buffer().unwrap(), Duration::from_millis(500));
    }

    #[test]
    fn test_request_rejects_negative() {
        let request = TidyRequest::with_seconds(-1);
        assert!(matches!(
            request.safety_buffer(),
            Err(TidyError::InvalidSafetyBuffer(_))
        ));

        let request: TidyRequest = serde_json::from_str(r#"{"safety_buffer": "-5m"}"#).unwrap();
        assert!(request.safety_buffer().is_err());
    }
}
