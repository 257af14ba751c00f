//! Time utilities for expiration checks and safety buffer handling.

use crate::tidy::error::TidyError;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::time::Duration;

/// Converts a std duration into a chrono duration usable for timestamp math.
pub(crate) fn to_chrono(buffer: Duration) -> Result<ChronoDuration, TidyError> {
    ChronoDuration::from_std(buffer).map_err(|_| {
        TidyError::InvalidSafetyBuffer(format!("{}s is out of range", buffer.as_secs()))
    })
}

/// Whether an entry expiring at `expiration` is past `expiration + buffer` at `now`.
///
/// The comparison is strict: an entry is retained at the exact deadline. A
/// deadline that overflows the representable range is never reached.
pub(crate) fn is_expired(
    now: DateTime<Utc>,
    expiration: DateTime<Utc>,
    buffer: ChronoDuration,
) -> bool {
    match expiration.checked_add_signed(buffer) {
        Some(deadline) => now > deadline,
        None => false,
    }
}

/// Parses a duration given in seconds or in human-readable form.
///
/// Accepts bare integers (`"3600"`) and anything `humantime` understands
/// (`"72h"`, `"1h 30m"`, `"90s"`, `"500ms"`). Negative values are rejected.
pub(crate) fn parse_duration(input: &str) -> Result<Duration, TidyError> {
    let trimmed = input.trim();

    if trimmed.starts_with('-') {
        return Err(TidyError::InvalidSafetyBuffer(format!(
            "{input:?} is negative"
        )));
    }
    if let Ok(secs) = trimmed.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    humantime::parse_duration(trimmed).map_err(|e| {
        TidyError::InvalidSafetyBuffer(format!("cannot parse {input:?} as a duration: {e}"))
    })
}
