//! The stored shape of a role tag blacklist record.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};

/// A role tag blacklist record as persisted in storage.
///
/// Entries are written by whatever component blacklists a role tag; the
/// sweeper only decodes them to read `expiration_time` and deletes them once
/// they are past expiration plus the safety buffer.
///
/// Timestamps serialize as RFC 3339 strings.
///
/// # Example
///
/// ```rust
/// use roletag_tidy::BlacklistEntry;
/// use chrono::{Duration, Utc};
///
/// let entry = BlacklistEntry::new(Utc::now(), Duration::hours(1));
/// let bytes = entry.to_bytes().unwrap();
/// let decoded = BlacklistEntry::from_slice(&bytes).unwrap();
/// assert_eq!(entry, decoded);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacklistEntry {
    /// When the tag was blacklisted.
    pub creation_time: DateTime<Utc>,
    /// When the blacklisted tag stops being valid anyway.
    pub expiration_time: DateTime<Utc>,
}

impl BlacklistEntry {
    /// Creates an entry blacklisted at `created` that expires `ttl` later.
    pub fn new(created: DateTime<Utc>, ttl: ChronoDuration) -> Self {
        Self {
            creation_time: created,
            expiration_time: created + ttl,
        }
    }

    /// Decodes an entry from its stored JSON payload.
    pub fn from_slice(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    /// Encodes the entry into the JSON payload stored under its key.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
