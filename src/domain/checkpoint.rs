//! Per-triple read checkpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::WatchKey;

/// Last acknowledgment of a `(user, wallet, query)` triple.
///
/// At most one exists per triple. Each acknowledgment replaces it in full;
/// nothing enforces that `last_read_timestamp` only moves forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadCheckpoint {
    /// Triple this checkpoint belongs to.
    pub key: WatchKey,
    /// Activities at or before this epoch-millisecond instant are read.
    pub last_read_timestamp: i64,
    /// Wall-clock time of the write. Informational only.
    pub last_updated: DateTime<Utc>,
}

impl ReadCheckpoint {
    /// Checkpoint acknowledging everything up to `now`.
    #[must_use]
    pub fn at(key: WatchKey, now: DateTime<Utc>) -> Self {
        Self {
            key,
            last_read_timestamp: now.timestamp_millis(),
            last_updated: now,
        }
    }
}
