//! Stored wallet activities and their read-time annotation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{QuerySignature, WatchKey};

/// One on-chain activity recorded for a watched `(wallet, query)`.
///
/// Written by the ingestion pipeline and immutable afterwards. The payload
/// is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    /// Partition key: owner of the watch.
    pub user_id: String,
    /// Position within the partition (see [`WatchKey::activity_sort_key`]).
    pub sort_key: String,
    /// Watched wallet address.
    pub wallet_address: String,
    /// Signature of the filter set that matched this activity.
    #[schema(value_type = String)]
    pub query_signature: QuerySignature,
    /// Ingestion-assigned identifier, unique within the triple.
    pub activity_id: String,
    /// Event time in epoch milliseconds.
    pub timestamp: i64,
    /// Event body as produced upstream.
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
}

impl ActivityRecord {
    /// Builds a record for `key`, deriving its sort key.
    #[must_use]
    pub fn new(
        key: &WatchKey,
        activity_id: impl Into<String>,
        timestamp: i64,
        payload: serde_json::Value,
    ) -> Self {
        let activity_id = activity_id.into();
        Self {
            user_id: key.user_id().to_string(),
            sort_key: key.activity_sort_key(timestamp, &activity_id),
            wallet_address: key.wallet_address().to_string(),
            query_signature: key.query_signature().clone(),
            activity_id,
            timestamp,
            payload,
        }
    }

    /// Whether this activity happened after the given checkpoint.
    #[must_use]
    pub const fn is_after(&self, last_read_timestamp: i64) -> bool {
        self.timestamp > last_read_timestamp
    }
}

/// An [`ActivityRecord`] classified against a read checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedActivity {
    /// The stored activity.
    #[serde(flatten)]
    pub activity: ActivityRecord,
    /// `true` when the activity is newer than the checkpoint.
    pub is_unread: bool,
}

impl AnnotatedActivity {
    /// Annotates `activity` against `last_read_timestamp`.
    #[must_use]
    pub fn classify(activity: ActivityRecord, last_read_timestamp: i64) -> Self {
        let is_unread = activity.is_after(last_read_timestamp);
        Self {
            activity,
            is_unread,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn record(ts: i64) -> ActivityRecord {
        let Ok(key) = WatchKey::new(Some("u1"), Some("w1"), Some("q1")) else {
            panic!("valid key");
        };
        ActivityRecord::new(&key, format!("a{ts}"), ts, serde_json::json!({"ts": ts}))
    }

    #[test]
    fn boundary_timestamp_counts_as_read() {
        assert!(!AnnotatedActivity::classify(record(250), 250).is_unread);
        assert!(AnnotatedActivity::classify(record(251), 250).is_unread);
    }

    #[test]
    fn annotation_serializes_flat() {
        let annotated = AnnotatedActivity::classify(record(100), 0);
        let Ok(json) = serde_json::to_value(&annotated) else {
            panic!("serialization failed");
        };
        assert_eq!(json["isUnread"], serde_json::json!(true));
        assert_eq!(json["walletAddress"], serde_json::json!("w1"));
        assert_eq!(json["payload"]["ts"], serde_json::json!(100));
    }
}
