//! Composite keys for the partitioned activity and checkpoint stores.
//!
//! Both stores partition by user. Within a partition:
//!
//! ```text
//! checkpoint sort key: {wallet}#{signature}
//! activity sort key:   {wallet}#{signature}#{inverted_ts:020}#{activity_id}
//! ```
//!
//! `#` and `%` inside the signature are percent-escaped so that no
//! signature can be a prefix-extension of another.
//!
//! The inverted timestamp makes ascending sort-key order equal to
//! descending recency across the whole `i64` range, so a forward range scan
//! over the `{wallet}#{signature}#` prefix yields the most recent activity
//! first.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::QuerySignature;
use crate::error::TrackerError;

/// Separator between sort-key components.
pub const KEY_DELIMITER: char = '#';

/// Validated `(user, wallet, query signature)` triple.
///
/// Construction is the single place where the "required, non-empty" rules
/// for these three inputs are enforced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WatchKey {
    user_id: String,
    wallet_address: String,
    query_signature: QuerySignature,
}

impl WatchKey {
    /// Builds a key from raw request values.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidInput`] if any component is missing,
    /// or if the wallet address contains the key delimiter.
    pub fn new(
        user_id: Option<&str>,
        wallet_address: Option<&str>,
        query_signature: Option<&str>,
    ) -> Result<Self, TrackerError> {
        let (user_id, wallet_address) = validate_owner(user_id, wallet_address)?;
        let query_signature = QuerySignature::parse(query_signature.unwrap_or_default())?;
        Ok(Self {
            user_id,
            wallet_address,
            query_signature,
        })
    }

    /// Builds a key from an already-validated signature.
    ///
    /// # Errors
    ///
    /// Same rules as [`WatchKey::new`] for the user and wallet.
    pub fn with_signature(
        user_id: Option<&str>,
        wallet_address: Option<&str>,
        query_signature: QuerySignature,
    ) -> Result<Self, TrackerError> {
        let (user_id, wallet_address) = validate_owner(user_id, wallet_address)?;
        Ok(Self {
            user_id,
            wallet_address,
            query_signature,
        })
    }

    /// Partition key shared by both stores.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Watched wallet address.
    #[must_use]
    pub fn wallet_address(&self) -> &str {
        &self.wallet_address
    }

    /// Query signature scoping the watch.
    #[must_use]
    pub fn query_signature(&self) -> &QuerySignature {
        &self.query_signature
    }

    /// Sort key of the checkpoint row for this triple.
    #[must_use]
    pub fn checkpoint_sort_key(&self) -> String {
        format!(
            "{}{KEY_DELIMITER}{}",
            self.wallet_address,
            escape_component(self.query_signature.as_str())
        )
    }

    /// Prefix shared by every activity sort key of this triple.
    #[must_use]
    pub fn activity_prefix(&self) -> String {
        format!("{}{KEY_DELIMITER}", self.checkpoint_sort_key())
    }

    /// Full activity sort key for an event at `timestamp_ms`.
    #[must_use]
    pub fn activity_sort_key(&self, timestamp_ms: i64, activity_id: &str) -> String {
        format!(
            "{}{}{KEY_DELIMITER}{activity_id}",
            self.activity_prefix(),
            InvertedTimestamp(timestamp_ms)
        )
    }
}

impl fmt::Display for WatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_id, self.checkpoint_sort_key())
    }
}

fn validate_owner(
    user_id: Option<&str>,
    wallet_address: Option<&str>,
) -> Result<(String, String), TrackerError> {
    let user_id = required(user_id, "userId")?;
    let wallet_address = required(wallet_address, "walletAddress")?;
    if wallet_address.contains(KEY_DELIMITER) {
        return Err(TrackerError::InvalidInput(format!(
            "walletAddress must not contain '{KEY_DELIMITER}'"
        )));
    }
    Ok((user_id, wallet_address))
}

fn required(value: Option<&str>, field: &str) -> Result<String, TrackerError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| TrackerError::missing(field))
}

fn escape_component(raw: &str) -> String {
    raw.replace('%', "%25").replace(KEY_DELIMITER, "%23")
}

/// Descending, fixed-width rendering of a signed timestamp.
///
/// Flipping the sign bit maps `i64` onto `u64` in order; subtracting from
/// `u64::MAX` reverses it. Twenty digits cover the whole `u64` range.
struct InvertedTimestamp(i64);

impl fmt::Display for InvertedTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let biased = (self.0 as u64) ^ (1 << 63);
        write!(f, "{:020}", u64::MAX - biased)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn key() -> WatchKey {
        let Ok(key) = WatchKey::new(Some("u1"), Some("w1"), Some("q1")) else {
            panic!("valid key");
        };
        key
    }

    #[test]
    fn missing_components_rejected() {
        assert!(WatchKey::new(None, Some("w1"), Some("q1")).is_err());
        assert!(WatchKey::new(Some("u1"), Some("  "), Some("q1")).is_err());
        assert!(WatchKey::new(Some("u1"), Some("w1"), None).is_err());
    }

    #[test]
    fn wallet_with_delimiter_rejected() {
        let result = WatchKey::new(Some("u1"), Some("w#1"), Some("q1"));
        let Err(TrackerError::InvalidInput(msg)) = result else {
            panic!("expected invalid input");
        };
        assert!(msg.contains("walletAddress"));
    }

    #[test]
    fn newer_activity_sorts_first() {
        let k = key();
        let older = k.activity_sort_key(100, "a");
        let newer = k.activity_sort_key(300, "b");
        assert!(newer < older);
        assert!(newer.starts_with(&k.activity_prefix()));
    }

    #[test]
    fn inverted_timestamp_is_fixed_width() {
        let k = key();
        let small = k.activity_sort_key(i64::MIN, "x");
        let zero = k.activity_sort_key(0, "x");
        let large = k.activity_sort_key(i64::MAX, "x");
        assert_eq!(small.len(), zero.len());
        assert_eq!(zero.len(), large.len());
    }

    #[test]
    fn negative_timestamps_keep_recency_order() {
        let k = key();
        let keys: Vec<String> = [i64::MIN, -10, -5, 0, 7, i64::MAX]
            .iter()
            .map(|ts| k.activity_sort_key(*ts, "a"))
            .collect();
        // each later timestamp must sort strictly before the earlier one
        assert!(keys.windows(2).all(|w| matches!(w, [older, newer] if newer < older)));
    }

    #[test]
    fn delimiter_in_signature_is_escaped() {
        let Ok(plain) = WatchKey::new(Some("u1"), Some("w1"), Some("q")) else {
            panic!("valid key");
        };
        let Ok(nested) = WatchKey::new(Some("u1"), Some("w1"), Some("q#x")) else {
            panic!("valid key");
        };
        assert_eq!(nested.checkpoint_sort_key(), "w1#q%23x");
        assert!(
            !nested
                .activity_sort_key(1, "a")
                .starts_with(&plain.activity_prefix())
        );
    }

    #[test]
    fn checkpoint_key_layout() {
        assert_eq!(key().checkpoint_sort_key(), "w1#q1");
        assert_eq!(key().activity_prefix(), "w1#q1#");
    }
}
