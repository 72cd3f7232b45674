//! Canonical, versioned serialization of activity filter sets.
//!
//! A [`QuerySignature`] scopes both the activity prefix a watcher reads from
//! and the read checkpoint applied to it. The serialized form is
//! `v1:` followed by a JSON object with a fixed field set, so two filter sets
//! that differ only in ordering or duplicated activity types map to the
//! same signature.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::TrackerError;

/// Version tag prepended to every signature produced by this crate.
pub const SIGNATURE_VERSION: &str = "v1";

/// Separator of list values in query strings. Never part of an activity
/// type, so `a,b` means the same on every route.
pub const LIST_SEPARATOR: char = ',';

/// Filter parameters selecting a population of wallet activities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityFilters {
    /// Activity types to include (e.g. `"swap"`, `"transfer"`).
    #[serde(default)]
    pub activity_types: BTreeSet<String>,
    /// Restrict to a single platform (e.g. `"jupiter"`).
    #[serde(default)]
    pub platform: Option<String>,
    /// Restrict to a single token mint or symbol.
    #[serde(default)]
    pub specific_token: Option<String>,
    /// Minimum activity amount, `>= 0`.
    #[serde(default)]
    pub min_amount: f64,
}

/// Wire shape of the signature body. Field order is the serialization order.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CanonicalFilters<'a> {
    activity_types: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    platform: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    specific_token: Option<&'a str>,
    min_amount: f64,
}

impl ActivityFilters {
    /// Validates the filters and produces their canonical signature.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidInput`] if `min_amount` is negative
    /// or not finite, or if an activity type contains
    /// [`LIST_SEPARATOR`].
    pub fn signature(&self) -> Result<QuerySignature, TrackerError> {
        if !self.min_amount.is_finite() || self.min_amount < 0.0 {
            return Err(TrackerError::InvalidInput(format!(
                "minAmount must be a non-negative number, got {}",
                self.min_amount
            )));
        }
        if let Some(bad) = self
            .activity_types
            .iter()
            .find(|t| t.contains(LIST_SEPARATOR))
        {
            return Err(TrackerError::InvalidInput(format!(
                "activityTypes entries must not contain '{LIST_SEPARATOR}', got {bad:?}"
            )));
        }

        let activity_types: BTreeSet<&str> = self
            .activity_types
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();

        let canonical = CanonicalFilters {
            activity_types: activity_types.into_iter().collect(),
            platform: non_blank(self.platform.as_deref()),
            specific_token: non_blank(self.specific_token.as_deref()),
            // -0.0 and 0.0 must serialize identically
            min_amount: self.min_amount + 0.0,
        };

        let body = serde_json::to_string(&canonical)
            .map_err(|e| TrackerError::Internal(format!("signature encoding failed: {e}")))?;
        Ok(QuerySignature(format!("{SIGNATURE_VERSION}:{body}")))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Serialized filter set identifying one watcher query.
///
/// Values received from clients are treated as opaque: they are trimmed and
/// must be non-empty, but are not required to carry the current version tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuerySignature(String);

impl QuerySignature {
    /// Wraps a client-supplied signature string.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidInput`] if the value is blank.
    pub fn parse(raw: &str) -> Result<Self, TrackerError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TrackerError::missing("queryString"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the signature as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuerySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
