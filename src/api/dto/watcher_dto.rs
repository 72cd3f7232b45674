//! Watcher DTOs: activity listing, recent activities, mark-read.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::{last_value, list_values, parse_value};
use crate::domain::{ActivityFilters, ActivityRecord, AnnotatedActivity};
use crate::error::TrackerError;

/// Parsed query of `GET /api/watchers/activities`.
#[derive(Debug, Clone, Default)]
pub struct ActivitiesQuery {
    /// Watched wallet address.
    pub wallet_address: Option<String>,
    /// Partition owner.
    pub user_id: Option<String>,
    /// Client-side page number, echoed back.
    pub page: u32,
    /// Requested page size.
    pub page_size: Option<usize>,
    /// Filter set scoping the query.
    pub filters: ActivityFilters,
    /// Continuation token from a previous page.
    pub last_key: Option<String>,
}

impl ActivitiesQuery {
    /// Builds the query from raw query-string pairs.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidInput`] if a numeric parameter does
    /// not parse.
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, TrackerError> {
        let filters = ActivityFilters {
            activity_types: list_values(pairs, "activityTypes").into_iter().collect(),
            platform: last_value(pairs, "platform").map(ToString::to_string),
            specific_token: last_value(pairs, "specificToken").map(ToString::to_string),
            min_amount: parse_value(pairs, "minAmount")?.unwrap_or(0.0),
        };

        Ok(Self {
            wallet_address: last_value(pairs, "walletAddress").map(ToString::to_string),
            user_id: last_value(pairs, "userId").map(ToString::to_string),
            page: parse_value(pairs, "page")?.unwrap_or(1),
            page_size: parse_value(pairs, "pageSize")?,
            filters,
            last_key: last_value(pairs, "lastKey").map(ToString::to_string),
        })
    }
}

/// Response body for `GET /api/watchers/activities`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivitiesResponse {
    /// Records on this page, most recent first.
    pub activities: Vec<ActivityRecord>,
    /// Opaque token for the next page, `null` on the last page.
    pub last_key: Option<String>,
    /// Page number echoed from the request.
    pub page: u32,
}

/// Parsed query of `GET /api/watchers/recent-activities`.
#[derive(Debug, Clone, Default)]
pub struct RecentActivitiesQuery {
    /// Partition owner.
    pub user_id: Option<String>,
    /// Watched wallet address.
    pub wallet_address: Option<String>,
    /// Query signature.
    pub query_string: Option<String>,
    /// Maximum number of activities.
    pub limit: Option<usize>,
}

impl RecentActivitiesQuery {
    /// Builds the query from raw query-string pairs.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidInput`] if `limit` does not parse.
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, TrackerError> {
        Ok(Self {
            user_id: last_value(pairs, "userId").map(ToString::to_string),
            wallet_address: last_value(pairs, "walletAddress").map(ToString::to_string),
            query_string: last_value(pairs, "queryString").map(ToString::to_string),
            limit: parse_value(pairs, "limit")?,
        })
    }
}

/// Response body for `GET /api/watchers/recent-activities`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivitiesResponse {
    /// Most recent activities with their unread flag.
    pub activities: Vec<AnnotatedActivity>,
    /// Checkpoint used for the classification, `0` if never acknowledged.
    pub last_read_timestamp: i64,
}

/// Request body for `POST /api/watchers/mark-read`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    /// Partition owner.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Watched wallet address.
    #[serde(default)]
    pub wallet_address: Option<String>,
    /// Query signature being acknowledged.
    #[serde(default)]
    pub query_string: Option<String>,
}

/// Response body for `POST /api/watchers/mark-read`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadResponse {
    /// Confirmation text.
    pub message: String,
    /// New checkpoint in epoch milliseconds.
    pub timestamp: i64,
}

/// Response body for `POST /api/watchers/query-signature`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuerySignatureResponse {
    /// Canonical signature to pass as `queryString`.
    pub query_string: String,
}
