//! Watcher handlers: paginated activities, recent activities, mark-read.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    ActivitiesQuery, ActivitiesResponse, MarkReadRequest, MarkReadResponse, QueryPairs,
    QuerySignatureResponse, RecentActivitiesQuery, RecentActivitiesResponse,
};
use crate::app_state::AppState;
use crate::domain::{ActivityFilters, WatchKey};
use crate::error::{ErrorResponse, TrackerError};

/// `GET /api/watchers/activities` — One page of activities for a wallet.
///
/// # Errors
///
/// Returns [`TrackerError::InvalidInput`] on missing or malformed
/// parameters and [`TrackerError::StoreUnavailable`] on store failure.
#[utoipa::path(
    get,
    path = "/api/watchers/activities",
    tag = "Watchers",
    summary = "List wallet activities",
    description = "Returns up to `pageSize` activities matching the filter set, most recent first. Pass the returned `lastKey` back to fetch the next page.",
    params(
        ("walletAddress" = String, Query, description = "Watched wallet address"),
        ("userId" = String, Query, description = "Owner of the watch"),
        ("page" = Option<u32>, Query, description = "Page number, echoed back"),
        ("pageSize" = Option<usize>, Query, description = "Records per page"),
        ("activityTypes[]" = Option<Vec<String>>, Query, description = "Activity types; repeatable or comma-separated"),
        ("platform" = Option<String>, Query, description = "Platform filter"),
        ("specificToken" = Option<String>, Query, description = "Token filter"),
        ("minAmount" = Option<f64>, Query, description = "Minimum amount, >= 0"),
        ("lastKey" = Option<String>, Query, description = "Continuation token from the previous page"),
    ),
    responses(
        (status = 200, description = "One page of activities", body = ActivitiesResponse),
        (status = 400, description = "Missing or invalid parameter", body = ErrorResponse),
        (status = 500, description = "Store unavailable", body = ErrorResponse),
    )
)]
pub async fn list_activities(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
) -> Result<impl IntoResponse, TrackerError> {
    let query = ActivitiesQuery::from_pairs(&pairs)?;

    let result = state
        .tracker
        .fetch_paginated(
            query.user_id.as_deref(),
            query.wallet_address.as_deref(),
            &query.filters,
            query.page_size,
            query.last_key.as_deref(),
        )
        .await?;

    Ok(Json(ActivitiesResponse {
        activities: result.activities,
        last_key: result.next.map(|token| token.encode()),
        page: query.page,
    }))
}

/// `GET /api/watchers/recent-activities` — Latest activities with unread flags.
///
/// # Errors
///
/// Returns [`TrackerError::InvalidInput`] on missing parameters and
/// [`TrackerError::StoreUnavailable`] on store failure.
#[utoipa::path(
    get,
    path = "/api/watchers/recent-activities",
    tag = "Watchers",
    summary = "Recent activities with read state",
    description = "Returns the most recent activities for the watch, each flagged `isUnread` when newer than the last acknowledgment.",
    params(
        ("userId" = String, Query, description = "Owner of the watch"),
        ("walletAddress" = String, Query, description = "Watched wallet address"),
        ("queryString" = String, Query, description = "Query signature"),
        ("limit" = Option<usize>, Query, description = "Maximum number of activities"),
    ),
    responses(
        (status = 200, description = "Annotated activities", body = RecentActivitiesResponse),
        (status = 400, description = "Missing or invalid parameter", body = ErrorResponse),
        (status = 500, description = "Store unavailable", body = ErrorResponse),
    )
)]
pub async fn recent_activities(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
) -> Result<impl IntoResponse, TrackerError> {
    let query = RecentActivitiesQuery::from_pairs(&pairs)?;
    let key = WatchKey::new(
        query.user_id.as_deref(),
        query.wallet_address.as_deref(),
        query.query_string.as_deref(),
    )?;

    let result = state.tracker.fetch_and_annotate(&key, query.limit).await?;

    Ok(Json(RecentActivitiesResponse {
        activities: result.activities,
        last_read_timestamp: result.last_read_timestamp,
    }))
}

/// `POST /api/watchers/mark-read` — Acknowledge everything seen so far.
///
/// # Errors
///
/// Returns [`TrackerError::InvalidInput`] on a malformed body or missing
/// fields and [`TrackerError::StoreUnavailable`] on store failure.
#[utoipa::path(
    post,
    path = "/api/watchers/mark-read",
    tag = "Watchers",
    summary = "Mark activities as read",
    description = "Sets the read checkpoint of the watch to the current server time. The last write wins.",
    request_body = MarkReadRequest,
    responses(
        (status = 200, description = "Checkpoint written", body = MarkReadResponse),
        (status = 400, description = "Missing or invalid field", body = ErrorResponse),
        (status = 500, description = "Store unavailable", body = ErrorResponse),
    )
)]
pub async fn mark_read(
    State(state): State<AppState>,
    body: Result<Json<MarkReadRequest>, JsonRejection>,
) -> Result<impl IntoResponse, TrackerError> {
    let Json(req) = body.map_err(|e| TrackerError::InvalidInput(e.body_text()))?;
    let key = WatchKey::new(
        req.user_id.as_deref(),
        req.wallet_address.as_deref(),
        req.query_string.as_deref(),
    )?;

    let checkpoint = state.tracker.acknowledge(&key).await?;

    Ok(Json(MarkReadResponse {
        message: "Activities marked as read".to_string(),
        timestamp: checkpoint.last_read_timestamp,
    }))
}

/// `POST /api/watchers/query-signature` — Canonical signature for a filter set.
///
/// # Errors
///
/// Returns [`TrackerError::InvalidInput`] on a malformed body or a
/// negative `minAmount`.
#[utoipa::path(
    post,
    path = "/api/watchers/query-signature",
    tag = "Watchers",
    summary = "Compute a query signature",
    description = "Serializes a filter set into the versioned, order-independent signature used as `queryString`.",
    request_body = ActivityFilters,
    responses(
        (status = 200, description = "Canonical signature", body = QuerySignatureResponse),
        (status = 400, description = "Invalid filters", body = ErrorResponse),
    )
)]
pub async fn query_signature(
    body: Result<Json<ActivityFilters>, JsonRejection>,
) -> Result<impl IntoResponse, TrackerError> {
    let Json(filters) = body.map_err(|e| TrackerError::InvalidInput(e.body_text()))?;
    let signature = filters.signature()?;
    Ok(Json(QuerySignatureResponse {
        query_string: signature.to_string(),
    }))
}

/// Watcher routes, relative to `/api/watchers`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/activities", get(list_activities))
        .route("/recent-activities", get(recent_activities))
        .route("/mark-read", post(mark_read))
        .route("/query-signature", post(query_signature))
}
