//! Activity read-tracker: annotated reads, cursor pagination, and
//! acknowledgments.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::PagingConfig;
use crate::domain::{
    ActivityFilters, ActivityRecord, AnnotatedActivity, ContinuationToken, ReadCheckpoint,
    WatchKey,
};
use crate::error::TrackerError;
use crate::persistence::{ActivityStore, CheckpointStore, RangeQuery, StoreError};

/// Result of [`ActivityTracker::fetch_and_annotate`].
#[derive(Debug, Clone)]
pub struct AnnotatedActivities {
    /// Most recent first, each classified against `last_read_timestamp`.
    pub activities: Vec<AnnotatedActivity>,
    /// Checkpoint snapshot used for classification, `0` when none exists.
    pub last_read_timestamp: i64,
}

/// Result of [`ActivityTracker::fetch_paginated`].
#[derive(Debug, Clone)]
pub struct ActivityPageResult {
    /// Records on this page, most recent first.
    pub activities: Vec<ActivityRecord>,
    /// Cursor for the next page, `None` on the last page.
    pub next: Option<ContinuationToken>,
}

/// Read-tracking coordinator.
///
/// Stateless between calls: every operation is one or two store round
/// trips. Reads of the checkpoint and of the activities are not atomic;
/// an acknowledgment landing between them can misclassify a record for
/// that one response.
#[derive(Debug, Clone)]
pub struct ActivityTracker {
    activities: Arc<dyn ActivityStore>,
    checkpoints: Arc<dyn CheckpointStore>,
    paging: PagingConfig,
}

impl ActivityTracker {
    /// Creates a tracker over the given stores.
    #[must_use]
    pub fn new(
        activities: Arc<dyn ActivityStore>,
        checkpoints: Arc<dyn CheckpointStore>,
        paging: PagingConfig,
    ) -> Self {
        Self {
            activities,
            checkpoints,
            paging,
        }
    }

    /// Returns the most recent activities for `key`, each marked unread
    /// when newer than the stored checkpoint.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::StoreUnavailable`] if either store call fails.
    pub async fn fetch_and_annotate(
        &self,
        key: &WatchKey,
        limit: Option<usize>,
    ) -> Result<AnnotatedActivities, TrackerError> {
        let limit = self.paging.resolve(limit);

        let last_read_timestamp = self
            .checkpoints
            .get(key)
            .await
            .map_err(|e| store_failure("read checkpoint", key, e))?
            .map_or(0, |cp| cp.last_read_timestamp);

        let prefix = key.activity_prefix();
        let page = self
            .activities
            .query_prefix(RangeQuery {
                user_id: key.user_id(),
                prefix: &prefix,
                start_after: None,
                limit,
            })
            .await
            .map_err(|e| store_failure("query activities", key, e))?;

        let activities: Vec<AnnotatedActivity> = page
            .items
            .into_iter()
            .map(|record| AnnotatedActivity::classify(record, last_read_timestamp))
            .collect();

        tracing::debug!(
            watch = %key,
            returned = activities.len(),
            unread = activities.iter().filter(|a| a.is_unread).count(),
            last_read_timestamp,
            "annotated activities"
        );

        Ok(AnnotatedActivities {
            activities,
            last_read_timestamp,
        })
    }

    /// Returns one page of activities matching `filters` for the wallet.
    ///
    /// `last_key` is the opaque token from a previous page; `None` starts
    /// from the most recent activity.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidInput`] for missing identifiers,
    /// invalid filters, or a token that does not belong to this query, and
    /// [`TrackerError::StoreUnavailable`] if the store call fails.
    pub async fn fetch_paginated(
        &self,
        user_id: Option<&str>,
        wallet_address: Option<&str>,
        filters: &ActivityFilters,
        page_size: Option<usize>,
        last_key: Option<&str>,
    ) -> Result<ActivityPageResult, TrackerError> {
        let signature = filters.signature()?;
        let key = WatchKey::with_signature(user_id, wallet_address, signature)?;
        let limit = self.paging.resolve(page_size);

        let prefix = key.activity_prefix();
        let cursor = last_key
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| ContinuationToken::decode(raw, &prefix))
            .transpose()?;

        let page = self
            .activities
            .query_prefix(RangeQuery {
                user_id: key.user_id(),
                prefix: &prefix,
                start_after: cursor.as_ref().map(ContinuationToken::last_sort_key),
                limit,
            })
            .await
            .map_err(|e| store_failure("query activities", &key, e))?;

        Ok(ActivityPageResult {
            activities: page.items,
            next: page.last_key.map(ContinuationToken::after),
        })
    }

    /// Marks everything up to the current server time as read for `key`.
    ///
    /// Unconditionally replaces any existing checkpoint, so concurrent
    /// acknowledgments resolve to whichever write reaches the store last.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::StoreUnavailable`] if the write fails.
    pub async fn acknowledge(&self, key: &WatchKey) -> Result<ReadCheckpoint, TrackerError> {
        self.acknowledge_at(key, Utc::now()).await
    }

    /// [`ActivityTracker::acknowledge`] with an explicit clock reading.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::StoreUnavailable`] if the write fails.
    pub async fn acknowledge_at(
        &self,
        key: &WatchKey,
        now: DateTime<Utc>,
    ) -> Result<ReadCheckpoint, TrackerError> {
        let checkpoint = ReadCheckpoint::at(key.clone(), now);
        self.checkpoints
            .put(&checkpoint)
            .await
            .map_err(|e| store_failure("write checkpoint", key, e))?;

        tracing::info!(
            user_id = key.user_id(),
            wallet = key.wallet_address(),
            last_read_timestamp = checkpoint.last_read_timestamp,
            "activities marked read"
        );
        Ok(checkpoint)
    }
}

fn store_failure(action: &str, key: &WatchKey, err: StoreError) -> TrackerError {
    tracing::error!(watch = %key, error = %err, "failed to {action}");
    TrackerError::StoreUnavailable(err)
}
