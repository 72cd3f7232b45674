//! Persistence layer: partitioned activity and checkpoint stores.
//!
//! The tracker needs exactly three store capabilities: an ordered
//! prefix range query with a continuation key, a point read, and a point
//! upsert. They are split across [`ActivityStore`] and [`CheckpointStore`]
//! so the two logical tables can live in different backends. Both traits
//! are object-safe; the service holds them as `Arc<dyn ...>`.
//!
//! Backends:
//! - [`memory::MemoryStore`]: process-local, ordered maps behind `RwLock`s.
//! - [`postgres::PostgresStore`]: `sqlx::PgPool`, C-collated sort keys.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::domain::{ActivityRecord, ReadCheckpoint, WatchKey};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Failure reported by a store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend call itself failed (network, permissions, throttling).
    #[error("backend error: {0}")]
    Backend(String),

    /// The backend returned a row that does not decode into a domain value.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// An append collided with an existing sort key.
    #[error("duplicate key: {0}")]
    Duplicate(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Range query request over one `(user, sort-key prefix)`.
#[derive(Debug, Clone)]
pub struct RangeQuery<'a> {
    /// Partition to scan.
    pub user_id: &'a str,
    /// Every returned sort key starts with this prefix.
    pub prefix: &'a str,
    /// Resume strictly after this sort key.
    pub start_after: Option<&'a str>,
    /// Maximum number of records to return.
    pub limit: usize,
}

/// Smallest string greater than every string starting with `prefix`.
///
/// Turns a prefix match into the half-open range `[prefix, bound)` that an
/// ordered index can scan. `None` for an empty prefix.
#[must_use]
pub fn prefix_upper_bound(prefix: &str) -> Option<String> {
    let mut chars = prefix.chars();
    let last = chars.next_back()?;
    let next = char::from_u32(u32::from(last).checked_add(1)?)?;
    let mut bound = chars.as_str().to_string();
    bound.push(next);
    Some(bound)
}

/// One page of a range query, in ascending sort-key order.
#[derive(Debug, Clone, Default)]
pub struct ActivityPage {
    /// Records on this page.
    pub items: Vec<ActivityRecord>,
    /// Sort key of the last item when more records follow, `None` at the end.
    pub last_key: Option<String>,
}

impl ActivityPage {
    /// Builds a page from `limit + 1` fetched rows.
    ///
    /// The extra row only signals that another page exists; it is dropped.
    #[must_use]
    pub fn from_overfetch(mut items: Vec<ActivityRecord>, limit: usize) -> Self {
        let has_more = items.len() > limit;
        items.truncate(limit);
        let last_key = if has_more {
            items.last().map(|r| r.sort_key.clone())
        } else {
            None
        };
        Self { items, last_key }
    }
}

/// Append-only store of ingested activities.
#[async_trait]
pub trait ActivityStore: Send + Sync + std::fmt::Debug {
    /// Returns records of `query.user_id` whose sort key starts with
    /// `query.prefix`, in ascending sort-key order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend call fails.
    async fn query_prefix(&self, query: RangeQuery<'_>) -> Result<ActivityPage, StoreError>;

    /// Appends a record. Used by ingestion and test seeding.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] if the sort key already exists in
    /// the partition, or [`StoreError::Backend`] on backend failure.
    async fn append(&self, record: ActivityRecord) -> Result<(), StoreError>;
}

/// Point-addressed store of read checkpoints.
#[async_trait]
pub trait CheckpointStore: Send + Sync + std::fmt::Debug {
    /// Reads the checkpoint for `key`, `None` when never acknowledged.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend call fails.
    async fn get(&self, key: &WatchKey) -> Result<Option<ReadCheckpoint>, StoreError>;

    /// Replaces the checkpoint for `checkpoint.key`.
    ///
    /// Unconditional overwrite: the last write to reach the store wins.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend call fails.
    async fn put(&self, checkpoint: &ReadCheckpoint) -> Result<(), StoreError>;
}
