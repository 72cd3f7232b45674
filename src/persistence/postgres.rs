//! PostgreSQL implementation of the activity and checkpoint stores.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::{
    ActivityPage, ActivityStore, CheckpointStore, RangeQuery, StoreError, prefix_upper_bound,
};
use crate::config::DatabaseConfig;
use crate::domain::{ActivityRecord, QuerySignature, ReadCheckpoint, WatchKey};

type ActivityRow = (
    String,
    String,
    String,
    String,
    String,
    i64,
    serde_json::Value,
);

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool using the given settings.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the database is unreachable.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}

fn activity_from_row(row: ActivityRow) -> Result<ActivityRecord, StoreError> {
    let (user_id, sort_key, wallet_address, query_signature, activity_id, timestamp, payload) =
        row;
    let query_signature = QuerySignature::parse(&query_signature)
        .map_err(|_| StoreError::Corrupt(format!("empty query signature at {sort_key}")))?;
    Ok(ActivityRecord {
        user_id,
        sort_key,
        wallet_address,
        query_signature,
        activity_id,
        timestamp,
        payload,
    })
}

#[async_trait]
impl ActivityStore for PostgresStore {
    async fn query_prefix(&self, query: RangeQuery<'_>) -> Result<ActivityPage, StoreError> {
        let fetch = i64::try_from(query.limit.saturating_add(1)).unwrap_or(i64::MAX);
        let upper = prefix_upper_bound(query.prefix)
            .ok_or_else(|| StoreError::Backend("empty sort-key prefix".to_string()))?;

        // Half-open range on the primary key; C collation keeps it bytewise.
        let rows = sqlx::query_as::<_, ActivityRow>(
            "SELECT user_id, sort_key, wallet_address, query_signature, activity_id, timestamp_ms, payload \
             FROM activities \
             WHERE user_id = $1 AND sort_key >= $2 AND sort_key < $3 AND sort_key > $4 \
             ORDER BY sort_key ASC LIMIT $5",
        )
        .bind(query.user_id)
        .bind(query.prefix)
        .bind(upper)
        .bind(query.start_after.unwrap_or(""))
        .bind(fetch)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(activity_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ActivityPage::from_overfetch(items, query.limit))
    }

    async fn append(&self, record: ActivityRecord) -> Result<(), StoreError> {
        let result = sqlx::query(
            "INSERT INTO activities \
             (user_id, sort_key, wallet_address, query_signature, activity_id, timestamp_ms, payload) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) ON CONFLICT (user_id, sort_key) DO NOTHING",
        )
        .bind(&record.user_id)
        .bind(&record.sort_key)
        .bind(&record.wallet_address)
        .bind(record.query_signature.as_str())
        .bind(&record.activity_id)
        .bind(record.timestamp)
        .bind(&record.payload)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Duplicate(record.sort_key));
        }
        Ok(())
    }
}

#[async_trait]
impl CheckpointStore for PostgresStore {
    async fn get(&self, key: &WatchKey) -> Result<Option<ReadCheckpoint>, StoreError> {
        let row = sqlx::query_as::<_, (i64, DateTime<Utc>)>(
            "SELECT last_read_timestamp, last_updated FROM read_checkpoints \
             WHERE user_id = $1 AND sort_key = $2",
        )
        .bind(key.user_id())
        .bind(key.checkpoint_sort_key())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(last_read_timestamp, last_updated)| ReadCheckpoint {
            key: key.clone(),
            last_read_timestamp,
            last_updated,
        }))
    }

    async fn put(&self, checkpoint: &ReadCheckpoint) -> Result<(), StoreError> {
        let key = &checkpoint.key;
        sqlx::query(
            "INSERT INTO read_checkpoints \
             (user_id, sort_key, wallet_address, query_signature, last_read_timestamp, last_updated) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (user_id, sort_key) DO UPDATE SET \
             last_read_timestamp = EXCLUDED.last_read_timestamp, \
             last_updated = EXCLUDED.last_updated",
        )
        .bind(key.user_id())
        .bind(key.checkpoint_sort_key())
        .bind(key.wallet_address())
        .bind(key.query_signature().as_str())
        .bind(checkpoint.last_read_timestamp)
        .bind(checkpoint.last_updated)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
