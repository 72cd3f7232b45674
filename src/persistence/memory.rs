//! In-process store backed by ordered maps.
//!
//! Activities live in a `BTreeMap` keyed by `(user_id, sort_key)`, which
//! gives the same ascending sort-key iteration a partitioned key/value store
//! provides. Each map sits behind its own [`tokio::sync::RwLock`], so
//! concurrent reads never block each other and the two logical stores never
//! contend.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ActivityPage, ActivityStore, CheckpointStore, RangeQuery, StoreError};
use crate::domain::{ActivityRecord, ReadCheckpoint, WatchKey};

type PartitionKey = (String, String);

/// Memory-resident implementation of both store traits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    activities: RwLock<BTreeMap<PartitionKey, ActivityRecord>>,
    checkpoints: RwLock<HashMap<PartitionKey, ReadCheckpoint>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    async fn activity_count(&self) -> usize {
        self.activities.read().await.len()
    }
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn query_prefix(&self, query: RangeQuery<'_>) -> Result<ActivityPage, StoreError> {
        let map = self.activities.read().await;

        let lower = match query.start_after {
            Some(after) => Bound::Excluded((query.user_id.to_string(), after.to_string())),
            None => Bound::Included((query.user_id.to_string(), query.prefix.to_string())),
        };

        let items: Vec<ActivityRecord> = map
            .range((lower, Bound::Unbounded))
            .take_while(|((user, sort_key), _)| {
                user == query.user_id && sort_key.starts_with(query.prefix)
            })
            .take(query.limit.saturating_add(1))
            .map(|(_, record)| record.clone())
            .collect();

        Ok(ActivityPage::from_overfetch(items, query.limit))
    }

    async fn append(&self, record: ActivityRecord) -> Result<(), StoreError> {
        let key = (record.user_id.clone(), record.sort_key.clone());
        let mut map = self.activities.write().await;
        if map.contains_key(&key) {
            return Err(StoreError::Duplicate(record.sort_key));
        }
        map.insert(key, record);
        Ok(())
    }
}

#[async_trait]
impl CheckpointStore for MemoryStore {
    async fn get(&self, key: &WatchKey) -> Result<Option<ReadCheckpoint>, StoreError> {
        let map = self.checkpoints.read().await;
        let id = (key.user_id().to_string(), key.checkpoint_sort_key());
        Ok(map.get(&id).cloned())
    }

    async fn put(&self, checkpoint: &ReadCheckpoint) -> Result<(), StoreError> {
        let id = (
            checkpoint.key.user_id().to_string(),
            checkpoint.key.checkpoint_sort_key(),
        );
        self.checkpoints.write().await.insert(id, checkpoint.clone());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn key(user: &str, wallet: &str, sig: &str) -> WatchKey {
        let Ok(key) = WatchKey::new(Some(user), Some(wallet), Some(sig)) else {
            panic!("valid key");
        };
        key
    }

    async fn seed(store: &MemoryStore, key: &WatchKey, timestamps: &[i64]) {
        for ts in timestamps {
            let record = ActivityRecord::new(key, format!("a{ts}"), *ts, serde_json::Value::Null);
            let Ok(()) = store.append(record).await else {
                panic!("append failed");
            };
        }
    }

    fn query<'a>(key: &'a WatchKey, prefix: &'a str, limit: usize) -> RangeQuery<'a> {
        RangeQuery {
            user_id: key.user_id(),
            prefix,
            start_after: None,
            limit,
        }
    }

    #[tokio::test]
    async fn query_returns_most_recent_first() {
        let store = MemoryStore::new();
        let k = key("u1", "w1", "q1");
        seed(&store, &k, &[100, 300, 200]).await;

        let prefix = k.activity_prefix();
        let Ok(page) = store.query_prefix(query(&k, &prefix, 10)).await else {
            panic!("query failed");
        };
        let ts: Vec<i64> = page.items.iter().map(|r| r.timestamp).collect();
        assert_eq!(ts, vec![300, 200, 100]);
        assert!(page.last_key.is_none());
    }

    #[tokio::test]
    async fn negative_timestamps_return_most_recent_first() {
        let store = MemoryStore::new();
        let k = key("u1", "w1", "q1");
        for (ts, id) in [(-10, "a"), (-5, "b"), (3, "c")] {
            let record = ActivityRecord::new(&k, id, ts, serde_json::Value::Null);
            let Ok(()) = store.append(record).await else {
                panic!("append failed");
            };
        }

        let prefix = k.activity_prefix();
        let Ok(page) = store.query_prefix(query(&k, &prefix, 10)).await else {
            panic!("query failed");
        };
        let ts: Vec<i64> = page.items.iter().map(|r| r.timestamp).collect();
        assert_eq!(ts, vec![3, -5, -10]);
    }

    #[tokio::test]
    async fn query_is_scoped_to_partition_and_prefix() {
        let store = MemoryStore::new();
        let k = key("u1", "w1", "q1");
        seed(&store, &k, &[1, 2]).await;
        seed(&store, &key("u2", "w1", "q1"), &[3]).await;
        seed(&store, &key("u1", "w2", "q1"), &[4]).await;
        seed(&store, &key("u1", "w1", "q2"), &[5]).await;

        let prefix = k.activity_prefix();
        let Ok(page) = store.query_prefix(query(&k, &prefix, 10)).await else {
            panic!("query failed");
        };
        assert_eq!(page.items.len(), 2);
        assert!(page.items.iter().all(|r| r.user_id == "u1"));
        assert_eq!(store.activity_count().await, 5);
    }

    #[tokio::test]
    async fn start_after_resumes_past_cursor() {
        let store = MemoryStore::new();
        let k = key("u1", "w1", "q1");
        seed(&store, &k, &[1, 2, 3]).await;

        let prefix = k.activity_prefix();
        let Ok(first) = store.query_prefix(query(&k, &prefix, 1)).await else {
            panic!("query failed");
        };
        let Some(cursor) = first.last_key.as_deref() else {
            panic!("expected continuation");
        };
        let mut next = query(&k, &prefix, 10);
        next.start_after = Some(cursor);
        let Ok(rest) = store.query_prefix(next).await else {
            panic!("query failed");
        };
        let ts: Vec<i64> = rest.items.iter().map(|r| r.timestamp).collect();
        assert_eq!(ts, vec![2, 1]);
    }

    #[tokio::test]
    async fn duplicate_append_rejected() {
        let store = MemoryStore::new();
        let k = key("u1", "w1", "q1");
        seed(&store, &k, &[1]).await;
        let dup = ActivityRecord::new(&k, "a1", 1, serde_json::Value::Null);
        assert!(matches!(
            store.append(dup).await,
            Err(StoreError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn checkpoint_put_overwrites() {
        let store = MemoryStore::new();
        let k = key("u1", "w1", "q1");
        let Ok(None) = store.get(&k).await else {
            panic!("expected no checkpoint");
        };

        for millis in [500, 250] {
            let Some(at) = Utc.timestamp_millis_opt(millis).single() else {
                panic!("valid timestamp");
            };
            let Ok(()) = store.put(&ReadCheckpoint::at(k.clone(), at)).await else {
                panic!("put failed");
            };
        }

        let Ok(Some(cp)) = store.get(&k).await else {
            panic!("expected checkpoint");
        };
        // last write wins, even when it moves backwards
        assert_eq!(cp.last_read_timestamp, 250);
    }
}
