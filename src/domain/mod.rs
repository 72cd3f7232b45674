//! Domain layer: keys, records, and signatures.
//!
//! This module holds the server-side model of the activity watcher: the
//! canonical query signature, the composite keys used by the partitioned
//! stores, stored activities with their unread annotation, read
//! checkpoints, and the pagination cursor.

pub mod activity;
pub mod checkpoint;
pub mod continuation;
pub mod query_signature;
pub mod watch_key;

pub use activity::{ActivityRecord, AnnotatedActivity};
pub use checkpoint::ReadCheckpoint;
pub use continuation::ContinuationToken;
pub use query_signature::{ActivityFilters, QuerySignature};
pub use watch_key::WatchKey;
