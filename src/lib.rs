//! # watcher-gateway
//!
//! REST service tracking which wallet activities a user has already seen.
//!
//! Activities are ingested elsewhere and stored per user, ordered most
//! recent first under a `(wallet, query signature)` prefix. This crate
//! serves them page by page and classifies each one as read or unread
//! against a per-`(user, wallet, query)` checkpoint that clients advance
//! with an explicit acknowledgment.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers + rate limiter (api/)
//!     │
//!     ├── ActivityTracker (service/)
//!     │
//!     ├── WatchKey / QuerySignature / ContinuationToken (domain/)
//!     │
//!     └── ActivityStore + CheckpointStore (persistence/)
//!             ├── MemoryStore
//!             └── PostgresStore
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
