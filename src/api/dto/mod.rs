//! Data Transfer Objects for REST request/response serialization.
//!
//! JSON field names are camelCase to match the browser client.

pub mod common_dto;
pub mod watcher_dto;

pub use common_dto::*;
pub use watcher_dto::*;
