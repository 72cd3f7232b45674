//! REST endpoint handlers organized by resource.

pub mod system;
pub mod watchers;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/watchers`.
pub fn routes() -> Router<AppState> {
    Router::new().merge(watchers::routes())
}
