//! Service layer: business logic orchestration.
//!
//! [`ActivityTracker`] owns the read/unread protocol over the stores;
//! [`RateLimiter`] bounds per-client request rates for the HTTP surface.

pub mod activity_tracker;
pub mod rate_limiter;

pub use activity_tracker::{ActivityPageResult, ActivityTracker, AnnotatedActivities};
pub use rate_limiter::RateLimiter;
