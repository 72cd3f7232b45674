//! Per-client fixed-window request limiting.
//!
//! Counters live in a bounded [`moka::future::Cache`] owned by the
//! application state rather than a process-global map. Each entry expires
//! one window after it was created, which resets the client's budget.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use moka::future::Cache;

use crate::config::RateLimitConfig;
use crate::error::TrackerError;

#[derive(Debug)]
struct Window {
    started: Instant,
    hits: AtomicU32,
}

impl Window {
    fn open() -> Self {
        Self {
            started: Instant::now(),
            hits: AtomicU32::new(0),
        }
    }
}

/// Fixed-window limiter keyed by client identifier.
#[derive(Clone)]
pub struct RateLimiter {
    windows: Cache<String, Arc<Window>>,
    max_requests: u32,
    window: Duration,
    trust_forwarded: bool,
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_requests", &self.max_requests)
            .field("window", &self.window)
            .field("trust_forwarded", &self.trust_forwarded)
            .field("tracked_clients", &self.windows.entry_count())
            .finish()
    }
}

impl RateLimiter {
    /// Creates a limiter allowing `max_requests` per `window` per client.
    #[must_use]
    pub fn new(max_requests: u32, window: Duration, max_clients: u64) -> Self {
        let windows = Cache::builder()
            .max_capacity(max_clients)
            .time_to_live(window)
            .build();
        Self {
            windows,
            max_requests,
            window,
            trust_forwarded: false,
        }
    }

    /// Keys clients by forwarded headers when `trust` is set.
    #[must_use]
    pub fn with_trusted_proxy(mut self, trust: bool) -> Self {
        self.trust_forwarded = trust;
        self
    }

    /// Whether forwarded headers identify the client.
    #[must_use]
    pub const fn trusts_forwarded(&self) -> bool {
        self.trust_forwarded
    }

    /// Builds a limiter from configuration, `None` when disabled.
    #[must_use]
    pub fn from_config(config: &RateLimitConfig) -> Option<Self> {
        config.enabled.then(|| {
            Self::new(
                config.max_requests,
                Duration::from_secs(config.window_secs.max(1)),
                config.max_clients,
            )
            .with_trusted_proxy(config.trust_forwarded)
        })
    }

    /// Records one request from `client`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::RateLimited`] once the client has used its
    /// budget for the current window.
    pub async fn check(&self, client: &str) -> Result<(), TrackerError> {
        let mut window = self
            .windows
            .get_with(client.to_string(), async { Arc::new(Window::open()) })
            .await;

        // TTL eviction is lazy; never count against a window that has ended.
        if window.started.elapsed() >= self.window {
            window = Arc::new(Window::open());
            self.windows
                .insert(client.to_string(), Arc::clone(&window))
                .await;
        }

        let hits = window.hits.fetch_add(1, Ordering::Relaxed).saturating_add(1);
        if hits > self.max_requests {
            let remaining = self.window.saturating_sub(window.started.elapsed());
            tracing::warn!(client, hits, "rate limit exceeded");
            return Err(TrackerError::RateLimited {
                retry_after_ms: u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX),
            });
        }
        Ok(())
    }
}
