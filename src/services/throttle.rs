//! # Fixed-Window Throttle
//!
//! Counts requests per key inside fixed windows. The counter is bumped under
//! the map's shard lock before the limit is compared, so concurrent requests
//! can only over-count, never slip through uncounted.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Instant,
    count: u32,
}

/// Outcome of a throttle check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    Allowed { remaining: u32 },
    Throttled { retry_after: Duration },
}

pub struct Throttle {
    limit: u32,
    window: Duration,
    windows: DashMap<String, Window>,
}

impl Throttle {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: DashMap::new(),
        }
    }

    /// Records an attempt for `key` and decides whether it may proceed.
    #[instrument(skip(self))]
    pub fn hit(&self, key: &str) -> ThrottleDecision {
        self.hit_at(key, Instant::now())
    }

    fn hit_at(&self, key: &str, now: Instant) -> ThrottleDecision {
        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            started_at: now,
            count: 0,
        });

        if now.duration_since(entry.started_at) >= self.window {
            entry.started_at = now;
            entry.count = 0;
        }
        entry.count = entry.count.saturating_add(1);

        if entry.count > self.limit {
            let retry_after = self
                .window
                .saturating_sub(now.duration_since(entry.started_at));
            warn!(count = entry.count, limit = self.limit, "Throttle limit exceeded");
            ThrottleDecision::Throttled { retry_after }
        } else {
            debug!(count = entry.count, limit = self.limit, "Throttle check passed");
            ThrottleDecision::Allowed {
                remaining: self.limit - entry.count,
            }
        }
    }

    /// Drops windows that have already ended.
    #[instrument(skip_all)]
    pub fn cleanup_expired_entries(&self) {
        let initial_size = self.windows.len();
        self.windows
            .retain(|_, w| w.started_at.elapsed() < self.window);
        let final_size = self.windows.len();
        if initial_size != final_size {
            info!(
                initial_size,
                final_size,
                removed = initial_size - final_size,
                "Cleaned up expired throttle windows"
            );
        }
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}
