// Per-user request limiting for the generation endpoint

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config::RateLimitSettings;

/// Source of monotonic time
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

pub trait RateLimiter: Send + Sync + 'static {
    /// Record one request for `key`; false when the key is over its limit
    fn allow(&self, key: &str) -> bool;

    /// Drop state that can no longer affect a decision
    fn prune(&self) {}
}

/// Window state for one key
#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    window_reset: Instant,
}

/// Fixed-window counter keyed by caller identity
pub struct FixedWindowLimiter {
    max_requests: u32,
    window: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, WindowEntry>>,
}

impl FixedWindowLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self::with_clock(max_requests, window, Arc::new(SystemClock))
    }

    pub fn with_clock(max_requests: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_requests,
            window,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_settings(settings: &RateLimitSettings) -> Self {
        Self::new(settings.requests, settings.window())
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, WindowEntry>> {
        // Entries stay consistent even if a holder panicked
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn tracked_keys(&self) -> usize {
        self.entries().len()
    }
}

impl RateLimiter for FixedWindowLimiter {
    fn allow(&self, key: &str) -> bool {
        let now = self.clock.now();
        let mut entries = self.entries();

        let entry = entries.entry(key.to_string()).or_insert(WindowEntry {
            count: 0,
            window_reset: now + self.window,
        });

        if now >= entry.window_reset {
            entry.count = 0;
            entry.window_reset = now + self.window;
        }

        if entry.count >= self.max_requests {
            tracing::debug!("Rate limit exceeded for {}", key);
            return false;
        }

        entry.count += 1;
        true
    }

    fn prune(&self) {
        let now = self.clock.now();
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, entry| entry.window_reset > now);
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!("Pruned {} expired rate limit windows", removed);
        }
    }
}
