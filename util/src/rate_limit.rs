//! Fixed-window request limiter keyed by client identifier.
//!
//! Abuse mitigation, not security: shared-NAT false positives are an
//! accepted tradeoff, and exactness under extreme concurrency is not
//! required. Window state resets lazily on the next request and is swept
//! periodically to bound memory.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Window {
    count: u32,
    reset_at: Instant,
}

pub struct FixedWindowLimiter {
    windows: Mutex<HashMap<String, Window>>,
    max_requests: u32,
    window: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    /// Over the cap; retry once the window resets.
    Limited { retry_after_secs: u64 },
}

impl FixedWindowLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            max_requests,
            window,
        }
    }

    pub fn check(&self, client: &str) -> Decision {
        self.check_at(client, Instant::now())
    }

    pub fn check_at(&self, client: &str, now: Instant) -> Decision {
        let mut windows = self.windows.lock().expect("limiter lock poisoned");

        let window = windows.entry(client.to_owned()).or_insert_with(|| Window {
            count: 0,
            reset_at: now + self.window,
        });

        if now >= window.reset_at {
            window.count = 0;
            window.reset_at = now + self.window;
        }

        if window.count >= self.max_requests {
            let remaining = window.reset_at.saturating_duration_since(now);
            return Decision::Limited {
                retry_after_secs: remaining.as_secs_f64().ceil() as u64,
            };
        }

        window.count += 1;
        Decision::Allowed
    }

    /// Drops windows whose reset time has passed; returns how many.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let mut windows = self.windows.lock().expect("limiter lock poisoned");
        let before = windows.len();
        windows.retain(|_, w| now < w.reset_at);
        let swept = before - windows.len();
        if swept > 0 {
            tracing::debug!(swept, "rate limiter window sweep");
        }
        swept
    }

    pub fn active_clients(&self) -> usize {
        self.windows.lock().expect("limiter lock poisoned").len()
    }
}
