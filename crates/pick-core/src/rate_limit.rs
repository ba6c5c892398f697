//! Shared rate limiter for outbound external-service calls.
//!
//! Callers are handed the limiter explicitly and await their turn before
//! each call; there is no global singleton. One key per external service.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};

/// Enforces a minimum spacing between calls keyed by service name.
pub struct RateLimiter {
    /// Next instant at which a call to each service may proceed.
    next_allowed: Mutex<HashMap<String, Instant>>,
    intervals: HashMap<String, Duration>,
    default_interval: Duration,
}

impl RateLimiter {
    pub fn new(default_interval: Duration) -> Self {
        Self {
            next_allowed: Mutex::new(HashMap::new()),
            intervals: HashMap::new(),
            default_interval,
        }
    }

    /// Override the minimum interval for one service.
    pub fn with_interval(mut self, service: &str, interval: Duration) -> Self {
        self.intervals.insert(service.to_string(), interval);
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn interval_for(&self, service: &str) -> Duration {
        self.intervals
            .get(service)
            .copied()
            .unwrap_or(self.default_interval)
    }

    /// Wait until a call to `service` is allowed. Concurrent callers are
    /// serialized: each reserves the next slot under the lock and then
    /// sleeps outside it.
    pub async fn wait(&self, service: &str) {
        let interval = self.interval_for(service);
        let wait_until = {
            let mut next_allowed = self.next_allowed.lock().await;
            let now = Instant::now();
            let slot = next_allowed
                .entry(service.to_string())
                .or_insert(now)
                .to_owned();
            let start = slot.max(now);
            next_allowed.insert(service.to_string(), start + interval);
            start
        };

        let now = Instant::now();
        if wait_until > now {
            sleep(wait_until - now).await;
        }
    }
}
