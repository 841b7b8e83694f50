//! Request rate limiting
//!
//! Per-key budget sized for polling clients. Continuous refill rather than
//! fixed windows so a poller running slightly fast degrades gracefully
//! instead of failing every other interval.

use std::collections::HashMap;
use std::time::Instant;

use parking_lot::Mutex;

/// Per-key rate limiter
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
    per_minute: u32,
}

struct Bucket {
    available: f64,
    last_refill: Instant,
}

impl RateLimiter {
    pub fn new(per_minute: u32) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            per_minute,
        }
    }

    /// Whether a request under this key is allowed right now
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut buckets = self.buckets.lock();
        let bucket = buckets.entry(key.to_string()).or_insert(Bucket {
            available: self.per_minute as f64,
            last_refill: now,
        });

        let elapsed = now.saturating_duration_since(bucket.last_refill);
        let refill = elapsed.as_secs_f64() * self.per_minute as f64 / 60.0;
        bucket.available = (bucket.available + refill).min(self.per_minute as f64);
        bucket.last_refill = now;

        if bucket.available >= 1.0 {
            bucket.available -= 1.0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_budget_is_exhausted_then_denied() {
        let limiter = RateLimiter::new(2);
        let start = Instant::now();
        assert!(limiter.check_at("poller", start));
        assert!(limiter.check_at("poller", start));
        assert!(!limiter.check_at("poller", start));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new(1);
        let start = Instant::now();
        assert!(limiter.check_at("a", start));
        assert!(limiter.check_at("b", start));
        assert!(!limiter.check_at("a", start));
    }

    #[test]
    fn test_budget_refills_over_time() {
        let limiter = RateLimiter::new(60);
        let start = Instant::now();
        for _ in 0..60 {
            assert!(limiter.check_at("poller", start));
        }
        assert!(!limiter.check_at("poller", start));
        // One second buys back one request at 60/min
        assert!(limiter.check_at("poller", start + Duration::from_secs(1)));
        assert!(!limiter.check_at("poller", start + Duration::from_secs(1)));
    }
}
