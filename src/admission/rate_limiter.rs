//! Token-bucket rate limiting, one bucket per intake key.

use dashmap::DashMap;
use std::time::Instant;
use tracing::debug;

/// Token bucket state. Tokens refill continuously toward `capacity` and each
/// admitted call spends exactly one.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    capacity: f64,
    refill_per_second: f64,
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// A full bucket as of `now`
    pub fn new(capacity: f64, refill_per_second: f64, now: Instant) -> Self {
        let capacity = capacity.max(0.0);
        Self {
            capacity,
            refill_per_second: refill_per_second.max(0.0),
            tokens: capacity,
            last_refill: now,
        }
    }

    /// Refill for the time elapsed since the last refill, then spend one
    /// token if available. A `now` earlier than the last refill adds nothing.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        if elapsed > 0.0 {
            self.tokens = (self.tokens + elapsed * self.refill_per_second).min(self.capacity);
            self.last_refill = now;
        }
    }

    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }
}

/// Per-key token buckets. Each acquire runs under the bucket's shard lock, so
/// refill and spend are one atomic step for that key.
#[derive(Debug)]
pub struct RateLimiter {
    capacity: f64,
    refill_per_second: f64,
    buckets: DashMap<String, TokenBucket>,
}

impl RateLimiter {
    pub fn new(capacity: f64, refill_per_second: f64) -> Self {
        Self {
            capacity,
            refill_per_second,
            buckets: DashMap::new(),
        }
    }

    pub fn try_acquire(&self, key: &str, now: Instant) -> bool {
        let mut bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.capacity, self.refill_per_second, now));
        let admitted = bucket.try_acquire(now);
        if !admitted {
            debug!(key = %key, tokens = bucket.tokens(), "Rate limit exhausted");
        }
        admitted
    }

    /// Current tokens for a key, `None` if the key has never been seen
    pub fn tokens(&self, key: &str) -> Option<f64> {
        self.buckets.get(key).map(|bucket| bucket.tokens())
    }

    pub fn tracked_keys(&self) -> usize {
        self.buckets.len()
    }

    pub fn reset(&self) {
        self.buckets.clear();
    }
}
