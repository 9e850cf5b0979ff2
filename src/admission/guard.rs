//! # Queue Guard
//!
//! Admission control in front of the dispatch queue. A request is checked in
//! this order: rate limit for its key, load shedding at the current depth,
//! then queue capacity. None of the refusals are errors.

use super::health::{classify_queue_health, should_shed, QueueHealth};
use super::priority_queue::{BoundedPriorityQueue, QueueItem};
use super::rate_limiter::RateLimiter;
use crate::config::{AdmissionConfig, RateLimitConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, warn};

/// Outcome of an admission attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionDecision {
    Admitted,
    Shed,
    RateLimited,
    QueueFull,
}

impl AdmissionDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, AdmissionDecision::Admitted)
    }
}

impl fmt::Display for AdmissionDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Admitted => "admitted",
            Self::Shed => "shed",
            Self::RateLimited => "rate_limited",
            Self::QueueFull => "queue_full",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug)]
pub struct QueueGuard {
    queue: BoundedPriorityQueue,
    rate_limiter: Option<RateLimiter>,
    warn_ratio: f64,
    emergency_ratio: f64,
}

impl QueueGuard {
    pub fn new(admission: &AdmissionConfig, rate_limit: &RateLimitConfig) -> Self {
        let rate_limiter = rate_limit
            .enabled
            .then(|| RateLimiter::new(rate_limit.capacity, rate_limit.refill_per_second));

        Self {
            queue: BoundedPriorityQueue::new(admission.hard_limit),
            rate_limiter,
            warn_ratio: admission.warn_ratio,
            emergency_ratio: admission.emergency_ratio,
        }
    }

    /// Run the admission checks for `item` on behalf of `key`
    pub fn admit(&self, key: &str, item: QueueItem, now: Instant, emergency: bool) -> AdmissionDecision {
        if let Some(limiter) = &self.rate_limiter {
            if !limiter.try_acquire(key, now) {
                return AdmissionDecision::RateLimited;
            }
        }

        let depth = self.queue.len();
        if should_shed(depth, self.queue.hard_limit(), emergency) {
            warn!(
                key = %key,
                item_id = %item.id,
                depth = depth,
                hard_limit = self.queue.hard_limit(),
                emergency = emergency,
                "Shedding load"
            );
            return AdmissionDecision::Shed;
        }

        let item_id = item.id.clone();
        if self.queue.enqueue(item) {
            debug!(key = %key, item_id = %item_id, "Item admitted");
            AdmissionDecision::Admitted
        } else {
            debug!(key = %key, item_id = %item_id, "Queue full");
            AdmissionDecision::QueueFull
        }
    }

    pub fn health(&self) -> QueueHealth {
        classify_queue_health(
            self.queue.len(),
            self.queue.hard_limit(),
            self.warn_ratio,
            self.emergency_ratio,
        )
    }

    pub fn queue(&self) -> &BoundedPriorityQueue {
        &self.queue
    }

    pub fn rate_limiter(&self) -> Option<&RateLimiter> {
        self.rate_limiter.as_ref()
    }

    /// Empty the queue and forget every rate-limit bucket
    pub fn reset(&self) {
        self.queue.clear();
        if let Some(limiter) = &self.rate_limiter {
            limiter.reset();
        }
    }
}
