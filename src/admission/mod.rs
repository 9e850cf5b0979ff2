//! # Admission Control
//!
//! Deciding whether new work is accepted under a capacity bound:
//!
//! - [`should_shed`]: load-shedding decision by queue depth
//! - [`BoundedPriorityQueue`]: priority queue with a hard capacity
//! - [`RateLimiter`] / [`TokenBucket`]: per-key token buckets
//! - [`classify_queue_health`]: utilization bands
//! - [`QueueGuard`]: all of the above combined into one admission decision

pub mod guard;
pub mod health;
pub mod priority_queue;
pub mod rate_limiter;

pub use guard::{AdmissionDecision, QueueGuard};
pub use health::{classify_queue_health, should_shed, utilization, HealthStatus, QueueHealth};
pub use priority_queue::{BoundedPriorityQueue, QueueItem};
pub use rate_limiter::{RateLimiter, TokenBucket};
