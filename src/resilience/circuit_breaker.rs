//! # Circuit Breaker Implementation
//!
//! Three-state guard: Closed (normal operation), Open (failing fast) and
//! HalfOpen (probing recovery).
//!
//! ## Trip rule
//!
//! The breaker opens on the failure that makes `failure_count` strictly
//! exceed `failure_threshold`, i.e. on the `(threshold + 1)`-th consecutive
//! failure. A success in Closed resets the failure count; any failure in
//! HalfOpen reopens immediately.
//!
//! ## Probing
//!
//! HalfOpen always admits calls. Moving from Open to HalfOpen happens either
//! explicitly through [`CircuitBreaker::attempt_reset`] or through
//! [`CircuitBreaker::allow_request`] once the open timeout has elapsed.

use super::metrics::CircuitBreakerMetrics;
use super::settings::CircuitBreakerSettings;
use crate::error::CoreError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Circuit breaker states representing the current operational mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation - all calls are allowed through
    Closed,
    /// Failure mode - all calls fail fast without executing
    Open,
    /// Testing recovery - trial calls are allowed
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// Errors returned by [`CircuitBreaker::call`]
#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    /// Circuit is open, the operation was not executed
    #[error("Circuit breaker is open for {component}")]
    CircuitOpen { component: String },

    /// Operation ran, failed, and the failure was recorded
    #[error("Operation failed: {0}")]
    OperationFailed(E),
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    opened_at: Option<Instant>,

    total_calls: u64,
    total_successes: u64,
    total_failures: u64,
    total_duration: Duration,
}

impl BreakerState {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            opened_at: None,
            total_calls: 0,
            total_successes: 0,
            total_failures: 0,
            total_duration: Duration::ZERO,
        }
    }
}

/// Circuit breaker with all counters behind one lock
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Component name for logging and metrics
    name: String,
    settings: CircuitBreakerSettings,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, settings: CircuitBreakerSettings) -> Self {
        let name = name.into();
        info!(
            component = %name,
            failure_threshold = settings.failure_threshold,
            success_threshold = settings.success_threshold,
            open_timeout_ms = settings.open_timeout.as_millis() as u64,
            "Circuit breaker initialized"
        );

        Self {
            name,
            settings,
            inner: Mutex::new(BreakerState::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &CircuitBreakerSettings {
        &self.settings
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// Consecutive failures counted in Closed
    pub fn failure_count(&self) -> u32 {
        self.inner.lock().failure_count
    }

    /// Consecutive successes counted in HalfOpen
    pub fn success_count(&self) -> u32 {
        self.inner.lock().success_count
    }

    /// Calls are permitted in every state except Open
    pub fn is_call_permitted(&self) -> bool {
        self.state() != CircuitState::Open
    }

    /// Like [`CircuitBreaker::is_call_permitted`], but an Open breaker whose
    /// timeout has elapsed at `now` moves to HalfOpen and admits the trial call.
    pub fn allow_request(&self, now: Instant) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|opened| now.saturating_duration_since(opened))
                    .unwrap_or(Duration::MAX);
                if elapsed >= self.settings.open_timeout {
                    self.transition_to_half_open(&mut inner);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Execute an operation with circuit breaker protection
    pub fn call<F, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if !self.allow_request(Instant::now()) {
            return Err(CircuitBreakerError::CircuitOpen {
                component: self.name.clone(),
            });
        }

        let start_time = Instant::now();
        let result = operation();
        let duration = start_time.elapsed();

        match &result {
            Ok(_) => self.on_success(duration),
            Err(_) => self.on_failure(duration),
        }

        result.map_err(CircuitBreakerError::OperationFailed)
    }

    pub fn record_success(&self) {
        self.on_success(Duration::ZERO);
    }

    pub fn record_failure(&self) {
        self.on_failure(Duration::ZERO);
    }

    /// Open -> HalfOpen with both counters cleared. Any other state is
    /// refused and left untouched.
    pub fn attempt_reset(&self) -> Result<CircuitState, CoreError> {
        let mut inner = self.inner.lock();
        if inner.state != CircuitState::Open {
            return Err(CoreError::InvalidState {
                attempted: "attempt_reset".to_string(),
                current: inner.state.to_string(),
            });
        }
        self.transition_to_half_open(&mut inner);
        Ok(inner.state)
    }

    /// Force circuit to open state (for emergency situations)
    pub fn force_open(&self) {
        warn!(component = %self.name, "Circuit breaker forced open");
        let mut inner = self.inner.lock();
        self.transition_to_open(&mut inner, Instant::now());
    }

    /// Force circuit to closed state (for emergency recovery)
    pub fn force_closed(&self) {
        warn!(component = %self.name, "Circuit breaker forced closed");
        let mut inner = self.inner.lock();
        self.transition_to_closed(&mut inner);
    }

    /// Get current metrics snapshot
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let inner = self.inner.lock();
        CircuitBreakerMetrics::from_counts(
            inner.state,
            inner.total_calls,
            inner.total_successes,
            inner.total_failures,
            u64::from(inner.failure_count),
            u64::from(inner.success_count),
            inner.total_duration,
        )
    }

    /// Closed with a failure rate under 10% (fewer than 10 calls counts as healthy)
    pub fn is_healthy(&self) -> bool {
        let inner = self.inner.lock();
        if inner.state != CircuitState::Closed {
            return false;
        }
        if inner.total_calls < 10 {
            return true;
        }
        (inner.total_failures as f64 / inner.total_calls as f64) < 0.1
    }

    fn on_success(&self, duration: Duration) {
        let mut inner = self.inner.lock();
        inner.total_calls += 1;
        inner.total_successes += 1;
        inner.total_duration += duration;

        debug!(
            component = %self.name,
            duration_ms = duration.as_millis() as u64,
            "Operation succeeded"
        );

        match inner.state {
            CircuitState::HalfOpen => {
                inner.failure_count = 0;
                inner.success_count += 1;
                if inner.success_count >= self.settings.success_threshold {
                    self.transition_to_closed(&mut inner);
                }
            }
            CircuitState::Closed => {
                inner.failure_count = 0;
            }
            CircuitState::Open => {
                warn!(component = %self.name, "Success recorded while circuit is open");
            }
        }
    }

    fn on_failure(&self, duration: Duration) {
        let mut inner = self.inner.lock();
        inner.total_calls += 1;
        inner.total_failures += 1;
        inner.total_duration += duration;

        debug!(
            component = %self.name,
            duration_ms = duration.as_millis() as u64,
            "Operation failed"
        );

        match inner.state {
            CircuitState::Closed => {
                inner.success_count = 0;
                inner.failure_count += 1;
                if inner.failure_count > self.settings.failure_threshold {
                    self.transition_to_open(&mut inner, Instant::now());
                }
            }
            CircuitState::HalfOpen => {
                self.transition_to_open(&mut inner, Instant::now());
            }
            CircuitState::Open => {}
        }
    }

    fn transition_to_closed(&self, inner: &mut BreakerState) {
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        inner.success_count = 0;
        inner.opened_at = None;

        info!(
            component = %self.name,
            total_calls = inner.total_calls,
            "Circuit breaker closed (recovered)"
        );
    }

    fn transition_to_open(&self, inner: &mut BreakerState, now: Instant) {
        let consecutive_failures = inner.failure_count;
        inner.state = CircuitState::Open;
        inner.success_count = 0;
        inner.opened_at = Some(now);

        error!(
            component = %self.name,
            consecutive_failures = consecutive_failures,
            failure_threshold = self.settings.failure_threshold,
            open_timeout_ms = self.settings.open_timeout.as_millis() as u64,
            "Circuit breaker opened (failing fast)"
        );
    }

    fn transition_to_half_open(&self, inner: &mut BreakerState) {
        inner.state = CircuitState::HalfOpen;
        inner.failure_count = 0;
        inner.success_count = 0;

        info!(
            component = %self.name,
            success_threshold = self.settings.success_threshold,
            "Circuit breaker half-open (testing recovery)"
        );
    }
}
