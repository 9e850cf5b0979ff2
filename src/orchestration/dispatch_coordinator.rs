//! # Dispatch Coordinator
//!
//! Composes the core components into one dispatch flow:
//!
//! 1. the circuit breaker and policy level decide whether dispatch runs at all
//! 2. the allocator validates and plans the batch
//! 3. the queue guard admits planned orders (emergency rules above `watch`)
//! 4. admitted orders are tracked through the workflow engine
//!
//! The queue follows the workflow: an order leaving `queued` is taken out of
//! the queue and a released order goes back in with its original priority.
//!
//! Outcomes reported back through `record_failure` / `record_success` feed
//! the breaker and the policy ladder.
//!
//! Each component owns its own lock. The coordinator calls them one after
//! another and never holds one component's lock while calling another.
//!
//! ## Usage
//!
//! ```rust
//! use dispatch_core::config::CoreConfig;
//! use dispatch_core::dispatch::Order;
//! use dispatch_core::orchestration::DispatchCoordinator;
//! use dispatch_core::state_machine::DispatchState;
//! use std::time::Instant;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let coordinator = DispatchCoordinator::new(&CoreConfig::default())?;
//! let orders = vec![Order::new("A", 5, 10, "north"), Order::new("B", 1, 90, "south")];
//!
//! let report = coordinator.submit_batch(&orders, Some(1), Instant::now())?;
//! assert_eq!(report.queued, vec!["A".to_string()]);
//! assert_eq!(coordinator.state_of("A"), Some(DispatchState::Queued));
//! # Ok(())
//! # }
//! ```

use crate::admission::{AdmissionDecision, QueueGuard, QueueHealth, QueueItem};
use crate::config::{ConfigManager, CoreConfig};
use crate::constants::defaults;
use crate::dispatch::{urgency_score, DispatchAllocator, Order};
use crate::error::{CoreError, Result};
use crate::policy::{PolicyEngine, PolicyLevel};
use crate::registry::ServiceRegistry;
use crate::resilience::{
    replay, replay_since, CheckpointManager, CircuitBreaker, CircuitBreakerManager, CircuitState,
    ReplayEvent,
};
use crate::routing::RoutingTable;
use crate::state_machine::{
    DispatchEvent, DispatchState, TransitionError, TransitionRecord, WorkflowEngine,
};
use crate::statistics;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Circuit breaker component guarding dispatch
pub const DISPATCH_COMPONENT: &str = "dispatch";

/// An order that was planned but not admitted to the queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefusedOrder {
    pub id: String,
    pub decision: AdmissionDecision,
}

/// Result of one `submit_batch` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReport {
    /// Admitted to the queue and registered in the workflow, in dispatch order
    pub queued: Vec<String>,
    /// Planned but turned away by admission control
    pub refused: Vec<RefusedOrder>,
    /// Over capacity, in the caller's original order
    pub rejected: Vec<String>,
    /// Policy level the batch was admitted under
    pub policy_level: PolicyLevel,
}

/// Point-in-time view across components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorHealth {
    pub queue: QueueHealth,
    pub policy_level: PolicyLevel,
    pub breaker_state: Option<CircuitState>,
    pub tracked_entities: usize,
    /// Share of failures among the most recent reported outcomes
    pub recent_failure_rate: Option<f64>,
    /// 95th percentile of failure rates across all circuit breakers
    pub breaker_failure_rate_p95: Option<f64>,
}

#[derive(Debug, Default)]
struct OutcomeStreaks {
    failure_burst: u32,
    success_streak: u32,
    recent: VecDeque<bool>,
}

impl OutcomeStreaks {
    fn push_outcome(&mut self, failed: bool) {
        if self.recent.len() >= defaults::OUTCOME_WINDOW {
            self.recent.pop_front();
        }
        self.recent.push_back(failed);
    }
}

#[derive(Debug)]
pub struct DispatchCoordinator {
    allocator: DispatchAllocator,
    guard: QueueGuard,
    workflow: WorkflowEngine<DispatchState>,
    policy: PolicyEngine,
    breakers: CircuitBreakerManager,
    dispatch_breaker: Option<Arc<CircuitBreaker>>,
    checkpoints: CheckpointManager,
    routing: RoutingTable,
    registry: ServiceRegistry,
    /// Queue priority of every tracked order, kept for release
    priorities: Mutex<HashMap<String, i64>>,
    streaks: Mutex<OutcomeStreaks>,
}

impl DispatchCoordinator {
    /// Build every component from a validated configuration
    pub fn new(config: &CoreConfig) -> Result<Self> {
        config.validate()?;

        let breakers = CircuitBreakerManager::from_config(&config.circuit_breakers);
        let dispatch_breaker = breakers
            .is_enabled()
            .then(|| breakers.get_circuit_breaker(DISPATCH_COMPONENT));

        info!(
            hard_limit = config.admission.hard_limit,
            rate_limited = config.rate_limit.enabled,
            breaker_enabled = dispatch_breaker.is_some(),
            "Dispatch coordinator initialized"
        );

        Ok(Self {
            allocator: DispatchAllocator::new(config.dispatch.clone()),
            guard: QueueGuard::new(&config.admission, &config.rate_limit),
            workflow: WorkflowEngine::new(DispatchState::workflow_graph()?),
            policy: PolicyEngine::new(config.policy.clone()),
            breakers,
            dispatch_breaker,
            checkpoints: CheckpointManager::new(config.checkpoint.interval),
            routing: RoutingTable::new(),
            registry: ServiceRegistry::new(),
            priorities: Mutex::new(HashMap::new()),
            streaks: Mutex::new(OutcomeStreaks::default()),
        })
    }

    pub fn from_manager(manager: &ConfigManager) -> Result<Self> {
        Self::new(manager.config())
    }

    /// Refuse dispatch while the breaker is open or the policy is halted
    pub fn ensure_dispatch_allowed(&self, now: Instant) -> Result<()> {
        if let Some(breaker) = &self.dispatch_breaker {
            if !breaker.allow_request(now) {
                return Err(CoreError::CircuitOpen {
                    component: breaker.name().to_string(),
                });
            }
        }

        let level = self.policy.current();
        if !level.allows_dispatch() {
            return Err(CoreError::PolicyHalted(format!(
                "dispatch refused at policy level {level}"
            )));
        }
        Ok(())
    }

    /// Validate, plan and admit a batch. Validation and integrity failures
    /// abort the whole batch before anything is queued.
    pub fn submit_batch(
        &self,
        orders: &[Order],
        capacity: Option<usize>,
        now: Instant,
    ) -> Result<SubmissionReport> {
        self.ensure_dispatch_allowed(now)?;

        let batch = self.allocator.dispatch(orders, capacity)?;

        // every id is claimed in one step before anything is enqueued
        self.workflow
            .register_all(batch.admitted.iter().map(|order| order.id.as_str()))
            .map_err(|err| match err {
                TransitionError::AlreadyRegistered { entity_id } => CoreError::Integrity(format!(
                    "order {entity_id} is already being tracked"
                )),
                other => other.into(),
            })?;

        let policy_level = self.policy.current();
        let emergency = policy_level.requires_emergency_admission();

        let mut queued = Vec::with_capacity(batch.admitted.len());
        let mut refused = Vec::new();
        for order in &batch.admitted {
            let priority = queue_priority(order);
            self.priorities.lock().insert(order.id.clone(), priority);

            let item = QueueItem::new(order.id.clone(), priority);
            match self.guard.admit(&order.region, item, now, emergency) {
                AdmissionDecision::Admitted => queued.push(order.id.clone()),
                decision => {
                    self.priorities.lock().remove(&order.id);
                    self.workflow.remove(&order.id);
                    refused.push(RefusedOrder {
                        id: order.id.clone(),
                        decision,
                    });
                }
            }
        }

        if !refused.is_empty() {
            warn!(
                refused = refused.len(),
                policy_level = %policy_level,
                "Admission control refused planned orders"
            );
        }

        Ok(SubmissionReport {
            queued,
            refused,
            rejected: batch.rejected.into_iter().map(|order| order.id).collect(),
            policy_level,
        })
    }

    /// Take the highest-priority queued order and mark it allocated. Items
    /// whose order already left `queued` are dropped on the way.
    pub fn allocate_next(
        &self,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<TransitionRecord<DispatchState>>> {
        while let Some(item) = self.guard.queue().dequeue() {
            match self
                .workflow
                .transition(&item.id, DispatchState::Allocated, timestamp)
            {
                Ok(record) => return Ok(Some(record)),
                Err(err) => {
                    debug!(entity_id = %item.id, error = %err, "Skipping stale queue item");
                }
            }
        }
        Ok(None)
    }

    /// Move a tracked order to `to`, keeping the queue in step
    pub fn advance(
        &self,
        entity_id: &str,
        to: DispatchState,
        timestamp: DateTime<Utc>,
    ) -> Result<TransitionRecord<DispatchState>> {
        if to == DispatchState::Queued {
            return self.release(entity_id, timestamp);
        }

        let record = self.workflow.transition(entity_id, to, timestamp)?;
        if record.from == DispatchState::Queued {
            self.guard.queue().remove(entity_id);
        }
        if self.workflow.is_terminal(to) {
            self.priorities.lock().remove(entity_id);
        }
        Ok(record)
    }

    /// Allocated back to queued. A full queue undoes the release and the
    /// order stays allocated.
    fn release(
        &self,
        entity_id: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<TransitionRecord<DispatchState>> {
        let priority = self
            .priorities
            .lock()
            .get(entity_id)
            .copied()
            .ok_or_else(|| CoreError::EntityNotFound(entity_id.to_string()))?;

        let record = self
            .workflow
            .transition(entity_id, DispatchState::Queued, timestamp)?;
        if self.guard.queue().enqueue(QueueItem::new(entity_id, priority)) {
            return Ok(record);
        }

        if let Err(err) = self
            .workflow
            .transition(entity_id, DispatchState::Allocated, timestamp)
        {
            warn!(entity_id = %entity_id, error = %err, "Could not restore released order");
        }
        Err(CoreError::CapacityExhausted(format!(
            "queue is full, order {entity_id} stays allocated"
        )))
    }

    pub fn apply_event(
        &self,
        entity_id: &str,
        event: DispatchEvent,
    ) -> Result<TransitionRecord<DispatchState>> {
        self.advance(entity_id, event.target_state(), Utc::now())
    }

    pub fn state_of(&self, entity_id: &str) -> Option<DispatchState> {
        self.workflow.state_of(entity_id)
    }

    /// A downstream failure. Feeds the breaker, then the policy ladder with
    /// the current failure burst.
    pub fn record_failure(&self) -> PolicyLevel {
        let burst = {
            let mut streaks = self.streaks.lock();
            streaks.success_streak = 0;
            streaks.failure_burst += 1;
            streaks.push_outcome(true);
            streaks.failure_burst
        };

        if let Some(breaker) = &self.dispatch_breaker {
            breaker.record_failure();
        }

        let before = self.policy.current();
        let after = self.policy.evaluate(burst, 0);
        if after > before {
            self.streaks.lock().failure_burst = 0;
        }
        after
    }

    /// A downstream success. Feeds the breaker, then lets the policy ladder
    /// step down once the streak is long enough.
    pub fn record_success(&self) -> PolicyLevel {
        let streak = {
            let mut streaks = self.streaks.lock();
            streaks.failure_burst = 0;
            streaks.success_streak += 1;
            streaks.push_outcome(false);
            streaks.success_streak
        };

        if let Some(breaker) = &self.dispatch_breaker {
            breaker.record_success();
        }

        let before = self.policy.current();
        let after = self.policy.evaluate(0, streak);
        if after < before {
            self.streaks.lock().success_streak = 0;
        }
        after
    }

    /// Record progress on an event stream, checkpointing once the gap since
    /// the last checkpoint exceeds the configured interval. Returns whether a
    /// checkpoint was written.
    pub fn record_progress(&self, stream: &str, sequence: u64) -> bool {
        let last = self.checkpoints.last_sequence(stream).unwrap_or(0);
        if self.checkpoints.should_checkpoint(sequence, last) {
            self.checkpoints.record(stream, sequence);
            true
        } else {
            false
        }
    }

    /// Events of `stream` still to be processed after its last checkpoint
    pub fn pending_events(&self, stream: &str, events: &[ReplayEvent]) -> Vec<ReplayEvent> {
        match self.checkpoints.last_sequence(stream) {
            Some(last) => replay_since(events, last),
            None => replay(events),
        }
    }

    pub fn health(&self) -> CoordinatorHealth {
        let outcomes: Vec<f64> = self
            .streaks
            .lock()
            .recent
            .iter()
            .map(|&failed| if failed { 1.0 } else { 0.0 })
            .collect();

        CoordinatorHealth {
            queue: self.guard.health(),
            policy_level: self.policy.current(),
            breaker_state: self.dispatch_breaker.as_ref().map(|b| b.state()),
            tracked_entities: self.workflow.len(),
            recent_failure_rate: statistics::mean(&outcomes),
            breaker_failure_rate_p95: self
                .breakers
                .get_system_metrics()
                .failure_rate_percentile(95.0),
        }
    }

    /// Caller-driven reset of every stateful component. Service and route
    /// catalogs are kept.
    pub fn reset(&self) {
        self.guard.reset();
        self.workflow.clear();
        self.priorities.lock().clear();
        self.policy.reset();
        self.checkpoints.reset();
        self.breakers.force_close_all();
        *self.streaks.lock() = OutcomeStreaks::default();
        info!("Dispatch coordinator reset");
    }

    pub fn allocator(&self) -> &DispatchAllocator {
        &self.allocator
    }

    pub fn queue_guard(&self) -> &QueueGuard {
        &self.guard
    }

    pub fn workflow(&self) -> &WorkflowEngine<DispatchState> {
        &self.workflow
    }

    pub fn policy(&self) -> &PolicyEngine {
        &self.policy
    }

    pub fn circuit_breakers(&self) -> &CircuitBreakerManager {
        &self.breakers
    }

    pub fn checkpoints(&self) -> &CheckpointManager {
        &self.checkpoints
    }

    pub fn routing(&self) -> &RoutingTable {
        &self.routing
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }
}

/// Integer queue priority preserving urgency-score order
fn queue_priority(order: &Order) -> i64 {
    (urgency_score(order) * 1000.0).round() as i64
}
