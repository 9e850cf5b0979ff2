//! End-to-end flows through the dispatch coordinator.

mod common;

use chrono::Utc;
use common::{abc_orders, test_config};
use dispatch_core::admission::AdmissionDecision;
use dispatch_core::config::ConfigManager;
use dispatch_core::dispatch::Order;
use dispatch_core::orchestration::{DispatchCoordinator, RefusedOrder};
use dispatch_core::policy::PolicyLevel;
use dispatch_core::registry::ServiceDefinition;
use dispatch_core::resilience::{CircuitState, ReplayEvent};
use dispatch_core::routing::Route;
use dispatch_core::state_machine::{DispatchEvent, DispatchState};
use dispatch_core::CoreError;
use std::fs;
use std::time::{Duration, Instant};
use tempfile::TempDir;

#[test]
fn test_abc_backlog_with_capacity_two() {
    let coordinator = DispatchCoordinator::new(&test_config()).unwrap();
    let report = coordinator
        .submit_batch(&abc_orders(), Some(2), Instant::now())
        .unwrap();

    assert_eq!(report.queued, vec!["A", "B"]);
    assert_eq!(report.rejected, vec!["C"]);
    assert_eq!(report.policy_level, PolicyLevel::Normal);
}

#[test]
fn test_default_capacity_applies_when_none_given() {
    let mut config = test_config();
    config.dispatch.default_capacity = 1;
    let coordinator = DispatchCoordinator::new(&config).unwrap();

    let report = coordinator
        .submit_batch(&abc_orders(), None, Instant::now())
        .unwrap();
    assert_eq!(report.queued, vec!["A"]);
    assert_eq!(report.rejected, vec!["B", "C"]);
}

#[test]
fn test_queue_full_at_hard_limit_three() {
    let mut config = test_config();
    config.admission.hard_limit = 3;
    let coordinator = DispatchCoordinator::new(&config).unwrap();

    let orders: Vec<Order> = (0..4)
        .map(|i| Order::new(format!("o-{i}"), 3, 30 + i, "north"))
        .collect();
    let report = coordinator
        .submit_batch(&orders, Some(4), Instant::now())
        .unwrap();

    assert_eq!(report.queued.len(), 3);
    assert_eq!(
        report.refused,
        vec![RefusedOrder {
            id: "o-3".to_string(),
            decision: AdmissionDecision::QueueFull,
        }]
    );
    assert_eq!(coordinator.queue_guard().queue().len(), 3);
    assert_eq!(coordinator.state_of("o-3"), None);
}

#[test]
fn test_invalid_batch_is_rejected_before_queueing() {
    let coordinator = DispatchCoordinator::new(&test_config()).unwrap();
    let mut orders = abc_orders();
    orders.push(Order::new("A", 2, 40, "east"));

    let err = coordinator
        .submit_batch(&orders, Some(4), Instant::now())
        .unwrap_err();
    assert!(matches!(err, CoreError::Integrity(_)));
    assert!(coordinator.queue_guard().queue().is_empty());
    assert!(coordinator.workflow().is_empty());
}

#[test]
fn test_order_lifecycle_through_arrival() {
    let coordinator = DispatchCoordinator::new(&test_config()).unwrap();
    coordinator
        .submit_batch(&abc_orders(), Some(3), Instant::now())
        .unwrap();

    let first = coordinator.allocate_next(Utc::now()).unwrap().unwrap();
    assert_eq!(first.entity_id, "A");

    coordinator
        .apply_event("A", DispatchEvent::Depart)
        .unwrap();
    coordinator
        .advance("A", DispatchState::Arrived, Utc::now())
        .unwrap();
    assert_eq!(coordinator.state_of("A"), Some(DispatchState::Arrived));

    let err = coordinator
        .apply_event("A", DispatchEvent::Cancel)
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition { .. }));

    // B is still waiting and can be cancelled straight from the queue state
    coordinator.apply_event("B", DispatchEvent::Cancel).unwrap();
    assert_eq!(coordinator.state_of("B"), Some(DispatchState::Cancelled));
    assert_eq!(coordinator.workflow().history_for("A").len(), 3);
}

#[test]
fn test_cancelled_queued_order_is_skipped_by_allocation() {
    let coordinator = DispatchCoordinator::new(&test_config()).unwrap();
    coordinator
        .submit_batch(&abc_orders(), Some(3), Instant::now())
        .unwrap();

    coordinator.apply_event("A", DispatchEvent::Cancel).unwrap();
    assert_eq!(coordinator.queue_guard().queue().len(), 2);

    let next = coordinator.allocate_next(Utc::now()).unwrap().unwrap();
    assert_eq!(next.entity_id, "B");
    let next = coordinator.allocate_next(Utc::now()).unwrap().unwrap();
    assert_eq!(next.entity_id, "C");
    assert!(coordinator.allocate_next(Utc::now()).unwrap().is_none());
    assert_eq!(coordinator.state_of("A"), Some(DispatchState::Cancelled));
}

#[test]
fn test_released_order_can_be_allocated_again() {
    let coordinator = DispatchCoordinator::new(&test_config()).unwrap();
    coordinator
        .submit_batch(&abc_orders(), Some(3), Instant::now())
        .unwrap();

    assert_eq!(coordinator.allocate_next(Utc::now()).unwrap().unwrap().entity_id, "A");
    coordinator.apply_event("A", DispatchEvent::Release).unwrap();
    assert_eq!(coordinator.state_of("A"), Some(DispatchState::Queued));
    assert_eq!(coordinator.queue_guard().queue().len(), 3);

    // original priority: A is still ahead of B and C
    let again = coordinator.allocate_next(Utc::now()).unwrap().unwrap();
    assert_eq!(again.entity_id, "A");
    assert_eq!(again.from, DispatchState::Queued);
    assert_eq!(coordinator.workflow().history_for("A").len(), 3);
}

#[test]
fn test_release_of_single_order_requeues_it() {
    let coordinator = DispatchCoordinator::new(&test_config()).unwrap();
    coordinator
        .submit_batch(&abc_orders()[..1], Some(1), Instant::now())
        .unwrap();

    coordinator.allocate_next(Utc::now()).unwrap().unwrap();
    assert!(coordinator.queue_guard().queue().is_empty());

    coordinator.apply_event("A", DispatchEvent::Release).unwrap();
    assert_eq!(coordinator.queue_guard().queue().len(), 1);
    let record = coordinator.allocate_next(Utc::now()).unwrap().unwrap();
    assert_eq!(record.entity_id, "A");
    assert_eq!(record.to, DispatchState::Allocated);
}

#[test]
fn test_unknown_entity_transition_fails() {
    let coordinator = DispatchCoordinator::new(&test_config()).unwrap();
    let err = coordinator
        .advance("ghost", DispatchState::Allocated, Utc::now())
        .unwrap_err();
    assert!(matches!(err, CoreError::EntityNotFound(_)));
}

#[test]
fn test_breaker_recovers_after_open_timeout() {
    let coordinator = DispatchCoordinator::new(&test_config()).unwrap();

    // threshold 3: the fourth consecutive failure opens the breaker
    for _ in 0..3 {
        coordinator.record_failure();
    }
    assert_eq!(coordinator.health().breaker_state, Some(CircuitState::Closed));
    coordinator.record_failure();
    assert_eq!(coordinator.health().breaker_state, Some(CircuitState::Open));

    let now = Instant::now();
    assert!(matches!(
        coordinator.ensure_dispatch_allowed(now),
        Err(CoreError::CircuitOpen { .. })
    ));

    // open timeout is one second
    let later = now + Duration::from_secs(2);
    let report = coordinator
        .submit_batch(&abc_orders(), Some(2), later)
        .unwrap();
    assert_eq!(report.policy_level, PolicyLevel::Restricted);
    assert_eq!(coordinator.health().breaker_state, Some(CircuitState::HalfOpen));

    coordinator.record_success();
    coordinator.record_success();
    assert_eq!(coordinator.health().breaker_state, Some(CircuitState::Closed));
}

#[test]
fn test_restricted_policy_uses_emergency_shedding() {
    let mut config = test_config();
    config.circuit_breakers.enabled = false;
    config.admission.hard_limit = 4;
    let coordinator = DispatchCoordinator::new(&config).unwrap();

    for _ in 0..4 {
        coordinator.record_failure();
    }
    assert_eq!(coordinator.policy().current(), PolicyLevel::Restricted);

    let orders: Vec<Order> = (0..4)
        .map(|i| Order::new(format!("r-{i}"), 4, 20 + i, "west"))
        .collect();
    let report = coordinator
        .submit_batch(&orders, Some(4), Instant::now())
        .unwrap();

    // emergency shedding begins at half of the hard limit
    assert_eq!(report.queued, vec!["r-0", "r-1"]);
    assert!(report
        .refused
        .iter()
        .all(|refused| refused.decision == AdmissionDecision::Shed));
    assert_eq!(report.refused.len(), 2);
}

#[test]
fn test_successes_walk_policy_back_down() {
    let mut config = test_config();
    config.circuit_breakers.enabled = false;
    config.policy.watch_streak = 2;
    let coordinator = DispatchCoordinator::new(&config).unwrap();

    coordinator.record_failure();
    assert_eq!(coordinator.record_failure(), PolicyLevel::Watch);

    assert_eq!(coordinator.record_success(), PolicyLevel::Watch);
    assert_eq!(coordinator.record_success(), PolicyLevel::Watch);
    assert_eq!(coordinator.record_success(), PolicyLevel::Normal);

    let history = coordinator.policy().history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].to, PolicyLevel::Normal);
}

#[test]
fn test_rate_limit_is_per_region() {
    let mut config = test_config();
    config.rate_limit.enabled = true;
    config.rate_limit.capacity = 1.0;
    config.rate_limit.refill_per_second = 0.0;
    let coordinator = DispatchCoordinator::new(&config).unwrap();

    let report = coordinator
        .submit_batch(&abc_orders(), Some(3), Instant::now())
        .unwrap();

    assert_eq!(report.queued, vec!["A", "C"]);
    assert_eq!(
        report.refused,
        vec![RefusedOrder {
            id: "B".to_string(),
            decision: AdmissionDecision::RateLimited,
        }]
    );
}

#[test]
fn test_checkpoint_then_replay_remaining_events() {
    let mut config = test_config();
    config.checkpoint.interval = 5;
    let coordinator = DispatchCoordinator::new(&config).unwrap();

    assert!(!coordinator.record_progress("intake", 5));
    assert!(coordinator.record_progress("intake", 6));
    assert!(!coordinator.record_progress("intake", 11));
    assert!(coordinator.record_progress("intake", 12));

    let log = vec![
        ReplayEvent::new("a", 3),
        ReplayEvent::new("b", 14),
        ReplayEvent::new("a", 13),
        ReplayEvent::new("c", 12),
    ];
    assert_eq!(
        coordinator.pending_events("intake", &log),
        vec![ReplayEvent::new("a", 13), ReplayEvent::new("b", 14)]
    );
}

#[test]
fn test_reset_clears_state_but_keeps_catalogs() {
    let coordinator = DispatchCoordinator::new(&test_config()).unwrap();
    coordinator
        .routing()
        .add(Route::new("alpha", 4.0, 0.9, 120.0))
        .unwrap();
    coordinator
        .registry()
        .register(ServiceDefinition::new("intake", 8080, Vec::<String>::new()))
        .unwrap();
    coordinator
        .submit_batch(&abc_orders(), Some(3), Instant::now())
        .unwrap();
    coordinator.record_progress("intake", 500);

    coordinator.reset();

    let health = coordinator.health();
    assert_eq!(health.queue.depth, 0);
    assert_eq!(health.tracked_entities, 0);
    assert_eq!(health.policy_level, PolicyLevel::Normal);
    assert!(coordinator.checkpoints().is_empty());
    assert_eq!(coordinator.routing().len(), 1);
    assert_eq!(coordinator.registry().len(), 1);

    // the same ids can be submitted again after a reset
    assert!(coordinator
        .submit_batch(&abc_orders(), Some(3), Instant::now())
        .is_ok());
}

#[test]
fn test_routing_and_registry_through_coordinator() {
    let coordinator = DispatchCoordinator::new(&test_config()).unwrap();
    let routing = coordinator.routing();
    routing.add(Route::new("alpha", 4.0, 0.9, 120.0)).unwrap();
    routing.add(Route::new("bravo", 2.0, 0.8, 60.0)).unwrap();
    routing
        .add(Route::new("charlie", 1.0, 0.99, 30.0).inactive())
        .unwrap();

    assert_eq!(routing.best_route(&[]).unwrap().channel, "bravo");
    assert_eq!(routing.best_route(&["bravo"]).unwrap().channel, "alpha");

    let speed = 12.0;
    let estimate = routing.plan_channels(&["alpha", "bravo"], speed);
    assert_eq!(estimate.transit_hours(), Some(15.0));
    assert!(!routing.plan_channels(&["alpha", "zulu"], speed).is_reachable());

    let registry = coordinator.registry();
    registry
        .register_all(vec![
            ServiceDefinition::new("gateway", 8000, ["routing", "intake"]),
            ServiceDefinition::new("routing", 8001, ["intake"]),
            ServiceDefinition::new("intake", 8002, Vec::<String>::new()),
        ])
        .unwrap();
    assert_eq!(
        registry.topological_order().unwrap(),
        vec!["intake", "routing", "gateway"]
    );
}

#[test]
fn test_coordinator_from_loaded_configuration() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("dispatch-core.toml"),
        r#"
[admission]
hard_limit = 2

[rate_limit]
enabled = false

[circuit_breakers.component_configs.dispatch]
failure_threshold = 1
success_threshold = 1
open_timeout_seconds = 5
"#,
    )
    .unwrap();

    let manager =
        ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test")
            .unwrap();
    let coordinator = DispatchCoordinator::from_manager(&manager).unwrap();

    let report = coordinator
        .submit_batch(&abc_orders(), Some(3), Instant::now())
        .unwrap();
    assert_eq!(report.queued.len(), 2);
    assert_eq!(report.refused[0].decision, AdmissionDecision::QueueFull);

    coordinator.record_failure();
    assert_eq!(coordinator.health().breaker_state, Some(CircuitState::Closed));
    coordinator.record_failure();
    assert_eq!(coordinator.health().breaker_state, Some(CircuitState::Open));
}
