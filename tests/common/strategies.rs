use dispatch_core::dispatch::Order;
use dispatch_core::resilience::ReplayEvent;
use proptest::prelude::*;

/// Strategy for generating order ids
pub fn order_id_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,3}-[0-9]{1,4}"
}

/// Strategy for generating region keys
pub fn region_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("north".to_string()),
        Just("south".to_string()),
        Just("east".to_string()),
        Just("west".to_string()),
    ]
}

/// Strategy for generating a single valid order
pub fn order_strategy() -> impl Strategy<Value = Order> {
    (order_id_strategy(), 1i64..=5, 1i64..=480, region_strategy())
        .prop_map(|(id, urgency, sla, region)| Order::new(id, urgency, sla, region))
}

/// Strategy for generating orders with unique ids
pub fn unique_orders_strategy(max_len: usize) -> impl Strategy<Value = Vec<Order>> {
    prop::collection::vec(order_strategy(), 0..=max_len).prop_map(|orders| {
        let mut seen = std::collections::HashSet::new();
        orders
            .into_iter()
            .filter(|order| seen.insert(order.id.clone()))
            .collect()
    })
}

/// Strategy for generating replay logs with repeated ids
pub fn replay_log_strategy() -> impl Strategy<Value = Vec<ReplayEvent>> {
    prop::collection::vec(("[a-e]", 0u64..50), 0..40).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(id, sequence)| ReplayEvent::new(id, sequence))
            .collect()
    })
}

/// Strategy for generating circuit breaker outcome streams (`true` = success)
pub fn outcome_stream_strategy() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(any::<bool>(), 0..60)
}
