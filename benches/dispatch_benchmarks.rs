use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dispatch_core::admission::{BoundedPriorityQueue, QueueItem};
use dispatch_core::dispatch::{allocate_costs, plan_dispatch, Order};
use dispatch_core::resilience::{replay, ReplayEvent};

fn backlog(size: usize) -> Vec<Order> {
    (0..size)
        .map(|i| {
            Order::new(
                format!("order-{i}"),
                (i % 5) as i64 + 1,
                (i % 240) as i64 + 1,
                "north",
            )
        })
        .collect()
}

fn benchmark_plan_dispatch(c: &mut Criterion) {
    let orders = backlog(1_000);
    c.bench_function("plan_dispatch_1000", |b| {
        b.iter(|| plan_dispatch(black_box(&orders), black_box(100)))
    });
}

fn benchmark_allocate_costs(c: &mut Criterion) {
    let orders = backlog(1_000);
    c.bench_function("allocate_costs_1000", |b| {
        b.iter(|| allocate_costs(black_box(&orders), black_box(25_000.0)))
    });
}

fn benchmark_replay(c: &mut Criterion) {
    let events: Vec<ReplayEvent> = (0..5_000u64)
        .map(|i| ReplayEvent::new(format!("event-{}", i % 500), i))
        .collect();
    c.bench_function("replay_5000", |b| b.iter(|| replay(black_box(&events))));
}

fn benchmark_queue(c: &mut Criterion) {
    c.bench_function("queue_enqueue_drain_1000", |b| {
        b.iter(|| {
            let queue = BoundedPriorityQueue::new(1_000);
            for i in 0..1_000i64 {
                queue.enqueue(QueueItem::new(i.to_string(), i % 7));
            }
            black_box(queue.drain())
        })
    });
}

criterion_group!(
    benches,
    benchmark_plan_dispatch,
    benchmark_allocate_costs,
    benchmark_replay,
    benchmark_queue
);
criterion_main!(benches);
