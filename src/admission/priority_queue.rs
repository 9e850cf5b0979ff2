//! Bounded priority queue: highest priority first, FIFO among equals.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Work item waiting for dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: String,
    /// Larger values are dequeued first
    pub priority: i64,
}

impl QueueItem {
    pub fn new(id: impl Into<String>, priority: i64) -> Self {
        Self {
            id: id.into(),
            priority,
        }
    }
}

#[derive(Debug)]
struct Entry {
    item: QueueItem,
    sequence: u64,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // max-heap: higher priority wins, then the earlier insertion
        self.item
            .priority
            .cmp(&other.item.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.sequence == other.sequence
    }
}

impl Eq for Entry {}

#[derive(Debug, Default)]
struct QueueState {
    heap: BinaryHeap<Entry>,
    next_sequence: u64,
}

/// Priority queue that never holds more than `hard_limit` items
#[derive(Debug)]
pub struct BoundedPriorityQueue {
    hard_limit: usize,
    state: Mutex<QueueState>,
}

impl BoundedPriorityQueue {
    pub fn new(hard_limit: usize) -> Self {
        Self {
            hard_limit,
            state: Mutex::new(QueueState::default()),
        }
    }

    pub fn hard_limit(&self) -> usize {
        self.hard_limit
    }

    /// Add an item. Returns `false` without modifying the queue when full.
    pub fn enqueue(&self, item: QueueItem) -> bool {
        let mut state = self.state.lock();
        if state.heap.len() >= self.hard_limit {
            return false;
        }
        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.heap.push(Entry { item, sequence });
        true
    }

    pub fn dequeue(&self) -> Option<QueueItem> {
        self.state.lock().heap.pop().map(|entry| entry.item)
    }

    pub fn peek(&self) -> Option<QueueItem> {
        self.state.lock().heap.peek().map(|entry| entry.item.clone())
    }

    /// Empty the queue in one step, returning its items in dequeue order
    pub fn drain(&self) -> Vec<QueueItem> {
        let heap = std::mem::take(&mut self.state.lock().heap);
        heap.into_sorted_vec()
            .into_iter()
            .rev()
            .map(|entry| entry.item)
            .collect()
    }

    /// Drop the item with this id, if queued. Other items keep their order.
    pub fn remove(&self, id: &str) -> Option<QueueItem> {
        let mut state = self.state.lock();
        let mut removed = None;
        state.heap.retain(|entry| {
            if removed.is_none() && entry.item.id == id {
                removed = Some(entry.item.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.state.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().heap.is_empty()
    }

    pub fn clear(&self) {
        self.state.lock().heap.clear();
    }
}
