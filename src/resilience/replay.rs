//! Idempotent event replay.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// An event in a replay log
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReplayEvent {
    pub id: String,
    pub sequence: u64,
}

impl ReplayEvent {
    pub fn new(id: impl Into<String>, sequence: u64) -> Self {
        Self {
            id: id.into(),
            sequence,
        }
    }
}

/// Keep the highest-sequence entry for every id and order the result by
/// `(sequence, id)`. The output does not depend on the input order.
pub fn replay(events: &[ReplayEvent]) -> Vec<ReplayEvent> {
    let mut latest: HashMap<&str, u64> = HashMap::with_capacity(events.len());
    for event in events {
        latest
            .entry(event.id.as_str())
            .and_modify(|sequence| *sequence = (*sequence).max(event.sequence))
            .or_insert(event.sequence);
    }

    let mut merged: Vec<ReplayEvent> = latest
        .into_iter()
        .map(|(id, sequence)| ReplayEvent::new(id, sequence))
        .collect();
    merged.sort_by(|a, b| a.sequence.cmp(&b.sequence).then_with(|| a.id.cmp(&b.id)));
    merged
}

/// [`replay`] restricted to entries with a sequence after `after_sequence`,
/// typically the last checkpoint of the stream.
pub fn replay_since(events: &[ReplayEvent], after_sequence: u64) -> Vec<ReplayEvent> {
    replay(events)
        .into_iter()
        .filter(|event| event.sequence > after_sequence)
        .collect()
}

/// Drop repeated ids, keeping the first occurrence and the input order.
/// For logs whose ordering is already guaranteed upstream.
pub fn deduplicate(events: &[ReplayEvent]) -> Vec<ReplayEvent> {
    let mut seen = HashSet::with_capacity(events.len());
    events
        .iter()
        .filter(|event| seen.insert(event.id.as_str()))
        .cloned()
        .collect()
}
