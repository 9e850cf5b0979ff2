//! Per-stream checkpoints bounding replay distance.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: String,
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
}

/// One checkpoint per id, overwritten on every record
#[derive(Debug)]
pub struct CheckpointManager {
    interval: u64,
    checkpoints: Mutex<HashMap<String, Checkpoint>>,
}

impl CheckpointManager {
    pub fn new(interval: u64) -> Self {
        Self {
            interval,
            checkpoints: Mutex::new(HashMap::new()),
        }
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// Store the checkpoint for `id` stamped with the current time
    pub fn record(&self, id: &str, sequence: u64) -> Checkpoint {
        self.record_at(id, sequence, Utc::now())
    }

    pub fn record_at(&self, id: &str, sequence: u64, timestamp: DateTime<Utc>) -> Checkpoint {
        let checkpoint = Checkpoint {
            id: id.to_string(),
            sequence,
            timestamp,
        };
        self.checkpoints
            .lock()
            .insert(id.to_string(), checkpoint.clone());

        debug!(stream = %id, sequence = sequence, "Checkpoint recorded");
        checkpoint
    }

    /// True once `current_sequence` is more than `interval` past `last_sequence`
    pub fn should_checkpoint(&self, current_sequence: u64, last_sequence: u64) -> bool {
        current_sequence.saturating_sub(last_sequence) > self.interval
    }

    pub fn get(&self, id: &str) -> Option<Checkpoint> {
        self.checkpoints.lock().get(id).cloned()
    }

    pub fn last_sequence(&self, id: &str) -> Option<u64> {
        self.checkpoints.lock().get(id).map(|c| c.sequence)
    }

    /// Snapshot of every checkpoint, ordered by id
    pub fn all(&self) -> Vec<Checkpoint> {
        let mut all: Vec<Checkpoint> = self.checkpoints.lock().values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    pub fn len(&self) -> usize {
        self.checkpoints.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.lock().is_empty()
    }

    pub fn reset(&self) {
        self.checkpoints.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gap_must_strictly_exceed_interval() {
        let manager = CheckpointManager::new(100);
        assert!(!manager.should_checkpoint(100, 0));
        assert!(manager.should_checkpoint(101, 0));
        assert!(!manager.should_checkpoint(5, 50));
    }

    #[test]
    fn test_record_overwrites_per_id() {
        let manager = CheckpointManager::new(10);
        manager.record("berths", 5);
        manager.record("grid", 9);
        manager.record("berths", 42);

        assert_eq!(manager.len(), 2);
        assert_eq!(manager.last_sequence("berths"), Some(42));
        let ids: Vec<String> = manager.all().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["berths", "grid"]);

        manager.reset();
        assert!(manager.is_empty());
        assert!(manager.get("grid").is_none());
    }
}
