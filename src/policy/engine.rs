//! # Policy Engine
//!
//! Walks the escalation ladder one step at a time. Failure bursts above the
//! configured sensitivity escalate; success streaks above a per-level
//! threshold de-escalate. Only actual level changes are written to history.

use super::level::PolicyLevel;
use crate::config::PolicyConfig;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// A recorded level change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyChange {
    pub from: PolicyLevel,
    pub to: PolicyLevel,
    pub reason: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct PolicyState {
    level: PolicyLevel,
    history: Vec<PolicyChange>,
}

impl PolicyState {
    fn move_to(&mut self, to: PolicyLevel, reason: String) -> PolicyLevel {
        let from = self.level;
        if from == to {
            return from;
        }

        if to > from {
            warn!(from = %from, to = %to, reason = %reason, "Policy escalated");
        } else {
            info!(from = %from, to = %to, reason = %reason, "Policy de-escalated");
        }

        self.level = to;
        self.history.push(PolicyChange {
            from,
            to,
            reason,
            at: Utc::now(),
        });
        to
    }
}

#[derive(Debug)]
pub struct PolicyEngine {
    config: PolicyConfig,
    state: Mutex<PolicyState>,
}

impl PolicyEngine {
    pub fn new(config: PolicyConfig) -> Self {
        Self {
            config,
            state: Mutex::new(PolicyState::default()),
        }
    }

    pub fn current(&self) -> PolicyLevel {
        self.state.lock().level
    }

    /// Step up one level if `failure_burst` exceeds the sensitivity
    pub fn escalate(&self, failure_burst: u32) -> PolicyLevel {
        let mut state = self.state.lock();
        self.escalate_locked(&mut state, failure_burst)
    }

    /// Step down one level, unconditionally
    pub fn deescalate(&self) -> PolicyLevel {
        let mut state = self.state.lock();
        let to = state.level.deescalated();
        state.move_to(to, "manual de-escalation".to_string())
    }

    /// Whether `success_streak` strictly exceeds the threshold for `level`.
    /// `Normal` has nowhere to go and always answers `false`.
    pub fn should_deescalate(&self, success_streak: u32, level: PolicyLevel) -> bool {
        self.streak_threshold(level)
            .is_some_and(|threshold| success_streak > threshold)
    }

    /// Success streak that must be exceeded to leave `level`
    pub fn streak_threshold(&self, level: PolicyLevel) -> Option<u32> {
        match level {
            PolicyLevel::Normal => None,
            PolicyLevel::Watch => Some(self.config.watch_streak),
            PolicyLevel::Restricted => Some(self.config.restricted_streak),
            PolicyLevel::Halted => Some(self.config.halted_streak),
        }
    }

    /// Apply one observation window: escalate on a burst, otherwise
    /// de-escalate when the streak allows it. At most one step per call.
    pub fn evaluate(&self, failure_burst: u32, success_streak: u32) -> PolicyLevel {
        let mut state = self.state.lock();
        if failure_burst > self.config.sensitivity {
            return self.escalate_locked(&mut state, failure_burst);
        }

        let level = state.level;
        if self.should_deescalate(success_streak, level) {
            let reason = format!(
                "success streak {success_streak} exceeded {} threshold",
                level
            );
            return state.move_to(level.deescalated(), reason);
        }
        level
    }

    fn escalate_locked(&self, state: &mut PolicyState, failure_burst: u32) -> PolicyLevel {
        if failure_burst <= self.config.sensitivity {
            return state.level;
        }
        let to = state.level.escalated();
        let reason = format!(
            "failure burst {failure_burst} exceeded sensitivity {}",
            self.config.sensitivity
        );
        state.move_to(to, reason)
    }

    pub fn history(&self) -> Vec<PolicyChange> {
        self.state.lock().history.clone()
    }

    /// Back to `Normal` with an empty history
    pub fn reset(&self) {
        let mut state = self.state.lock();
        *state = PolicyState::default();
    }
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::new(PolicyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> PolicyEngine {
        PolicyEngine::new(PolicyConfig {
            sensitivity: 3,
            watch_streak: 2,
            restricted_streak: 4,
            halted_streak: 6,
        })
    }

    #[test]
    fn test_burst_must_exceed_sensitivity() {
        let engine = engine();
        assert_eq!(engine.escalate(3), PolicyLevel::Normal);
        assert_eq!(engine.escalate(4), PolicyLevel::Watch);
        assert!(engine.history().len() == 1);
    }

    #[test]
    fn test_escalation_moves_one_step_and_clamps() {
        let engine = engine();
        for expected in [
            PolicyLevel::Watch,
            PolicyLevel::Restricted,
            PolicyLevel::Halted,
            PolicyLevel::Halted,
        ] {
            assert_eq!(engine.escalate(100), expected);
        }
        // clamped no-op is not recorded
        assert_eq!(engine.history().len(), 3);
    }

    #[test]
    fn test_deescalate_is_unconditional_and_clamped() {
        let engine = engine();
        engine.escalate(10);
        assert_eq!(engine.deescalate(), PolicyLevel::Normal);
        assert_eq!(engine.deescalate(), PolicyLevel::Normal);

        let history = engine.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].from, PolicyLevel::Watch);
        assert_eq!(history[1].to, PolicyLevel::Normal);
    }

    #[test]
    fn test_should_deescalate_requires_strictly_longer_streak() {
        let engine = engine();
        assert!(!engine.should_deescalate(2, PolicyLevel::Watch));
        assert!(engine.should_deescalate(3, PolicyLevel::Watch));
        assert!(!engine.should_deescalate(6, PolicyLevel::Halted));
        assert!(engine.should_deescalate(7, PolicyLevel::Halted));
        assert!(!engine.should_deescalate(u32::MAX, PolicyLevel::Normal));
    }

    #[test]
    fn test_evaluate_combines_both_directions() {
        let engine = engine();
        assert_eq!(engine.evaluate(5, 0), PolicyLevel::Watch);
        assert_eq!(engine.evaluate(5, 0), PolicyLevel::Restricted);
        assert_eq!(engine.evaluate(0, 4), PolicyLevel::Restricted);
        assert_eq!(engine.evaluate(0, 5), PolicyLevel::Watch);
        assert_eq!(engine.evaluate(0, 3), PolicyLevel::Normal);
        assert_eq!(engine.evaluate(0, 100), PolicyLevel::Normal);

        engine.reset();
        assert_eq!(engine.current(), PolicyLevel::Normal);
        assert!(engine.history().is_empty());
    }
}
