//! Load shedding decision and queue health classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether new work should be shed at the given queue depth.
///
/// Normal mode sheds only when `depth > hard_limit`. Emergency mode sheds once
/// `depth >= hard_limit / 2` (compared without integer truncation). A zero
/// hard limit always sheds.
pub fn should_shed(depth: usize, hard_limit: usize, emergency: bool) -> bool {
    if hard_limit == 0 {
        return true;
    }
    if emergency {
        depth.saturating_mul(2) >= hard_limit
    } else {
        depth > hard_limit
    }
}

/// Utilization band, ordered from least to most loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Elevated,
    Warning,
    Critical,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Healthy => "healthy",
            Self::Elevated => "elevated",
            Self::Warning => "warning",
            Self::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueueHealth {
    pub depth: usize,
    pub hard_limit: usize,
    pub utilization: f64,
    pub status: HealthStatus,
}

/// Queue utilization, defined as 1.0 for a zero hard limit
pub fn utilization(depth: usize, hard_limit: usize) -> f64 {
    if hard_limit == 0 {
        1.0
    } else {
        depth as f64 / hard_limit as f64
    }
}

/// Bands are inclusive on their lower bound:
/// `healthy < warn_ratio <= elevated < emergency_ratio <= warning < 1.0 <= critical`
pub fn classify_queue_health(
    depth: usize,
    hard_limit: usize,
    warn_ratio: f64,
    emergency_ratio: f64,
) -> QueueHealth {
    let utilization = utilization(depth, hard_limit);
    let status = if utilization >= 1.0 {
        HealthStatus::Critical
    } else if utilization >= emergency_ratio {
        HealthStatus::Warning
    } else if utilization >= warn_ratio {
        HealthStatus::Elevated
    } else {
        HealthStatus::Healthy
    };

    QueueHealth {
        depth,
        hard_limit,
        utilization,
        status,
    }
}
