//! Multi-leg transit planning at a single constant speed.

use serde::{Deserialize, Serialize};

/// Outcome of planning a journey over one or more legs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransitEstimate {
    Reachable {
        total_distance: f64,
        transit_hours: f64,
    },
    Unreachable {
        reason: String,
    },
}

impl TransitEstimate {
    pub fn is_reachable(&self) -> bool {
        matches!(self, TransitEstimate::Reachable { .. })
    }

    pub fn transit_hours(&self) -> Option<f64> {
        match self {
            TransitEstimate::Reachable { transit_hours, .. } => Some(*transit_hours),
            TransitEstimate::Unreachable { .. } => None,
        }
    }
}

/// Sum leg distances and convert to hours at `speed`. A non-positive speed or
/// a negative leg distance yields `Unreachable` instead of a division result.
/// An empty journey is reachable in zero hours.
pub fn plan_legs(distances: &[f64], speed: f64) -> TransitEstimate {
    if !speed.is_finite() || speed <= 0.0 {
        return TransitEstimate::Unreachable {
            reason: format!("non-positive transit speed {speed}"),
        };
    }

    if let Some((index, distance)) = distances
        .iter()
        .enumerate()
        .find(|(_, distance)| !distance.is_finite() || **distance < 0.0)
    {
        return TransitEstimate::Unreachable {
            reason: format!("leg {index} has invalid distance {distance}"),
        };
    }

    let total_distance: f64 = distances.iter().sum();
    TransitEstimate::Reachable {
        total_distance,
        transit_hours: total_distance / speed,
    }
}
