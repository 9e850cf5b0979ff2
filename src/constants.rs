//! # System Constants
//!
//! Fixed operational constants for the dispatch core. Values that operators
//! tune per deployment live in [`crate::config`]; the ones here are part of
//! the scoring and pricing contract and do not change between environments.

/// Order urgency bounds (inclusive)
pub const MIN_URGENCY: u8 = 1;
pub const MAX_URGENCY: u8 = 5;

/// Smallest accepted SLA window in minutes
pub const MIN_SLA_MINUTES: u32 = 1;

/// Weight of one urgency step in the urgency score. Must exceed the largest
/// possible SLA contribution so urgency always dominates.
pub const URGENCY_WEIGHT: f64 = 1000.0;

/// Numerator of the SLA tightness term (`SLA_PRESSURE / sla_minutes`)
pub const SLA_PRESSURE: f64 = 600.0;

/// SLA-banded cost multipliers
pub mod cost_tiers {
    /// One band of the urgency factor table: applies to SLAs `<= max_sla_minutes`
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct CostTier {
        pub max_sla_minutes: u32,
        pub factor: f64,
    }

    pub const CRITICAL: CostTier = CostTier {
        max_sla_minutes: 15,
        factor: 2.0,
    };
    pub const URGENT: CostTier = CostTier {
        max_sla_minutes: 30,
        factor: 1.5,
    };
    pub const PRIORITY: CostTier = CostTier {
        max_sla_minutes: 60,
        factor: 1.25,
    };

    /// Applies to every SLA above the last bounded tier
    pub const STANDARD_FACTOR: f64 = 1.0;

    /// Bounded tiers in ascending order of `max_sla_minutes`
    pub const TIERS: [CostTier; 3] = [CRITICAL, URGENT, PRIORITY];
}

/// Rounding unit for monetary allocations (cents)
pub const COST_SCALE: f64 = 100.0;

/// Default tuning values used by `Default` impls in [`crate::config`]
pub mod defaults {
    pub const QUEUE_HARD_LIMIT: usize = 1000;
    pub const WARN_RATIO: f64 = 0.6;
    pub const EMERGENCY_RATIO: f64 = 0.85;

    pub const RATE_LIMIT_CAPACITY: f64 = 50.0;
    pub const RATE_LIMIT_REFILL_PER_SECOND: f64 = 10.0;

    pub const POLICY_SENSITIVITY: u32 = 3;
    pub const WATCH_STREAK: u32 = 5;
    pub const RESTRICTED_STREAK: u32 = 10;
    pub const HALTED_STREAK: u32 = 20;

    pub const FAILURE_THRESHOLD: u32 = 5;
    pub const SUCCESS_THRESHOLD: u32 = 2;
    pub const OPEN_TIMEOUT_SECONDS: u64 = 30;

    pub const CHECKPOINT_INTERVAL: u64 = 100;

    /// Most recent dispatch outcomes kept for the coordinator's failure rate
    pub const OUTCOME_WINDOW: usize = 50;

    pub const TRANSIT_SPEED: f64 = 12.0;
    pub const SERVICE_MINUTES: u32 = 15;
    pub const BASE_RATE: f64 = 100.0;
}

/// Environment variable names read at startup
pub mod env {
    pub const ENVIRONMENT: &str = "DISPATCH_ENV";
    pub const FALLBACK_ENVIRONMENT: &str = "APP_ENV";
    pub const LOG_FORMAT: &str = "DISPATCH_LOG_FORMAT";
    pub const CONFIG_DIR: &str = "DISPATCH_CONFIG_DIR";
    pub const CONFIG_PREFIX: &str = "DISPATCH_CORE";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_tiers_are_contiguous_and_ascending() {
        let tiers = cost_tiers::TIERS;
        for pair in tiers.windows(2) {
            assert!(pair[0].max_sla_minutes < pair[1].max_sla_minutes);
            assert!(pair[0].factor > pair[1].factor);
        }
        assert!(tiers[2].factor > cost_tiers::STANDARD_FACTOR);
    }

    #[test]
    fn test_urgency_dominates_sla_term() {
        // Tightest SLA contribution is SLA_PRESSURE / MIN_SLA_MINUTES
        assert!(URGENCY_WEIGHT > SLA_PRESSURE / f64::from(MIN_SLA_MINUTES));
    }
}
