//! # Routing Table
//!
//! Keyed store of corridor routes with best-route selection.
//!
//! Route selection is available both as the free function [`choose_route`]
//! (for callers holding their own candidate list) and through
//! [`RoutingTable::best_route`], which considers active routes only.

use super::planning::{plan_legs, TransitEstimate};
use crate::error::{CoreError, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, info};

/// Route metadata for one channel/corridor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub channel: String,
    /// Observed latency, never negative for stored routes
    pub latency: f64,
    /// Delivery reliability in `[0, 1]`
    pub reliability: f64,
    pub distance: f64,
    pub active: bool,
}

impl Route {
    pub fn new(channel: impl Into<String>, latency: f64, reliability: f64, distance: f64) -> Self {
        Self {
            channel: channel.into(),
            latency,
            reliability,
            distance,
            active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.channel.trim().is_empty() {
            return Err(CoreError::Validation(
                "route channel must not be empty".to_string(),
            ));
        }
        if !self.latency.is_finite() || self.latency < 0.0 {
            return Err(CoreError::Validation(format!(
                "route {} has invalid latency {}",
                self.channel, self.latency
            )));
        }
        if !(0.0..=1.0).contains(&self.reliability) {
            return Err(CoreError::Validation(format!(
                "route {} reliability {} is outside [0, 1]",
                self.channel, self.reliability
            )));
        }
        if !self.distance.is_finite() || self.distance < 0.0 {
            return Err(CoreError::Validation(format!(
                "route {} has invalid distance {}",
                self.channel, self.distance
            )));
        }
        Ok(())
    }
}

/// Pick the lowest-latency route whose channel is not blocked. Routes with
/// negative (or NaN) latency are ignored. Ties go to the lexicographically
/// smallest channel.
pub fn choose_route<'a>(routes: &'a [Route], blocked: &[&str]) -> Option<&'a Route> {
    routes
        .iter()
        .filter(|route| !blocked.contains(&route.channel.as_str()))
        .filter(|route| route.latency >= 0.0)
        .min_by(|a, b| compare_routes(a, b))
}

fn compare_routes(a: &Route, b: &Route) -> Ordering {
    a.latency
        .total_cmp(&b.latency)
        .then_with(|| a.channel.cmp(&b.channel))
}

/// Thread-safe route store keyed by channel
#[derive(Debug, Default)]
pub struct RoutingTable {
    routes: Mutex<HashMap<String, Route>>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the route for its channel. Returns the replaced
    /// route, if any.
    pub fn add(&self, route: Route) -> Result<Option<Route>> {
        route.validate()?;
        let channel = route.channel.clone();
        let previous = self.routes.lock().insert(channel.clone(), route);

        debug!(
            channel = %channel,
            replaced = previous.is_some(),
            "Route stored"
        );
        Ok(previous)
    }

    /// Remove a channel. `None` means the channel was not present.
    pub fn remove(&self, channel: &str) -> Option<Route> {
        let removed = self.routes.lock().remove(channel);
        if removed.is_some() {
            info!(channel = %channel, "Route removed");
        }
        removed
    }

    pub fn get(&self, channel: &str) -> Option<Route> {
        self.routes.lock().get(channel).cloned()
    }

    /// Snapshot of every route, ordered by channel
    pub fn all(&self) -> Vec<Route> {
        let mut routes: Vec<Route> = self.routes.lock().values().cloned().collect();
        routes.sort_by(|a, b| a.channel.cmp(&b.channel));
        routes
    }

    /// Best active route that is not blocked
    pub fn best_route(&self, blocked: &[&str]) -> Option<Route> {
        let active: Vec<Route> = self
            .routes
            .lock()
            .values()
            .filter(|route| route.active)
            .cloned()
            .collect();
        choose_route(&active, blocked).cloned()
    }

    /// Plan a journey through the named channels in order. An unknown channel
    /// makes the journey unreachable.
    pub fn plan_channels(&self, channels: &[&str], speed: f64) -> TransitEstimate {
        let distances: std::result::Result<Vec<f64>, String> = {
            let routes = self.routes.lock();
            channels
                .iter()
                .map(|channel| {
                    routes
                        .get(*channel)
                        .map(|route| route.distance)
                        .ok_or_else(|| format!("unknown channel {channel}"))
                })
                .collect()
        };

        match distances {
            Ok(distances) => plan_legs(&distances, speed),
            Err(reason) => TransitEstimate::Unreachable { reason },
        }
    }

    pub fn len(&self) -> usize {
        self.routes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.lock().is_empty()
    }

    pub fn clear(&self) {
        self.routes.lock().clear();
    }
}
