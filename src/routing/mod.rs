//! # Routing
//!
//! Corridor route storage, best-route selection under exclusions and
//! multi-leg transit planning.

pub mod planning;
pub mod table;

pub use planning::{plan_legs, TransitEstimate};
pub use table::{choose_route, Route, RoutingTable};
