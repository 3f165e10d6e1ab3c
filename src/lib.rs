//! Layover Planner - airport layover excursion planning
//!
//! This library turns a layover window into a feasible travel radius, finds
//! and ranks reachable places around the airport, and asks a text generation
//! service to render a schema-validated itinerary from those facts.

pub mod airports;
pub mod api;
pub mod budget;
pub mod config;
pub mod error;
pub mod generation;
pub mod http;
pub mod logging;
pub mod maps;
pub mod models;
pub mod planner;
pub mod ranking;
pub mod web;

#[cfg(test)]
mod test_support;

// Re-export core types for public API
pub use budget::{BudgetCalculator, TimeBudget};
pub use config::LayoverConfig;
pub use error::PlannerError;
pub use generation::{PlanGateway, TextGenerator};
pub use maps::{DiscoveryReport, MapsProvider, QueryOutcome};
pub use models::{LayoverPlan, PlanRequest, PlanningContext};
pub use planner::{LayoverPlanner, PlanOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, PlannerError>;
