//! Data models for the layover planner
//!
//! This module contains the typed contracts flowing through the planner:
//! - Request: the validated inbound layover request
//! - Place: candidates discovered around the airport and their travel metrics
//! - Context: the per-request planning facts
//! - Plan: the structured plan and its generation schema

pub mod context;
pub mod location;
pub mod place;
pub mod plan;
pub mod request;

pub use context::PlanningContext;
pub use location::Coordinates;
pub use place::{Place, TravelAnnotation};
pub use plan::{
    BaggageStorage, LayoverMetadata, LayoverPlan, LocalInsight, RecommendedStop, TransportMode,
};
pub use request::PlanRequest;
