//! Per-request planning context

use serde::Serialize;

use super::{Coordinates, LayoverMetadata, Place};

/// Everything computed for one request before plan synthesis.
///
/// Built once by the planner, owned by the request, never cached.
#[derive(Debug, Clone, Serialize)]
pub struct PlanningContext {
    /// Formatted address of the airport as resolved by geocoding
    pub airport: String,
    pub airport_code: String,
    pub airport_location: Coordinates,
    pub arrival_time: String,
    pub departure_time: String,
    pub nationality: String,
    /// Best-effort locality label used to anchor text searches
    pub city_hint: Option<String>,
    pub layover_minutes: u32,
    pub usable_minutes: u32,
    pub leave_buffer_min: u32,
    pub return_buffer_min: u32,
    pub earliest_exit_local: String,
    pub latest_return_local: String,
    pub max_one_way_minutes: u32,
    pub radius_m: u32,
    /// Verbatim metadata the generated plan must carry
    pub metadata: LayoverMetadata,
    /// Reachable places, best first
    pub candidates: Vec<Place>,
}

impl PlanningContext {
    /// Whether any excursion fits the layover window at all
    #[must_use]
    pub fn excursion_feasible(&self) -> bool {
        self.max_one_way_minutes > 0
    }
}
