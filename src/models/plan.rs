//! Structured layover plan returned to callers
//!
//! The same types define the JSON schema the generation service must follow,
//! so a plan that deserializes and passes [`LayoverPlan::check`] is exactly
//! what the schema describes.

use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{PlannerError, Result};

/// Upper bound on recommended stops
pub const MAX_STOPS: usize = 8;

/// Primary mode of transport to reach a stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Walk,
    Metro,
    Bus,
    Taxi,
    Rideshare,
}

/// Metadata about the layover itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LayoverMetadata {
    /// IATA code of the airport e.g. 'RUH'
    pub airport: String,
    /// Total layover time e.g. '8h 30m'
    pub layover_duration: String,
    /// Buffer reserved for leaving and returning to the airport
    pub safety_buffer: String,
    /// Time by which the passenger must be back, in HH:MM
    pub must_return_by: String,
    /// Current local time in HH:MM
    pub current_time: String,
}

/// A recommended activity or place to visit during the layover
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RecommendedStop {
    /// Unique identifier for the stop, starting at 1
    #[schemars(range(min = 1))]
    pub id: u32,
    /// Name of the stop
    #[schemars(length(min = 3, max = 100))]
    pub title: String,
    /// Brief description of the stop
    #[schemars(length(min = 10, max = 500))]
    pub description: String,
    /// Categories e.g. ['food', 'sightseeing']
    #[schemars(length(min = 1))]
    pub tags: Vec<String>,
    /// Opening hours in HH:MM-HH:MM format
    pub opening_hours: Option<String>,
    /// Estimated visit duration e.g. '30-60 min'
    pub duration_range: String,
    /// Approximate cost e.g. 'Free', '$10-20'
    pub cost: String,
    /// Primary mode of transport to reach the stop
    pub transport: TransportMode,
    /// Alternative choices for the stop
    #[serde(default)]
    pub options: Vec<String>,
    /// Extra notes, tips, or warnings
    pub notes: Option<String>,
}

/// Baggage storage at or near the airport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BaggageStorage {
    /// Name of the storage service
    pub title: String,
    /// Where it is located
    pub location: String,
    /// Pricing info e.g. '50 SAR/day'
    pub rate: String,
    /// Availability e.g. '24/7'
    pub availability: String,
}

/// Cultural or practical information about the layover city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LocalInsight {
    /// Title of the insight
    pub title: String,
    /// Insight points
    pub content: Vec<String>,
}

/// Full layover plan including stops, baggage, and local insights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LayoverPlan {
    pub metadata: LayoverMetadata,
    /// Recommended stops, in visiting order
    #[schemars(length(max = 8))]
    pub recommended_stops: Vec<RecommendedStop>,
    #[serde(default)]
    pub baggage_storage: Vec<BaggageStorage>,
    #[serde(default)]
    pub local_insights: Vec<LocalInsight>,
}

impl LayoverPlan {
    /// JSON schema the generation service output must conform to
    #[must_use]
    pub fn json_schema() -> Value {
        Value::from(schemars::schema_for!(LayoverPlan))
    }

    /// A plan that keeps the traveler inside the airport.
    ///
    /// Used when no excursion fits the window; `reason` becomes the single
    /// local insight.
    #[must_use]
    pub fn stay_in_airport(metadata: LayoverMetadata, reason: &str) -> Self {
        let content = vec![
            reason.to_string(),
            format!(
                "Stay airside and be at your gate well before {}.",
                metadata.must_return_by
            ),
        ];
        Self {
            metadata,
            recommended_stops: Vec::new(),
            baggage_storage: Vec::new(),
            local_insights: vec![LocalInsight {
                title: "Layover advice".to_string(),
                content,
            }],
        }
    }

    /// Semantic checks the schema cannot express on its own.
    ///
    /// `require_stops` is set whenever an excursion is feasible; an empty
    /// stop list is then a contract violation.
    pub fn check(&self, require_stops: bool) -> Result<()> {
        let stops = &self.recommended_stops;
        if stops.len() > MAX_STOPS {
            return Err(PlannerError::generation(format!(
                "expected at most {MAX_STOPS} recommended stops, got {}",
                stops.len()
            )));
        }
        if require_stops && stops.is_empty() {
            return Err(PlannerError::generation(
                "no recommended stops although an excursion is feasible",
            ));
        }

        let mut seen = HashSet::new();
        for stop in stops {
            if stop.id == 0 {
                return Err(PlannerError::generation("stop ids start at 1"));
            }
            if !seen.insert(stop.id) {
                return Err(PlannerError::generation(format!(
                    "duplicate stop id {}",
                    stop.id
                )));
            }
            let title_len = stop.title.chars().count();
            if !(3..=100).contains(&title_len) {
                return Err(PlannerError::generation(format!(
                    "stop {} title must be 3-100 characters",
                    stop.id
                )));
            }
            let description_len = stop.description.chars().count();
            if !(10..=500).contains(&description_len) {
                return Err(PlannerError::generation(format!(
                    "stop {} description must be 10-500 characters",
                    stop.id
                )));
            }
            if stop.tags.iter().all(|t| t.trim().is_empty()) {
                return Err(PlannerError::generation(format!(
                    "stop {} has no tags",
                    stop.id
                )));
            }
        }
        Ok(())
    }
}
