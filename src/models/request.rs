//! Inbound planning request

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::{PlannerError, Result};

/// Wire shape of a planning request, checked before it becomes a [`PlanRequest`]
#[derive(Debug, Deserialize)]
struct RawPlanRequest {
    airport_code: String,
    arrival_time: DateTime<FixedOffset>,
    departure_time: DateTime<FixedOffset>,
    nationality: String,
}

/// A validated layover planning request.
///
/// The airport code is three uppercase ASCII letters, the nationality is
/// 2 to 64 characters, and departure is strictly after arrival. Construction
/// goes through [`PlanRequest::new`] or deserialization, both of which enforce
/// these rules, so the layover length derived from a value never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPlanRequest")]
pub struct PlanRequest {
    airport_code: String,
    arrival_time: DateTime<FixedOffset>,
    departure_time: DateTime<FixedOffset>,
    nationality: String,
}

impl TryFrom<RawPlanRequest> for PlanRequest {
    type Error = PlannerError;

    fn try_from(raw: RawPlanRequest) -> Result<Self> {
        Self::new(
            raw.airport_code,
            raw.arrival_time,
            raw.departure_time,
            raw.nationality,
        )
    }
}

impl PlanRequest {
    pub fn new(
        airport_code: impl Into<String>,
        arrival_time: DateTime<FixedOffset>,
        departure_time: DateTime<FixedOffset>,
        nationality: impl Into<String>,
    ) -> Result<Self> {
        let airport_code = airport_code.into();
        let nationality = nationality.into();

        if airport_code.len() != 3 || !airport_code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(PlannerError::validation(
                "Airport code must be exactly 3 uppercase letters (IATA code)",
            ));
        }

        let nationality_len = nationality.chars().count();
        if !(2..=64).contains(&nationality_len) {
            return Err(PlannerError::validation(
                "Nationality must be between 2 and 64 characters",
            ));
        }

        if departure_time <= arrival_time {
            return Err(PlannerError::validation(
                "Departure time must be later than arrival time",
            ));
        }

        Ok(Self {
            airport_code,
            arrival_time,
            departure_time,
            nationality,
        })
    }

    #[must_use]
    pub fn airport_code(&self) -> &str {
        &self.airport_code
    }

    #[must_use]
    pub fn arrival_time(&self) -> DateTime<FixedOffset> {
        self.arrival_time
    }

    #[must_use]
    pub fn departure_time(&self) -> DateTime<FixedOffset> {
        self.departure_time
    }

    #[must_use]
    pub fn nationality(&self) -> &str {
        &self.nationality
    }

    /// Whole minutes between arrival and departure (rounded down)
    #[must_use]
    pub fn layover_minutes(&self) -> u32 {
        let minutes = (self.departure_time - self.arrival_time).num_minutes();
        u32::try_from(minutes).unwrap_or(u32::MAX)
    }
}
