//! Candidate places discovered around the airport

use serde::{Deserialize, Serialize};

use super::Coordinates;

/// One-way travel metrics from the airport to a place
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TravelAnnotation {
    /// Travel duration in whole minutes
    pub duration_min: u32,
    /// Road distance in kilometers, one decimal
    pub distance_km: Option<f64>,
}

/// A point of interest returned by the places service.
///
/// `travel` stays `None` until the distance matrix reports a successful
/// element for the place; only annotated places are ever ranked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub place_id: String,
    pub name: String,
    pub address: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u32>,
    pub price_level: Option<u8>,
    pub location: Option<Coordinates>,
    pub travel: Option<TravelAnnotation>,
}

impl Place {
    /// Create a bare place with only its identifier and name
    #[must_use]
    pub fn new(place_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            place_id: place_id.into(),
            name: name.into(),
            address: None,
            types: Vec::new(),
            rating: None,
            user_ratings_total: None,
            price_level: None,
            location: None,
            travel: None,
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: Coordinates) -> Self {
        self.location = Some(location);
        self
    }

    #[must_use]
    pub fn with_quality(mut self, rating: f64, user_ratings_total: u32) -> Self {
        self.rating = Some(rating);
        self.user_ratings_total = Some(user_ratings_total);
        self
    }

    #[must_use]
    pub fn with_travel(mut self, duration_min: u32, distance_km: Option<f64>) -> Self {
        self.travel = Some(TravelAnnotation {
            duration_min,
            distance_km,
        });
        self
    }

    /// Rating, with a missing value counted as zero
    #[must_use]
    pub fn rating_or_zero(&self) -> f64 {
        self.rating.unwrap_or(0.0)
    }

    /// Review count, with a missing value counted as zero
    #[must_use]
    pub fn reviews_or_zero(&self) -> u32 {
        self.user_ratings_total.unwrap_or(0)
    }

    /// Annotated one-way travel time, if any
    #[must_use]
    pub fn travel_minutes(&self) -> Option<u32> {
        self.travel.map(|t| t.duration_min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_quality_counts_as_zero() {
        let place = Place::new("p1", "Souq Al Zal");
        assert_eq!(place.rating_or_zero(), 0.0);
        assert_eq!(place.reviews_or_zero(), 0);
        assert_eq!(place.travel_minutes(), None);
    }

    #[test]
    fn test_builder_sets_annotation() {
        let place = Place::new("p1", "Boulevard City")
            .with_quality(4.6, 1200)
            .with_travel(25, Some(18.4));
        assert_eq!(place.travel_minutes(), Some(25));
        assert_eq!(place.reviews_or_zero(), 1200);
    }
}
