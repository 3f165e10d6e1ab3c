//! Place discovery around the airport
//!
//! Runs a fixed battery of category and free-text searches concurrently,
//! records what each query produced, and merges the survivors into one
//! deduplicated, quality-sorted candidate list.

use std::collections::HashSet;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use super::{MapsProvider, PlaceQuery};
use crate::models::{Coordinates, Place};
use crate::{PlannerError, Result};

/// Category searches, ranked by distance from the airport
pub const NEARBY_TYPES: [&str; 9] = [
    "shopping_mall",
    "park",
    "museum",
    "tourist_attraction",
    "art_gallery",
    "amusement_park",
    "zoo",
    "cafe",
    "restaurant",
];

/// Free-text searches, suffixed with the city when one is known
pub const TEXT_QUERIES: [&str; 13] = [
    "boulevard",
    "front",
    "mall",
    "market",
    "souq",
    "heritage",
    "museum",
    "park",
    "family entertainment",
    "theme park",
    "food court",
    "coffee",
    "shawarma",
];

/// Parameters of one discovery run
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub radius_m: u32,
    pub city_hint: Option<String>,
    pub max_results: usize,
    pub min_rating: Option<f64>,
    pub min_reviews: Option<u32>,
}

impl DiscoveryOptions {
    #[must_use]
    pub fn new(radius_m: u32, max_results: usize) -> Self {
        Self {
            radius_m,
            city_hint: None,
            max_results,
            min_rating: None,
            min_reviews: None,
        }
    }

    #[must_use]
    pub fn with_city_hint(mut self, city_hint: Option<String>) -> Self {
        self.city_hint = city_hint;
        self
    }

    #[must_use]
    pub fn with_quality_floor(mut self, min_rating: Option<f64>, min_reviews: Option<u32>) -> Self {
        self.min_rating = min_rating;
        self.min_reviews = min_reviews;
        self
    }

    /// Results collected per query before pagination stops
    #[must_use]
    pub fn per_query_budget(&self) -> usize {
        (self.max_results / 2).max(1)
    }

    fn accepts(&self, place: &Place) -> bool {
        self.min_rating
            .is_none_or(|min| place.rating_or_zero() >= min)
            && self
                .min_reviews
                .is_none_or(|min| place.reviews_or_zero() >= min)
    }
}

/// What a single query produced
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    /// Query label, e.g. `nearby:museum` or `text:souq in Riyadh`
    pub label: String,
    /// Places found, or the reason the query failed
    pub result: std::result::Result<Vec<Place>, String>,
}

impl QueryOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-query outcomes plus the merged candidate list
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    /// One outcome per query, in battery order
    pub outcomes: Vec<QueryOutcome>,
    /// Deduplicated, filtered, sorted, truncated places
    pub places: Vec<Place>,
}

impl DiscoveryReport {
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Discovery runner over any maps provider
pub struct PlaceDiscovery<'a> {
    maps: &'a dyn MapsProvider,
    page_delay: Duration,
}

impl<'a> PlaceDiscovery<'a> {
    #[must_use]
    pub fn new(maps: &'a dyn MapsProvider, page_delay: Duration) -> Self {
        Self { maps, page_delay }
    }

    /// Run the full battery around `origin`.
    ///
    /// Individual query failures are recorded in the report and otherwise
    /// ignored; the call only fails when every query failed.
    #[instrument(skip(self, options), fields(radius_m = options.radius_m))]
    pub async fn discover(
        &self,
        origin: Coordinates,
        options: &DiscoveryOptions,
    ) -> Result<DiscoveryReport> {
        let queries = battery(origin, options);
        let budget = options.per_query_budget();
        info!(
            "Running {} discovery queries (city hint: {:?})",
            queries.len(),
            options.city_hint
        );

        // join_all yields results in input order regardless of completion order
        let outcomes = join_all(queries.iter().map(|query| async move {
            let result = self
                .collect_pages(query, budget)
                .await
                .map_err(|e| e.to_string());
            QueryOutcome {
                label: query.to_string(),
                result,
            }
        }))
        .await;

        for outcome in &outcomes {
            match &outcome.result {
                Ok(places) => debug!("{} yielded {} places", outcome.label, places.len()),
                Err(reason) => warn!("Discovery query {} failed: {}", outcome.label, reason),
            }
        }

        if !outcomes.is_empty() && outcomes.iter().all(|o| !o.is_success()) {
            let first = outcomes
                .iter()
                .find_map(|o| o.result.as_ref().err().cloned())
                .unwrap_or_default();
            return Err(PlannerError::upstream(
                "maps",
                format!("all {} discovery queries failed: {first}", outcomes.len()),
            ));
        }

        let merged = outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .flatten()
            .cloned();
        let mut places: Vec<Place> = dedupe_by_place_id(merged)
            .into_iter()
            .filter(|place| options.accepts(place))
            .collect();
        sort_by_quality(&mut places);
        places.truncate(options.max_results);

        let report = DiscoveryReport { outcomes, places };
        info!(
            "Discovery kept {} places ({} queries ok, {} failed)",
            report.places.len(),
            report.succeeded(),
            report.failed()
        );
        Ok(report)
    }

    /// Follow continuation pages until `budget` places are collected
    async fn collect_pages(&self, query: &PlaceQuery, budget: usize) -> Result<Vec<Place>> {
        let mut places = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .maps
                .search_places(query, page_token.as_deref())
                .await?;
            places.extend(page.places);

            match page.next_page_token {
                Some(token) if places.len() < budget => {
                    // continuation tokens only become valid after a short wait
                    tokio::time::sleep(self.page_delay).await;
                    page_token = Some(token);
                }
                _ => break,
            }
        }

        places.truncate(budget);
        Ok(places)
    }
}

/// Build the query battery in its fixed order: categories, then text
#[must_use]
pub fn battery(origin: Coordinates, options: &DiscoveryOptions) -> Vec<PlaceQuery> {
    let nearby = NEARBY_TYPES.iter().map(|place_type| PlaceQuery::Nearby {
        location: origin,
        place_type: (*place_type).to_string(),
    });
    let text = TEXT_QUERIES.iter().map(|term| PlaceQuery::Text {
        query: match &options.city_hint {
            Some(city) => format!("{term} in {city}"),
            None => (*term).to_string(),
        },
        location: origin,
        radius_m: options.radius_m,
    });
    nearby.chain(text).collect()
}

/// Keep the first occurrence of every place id, dropping places without one
pub fn dedupe_by_place_id(places: impl IntoIterator<Item = Place>) -> Vec<Place> {
    let mut seen = HashSet::new();
    places
        .into_iter()
        .filter(|place| !place.place_id.is_empty() && seen.insert(place.place_id.clone()))
        .collect()
}

/// Stable sort by rating, then review count, both descending
pub fn sort_by_quality(places: &mut [Place]) {
    places.sort_by(|a, b| {
        b.rating_or_zero()
            .total_cmp(&a.rating_or_zero())
            .then_with(|| b.reviews_or_zero().cmp(&a.reviews_or_zero()))
    });
}
