//! Maps integration
//!
//! The planner talks to geocoding, place search, and distance matrix services
//! through [`MapsProvider`]. [`google::GoogleMapsClient`] is the production
//! implementation; discovery and travel-time annotation are written against
//! the trait so they can run over any provider.

use std::fmt::Display;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::models::{Coordinates, Place};

pub mod discovery;
pub mod google;
pub mod travel_time;

pub use discovery::{DiscoveryOptions, DiscoveryReport, PlaceDiscovery, QueryOutcome};
pub use google::GoogleMapsClient;
pub use travel_time::TravelTimeAnnotator;

/// Address component of a geocoding result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

/// First geocoding match for an address
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResult {
    pub formatted_address: String,
    pub location: Coordinates,
    pub address_components: Vec<AddressComponent>,
}

impl GeocodeResult {
    /// Best-effort locality label: locality, then sublocality, then region
    #[must_use]
    pub fn city_hint(&self) -> Option<String> {
        ["locality", "sublocality", "administrative_area_level_1"]
            .iter()
            .find_map(|kind| {
                self.address_components
                    .iter()
                    .find(|c| c.types.iter().any(|t| t == kind))
                    .map(|c| c.long_name.clone())
            })
    }
}

/// A single place search
#[derive(Debug, Clone, PartialEq)]
pub enum PlaceQuery {
    /// Category search around a point, ranked by distance
    Nearby {
        location: Coordinates,
        place_type: String,
    },
    /// Free-text search biased to a circle
    Text {
        query: String,
        location: Coordinates,
        radius_m: u32,
    },
}

impl Display for PlaceQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaceQuery::Nearby { place_type, .. } => write!(f, "nearby:{place_type}"),
            PlaceQuery::Text { query, .. } => write!(f, "text:{query}"),
        }
    }
}

/// One page of place search results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacesPage {
    pub places: Vec<Place>,
    pub next_page_token: Option<String>,
}

/// Outcome of one origin-destination pair in a distance matrix
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixElement {
    /// Element status as reported by the service, `OK` on success
    pub status: String,
    pub duration_secs: Option<u64>,
    pub duration_in_traffic_secs: Option<u64>,
    pub distance_m: Option<u64>,
}

impl MatrixElement {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == "OK"
    }
}

/// Geocoding, place search, and distance matrix operations
#[async_trait]
pub trait MapsProvider: Send + Sync {
    /// First match for `address`, `None` when nothing matched
    async fn geocode(&self, address: &str) -> Result<Option<GeocodeResult>>;

    /// Fetch one page of results for `query`, continuing from `page_token`
    async fn search_places(
        &self,
        query: &PlaceQuery,
        page_token: Option<&str>,
    ) -> Result<PlacesPage>;

    /// One element per destination, in destination order
    async fn distance_matrix(
        &self,
        origin: Coordinates,
        destinations: &[Coordinates],
    ) -> Result<Vec<MatrixElement>>;
}
