//! Google Maps web service client
//!
//! Geocoding, Nearby/Text place search, and Distance Matrix over the JSON
//! endpoints. The services answer HTTP 200 with a `status` field, so every
//! response is screened twice: transport status, then service status.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use super::{GeocodeResult, MapsProvider, MatrixElement, PlaceQuery, PlacesPage};
use crate::budget::MAX_RADIUS_M;
use crate::config::MapsConfig;
use crate::http;
use crate::models::Coordinates;
use crate::{PlannerError, Result};

const SERVICE: &str = "maps";

/// Maps client for the Google web services
pub struct GoogleMapsClient {
    client: reqwest_middleware::ClientWithMiddleware,
    api_key: String,
    base_url: String,
    language: Option<String>,
    region: Option<String>,
}

impl GoogleMapsClient {
    /// Create a new maps client
    pub fn new(config: &MapsConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| PlannerError::config("Maps API key must be set"))?;

        Ok(Self {
            client: http::build_client(config.timeout(), config.max_retries)?,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
            region: config.region.clone(),
        })
    }

    fn url(&self, endpoint: &str, params: &[(&str, String)]) -> String {
        let mut url = format!("{}/{}/json?key={}", self.base_url, endpoint, self.api_key);
        let locale = [("language", self.language.as_ref()), ("region", self.region.as_ref())]
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, v.clone())));
        for (name, value) in params.iter().cloned().chain(locale) {
            url.push('&');
            url.push_str(name);
            url.push('=');
            url.push_str(&urlencoding::encode(&value));
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, url: String) -> Result<T> {
        let response = http::send(SERVICE, self.client.get(url)).await?;
        response.json::<T>().await.map_err(|e| {
            let reason = http::redact_key(&e.without_url().to_string());
            PlannerError::upstream(SERVICE, format!("invalid {endpoint} response: {reason}"))
        })
    }
}

#[async_trait]
impl MapsProvider for GoogleMapsClient {
    #[instrument(skip(self))]
    async fn geocode(&self, address: &str) -> Result<Option<GeocodeResult>> {
        info!("Geocoding '{}'", address);
        let url = self.url("geocode", &[("address", address.to_string())]);
        let response: wire::GeocodeResponse = self.get_json("geocode", url).await?;
        wire::check_status("geocode", &response.status, response.error_message.as_deref())?;

        let result = response.results.into_iter().next().map(|item| GeocodeResult {
            formatted_address: item.formatted_address,
            location: item.geometry.location,
            address_components: item.address_components,
        });

        match &result {
            Some(found) => debug!(
                "Geocoded '{}' to {} ({})",
                address,
                found.formatted_address,
                found.location.format_coordinates()
            ),
            None => warn!("No geocoding results for '{}'", address),
        }
        Ok(result)
    }

    #[instrument(skip(self, query, page_token), fields(query = %query))]
    async fn search_places(
        &self,
        query: &PlaceQuery,
        page_token: Option<&str>,
    ) -> Result<PlacesPage> {
        let (endpoint, mut params) = match query {
            PlaceQuery::Nearby {
                location,
                place_type,
            } => (
                "place/nearbysearch",
                vec![
                    ("location", location.to_query_value()),
                    // rankby=distance forbids a radius
                    ("rankby", "distance".to_string()),
                    ("type", place_type.clone()),
                ],
            ),
            PlaceQuery::Text {
                query,
                location,
                radius_m,
            } => (
                "place/textsearch",
                vec![
                    ("query", query.clone()),
                    ("location", location.to_query_value()),
                    ("radius", (*radius_m).min(MAX_RADIUS_M).to_string()),
                ],
            ),
        };
        if let Some(token) = page_token {
            params.push(("pagetoken", token.to_string()));
        }

        let url = self.url(endpoint, &params);
        let response: wire::PlacesResponse = self.get_json(endpoint, url).await?;
        wire::check_status(endpoint, &response.status, response.error_message.as_deref())?;

        let page = response.into_page();
        debug!("{} returned {} places", query, page.places.len());
        Ok(page)
    }

    #[instrument(skip(self, destinations), fields(destinations = destinations.len()))]
    async fn distance_matrix(
        &self,
        origin: Coordinates,
        destinations: &[Coordinates],
    ) -> Result<Vec<MatrixElement>> {
        let joined = destinations
            .iter()
            .map(Coordinates::to_query_value)
            .collect::<Vec<_>>()
            .join("|");
        let url = self.url(
            "distancematrix",
            &[
                ("origins", origin.to_query_value()),
                ("destinations", joined),
                ("mode", "driving".to_string()),
                ("departure_time", "now".to_string()),
            ],
        );

        let response: wire::MatrixResponse = self.get_json("distancematrix", url).await?;
        wire::check_status(
            "distancematrix",
            &response.status,
            response.error_message.as_deref(),
        )?;
        Ok(response.into_elements())
    }
}

/// Google Maps JSON response structures and conversion utilities
mod wire {
    use serde::Deserialize;
    use tracing::debug;

    use crate::maps::{AddressComponent, MatrixElement, PlacesPage};
    use crate::models::{Coordinates, Place};
    use crate::{PlannerError, Result};

    /// Accept `OK` and `ZERO_RESULTS`, reject every other service status
    pub fn check_status(endpoint: &str, status: &str, message: Option<&str>) -> Result<()> {
        match status {
            "OK" | "ZERO_RESULTS" => Ok(()),
            other => Err(PlannerError::upstream(
                "maps",
                format!("{endpoint} returned {other}: {}", message.unwrap_or("no details")),
            )),
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct Geometry {
        pub location: Coordinates,
    }

    #[derive(Debug, Deserialize)]
    pub struct GeocodeResponse {
        pub status: String,
        #[serde(default)]
        pub results: Vec<GeocodeItem>,
        pub error_message: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct GeocodeItem {
        pub formatted_address: String,
        pub geometry: Geometry,
        #[serde(default)]
        pub address_components: Vec<AddressComponent>,
    }

    #[derive(Debug, Deserialize)]
    pub struct PlacesResponse {
        pub status: String,
        #[serde(default)]
        pub results: Vec<PlaceItem>,
        pub next_page_token: Option<String>,
        pub error_message: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct PlaceItem {
        pub place_id: Option<String>,
        pub name: Option<String>,
        pub vicinity: Option<String>,
        pub formatted_address: Option<String>,
        pub rating: Option<f64>,
        pub user_ratings_total: Option<u32>,
        pub price_level: Option<u8>,
        #[serde(default)]
        pub types: Vec<String>,
        pub geometry: Option<Geometry>,
    }

    impl PlaceItem {
        /// Normalize into a [`Place`]; results without a place id are unusable
        pub fn into_place(self) -> Option<Place> {
            let Some(place_id) = self.place_id else {
                debug!("Dropping place without id: {:?}", self.name);
                return None;
            };
            Some(Place {
                place_id,
                name: self.name.unwrap_or_default(),
                address: self.vicinity.or(self.formatted_address),
                types: self.types,
                rating: self.rating,
                user_ratings_total: self.user_ratings_total,
                price_level: self.price_level,
                location: self.geometry.map(|g| g.location),
                travel: None,
            })
        }
    }

    impl PlacesResponse {
        pub fn into_page(self) -> PlacesPage {
            PlacesPage {
                places: self
                    .results
                    .into_iter()
                    .filter_map(PlaceItem::into_place)
                    .collect(),
                next_page_token: self.next_page_token.filter(|t| !t.is_empty()),
            }
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct MatrixResponse {
        pub status: String,
        #[serde(default)]
        pub rows: Vec<MatrixRow>,
        pub error_message: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct MatrixRow {
        #[serde(default)]
        pub elements: Vec<MatrixItem>,
    }

    #[derive(Debug, Deserialize)]
    pub struct MatrixItem {
        pub status: String,
        pub duration: Option<ValueField>,
        pub duration_in_traffic: Option<ValueField>,
        pub distance: Option<ValueField>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ValueField {
        pub value: u64,
    }

    impl MatrixResponse {
        /// Elements of the single origin row
        pub fn into_elements(self) -> Vec<MatrixElement> {
            self.rows
                .into_iter()
                .next()
                .map(|row| row.elements)
                .unwrap_or_default()
                .into_iter()
                .map(|item| MatrixElement {
                    status: item.status,
                    duration_secs: item.duration.map(|v| v.value),
                    duration_in_traffic_secs: item.duration_in_traffic.map(|v| v.value),
                    distance_m: item.distance.map(|v| v.value),
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(language: Option<&str>) -> GoogleMapsClient {
        let config = MapsConfig {
            api_key: Some("test-key".to_string()),
            language: language.map(str::to_string),
            ..MapsConfig::default()
        };
        GoogleMapsClient::new(&config).unwrap()
    }

    #[test]
    fn test_requires_api_key() {
        let result = GoogleMapsClient::new(&MapsConfig::default());
        assert!(matches!(result, Err(PlannerError::Config { .. })));
    }

    #[test]
    fn test_url_encodes_params() {
        let url = client(Some("en")).url("place/textsearch", &[("query", "theme park in Riyadh".to_string())]);
        assert_eq!(
            url,
            "https://maps.googleapis.com/maps/api/place/textsearch/json?key=test-key&query=theme%20park%20in%20Riyadh&language=en"
        );
    }

    #[tokio::test]
    async fn test_transport_error_hides_api_key() {
        let config = MapsConfig {
            api_key: Some("SECRET-MAPS-KEY".to_string()),
            base_url: "http://127.0.0.1:9".to_string(),
            max_retries: 0,
            ..MapsConfig::default()
        };
        let client = GoogleMapsClient::new(&config).unwrap();

        let err = client.geocode("Riyadh").await.unwrap_err();
        assert!(matches!(err, PlannerError::Upstream { .. }));
        assert!(!err.to_string().contains("SECRET-MAPS-KEY"), "{err}");
        assert!(!err.user_message().contains("SECRET-MAPS-KEY"));
    }

    #[test]
    fn test_places_page_drops_results_without_id() {
        let response: wire::PlacesResponse = serde_json::from_str(
            r#"{
                "status": "OK",
                "next_page_token": "abc",
                "results": [
                    {"place_id": "p1", "name": "Riyadh Park", "vicinity": "Northern Ring Rd",
                     "rating": 4.4, "user_ratings_total": 51000, "types": ["shopping_mall"],
                     "geometry": {"location": {"lat": 24.75, "lng": 46.63}}},
                    {"name": "No id"},
                    {"place_id": "p2", "name": "Souq", "formatted_address": "Old Town"}
                ]
            }"#,
        )
        .unwrap();
        let page = response.into_page();
        assert_eq!(page.next_page_token.as_deref(), Some("abc"));
        assert_eq!(page.places.len(), 2);
        assert_eq!(page.places[0].address.as_deref(), Some("Northern Ring Rd"));
        assert_eq!(page.places[0].location, Some(Coordinates::new(24.75, 46.63)));
        assert_eq!(page.places[1].address.as_deref(), Some("Old Town"));
        assert_eq!(page.places[1].location, None);
    }

    #[test]
    fn test_matrix_elements_keep_order_and_status() {
        let response: wire::MatrixResponse = serde_json::from_str(
            r#"{
                "status": "OK",
                "rows": [{"elements": [
                    {"status": "OK", "duration": {"value": 1500, "text": "25 mins"},
                     "duration_in_traffic": {"value": 1800, "text": "30 mins"},
                     "distance": {"value": 18400, "text": "18.4 km"}},
                    {"status": "ZERO_RESULTS"}
                ]}]
            }"#,
        )
        .unwrap();
        let elements = response.into_elements();
        assert_eq!(elements.len(), 2);
        assert!(elements[0].is_ok());
        assert_eq!(elements[0].duration_in_traffic_secs, Some(1800));
        assert!(!elements[1].is_ok());
        assert_eq!(elements[1].duration_secs, None);
    }

    #[test]
    fn test_service_status_screening() {
        assert!(wire::check_status("geocode", "OK", None).is_ok());
        assert!(wire::check_status("geocode", "ZERO_RESULTS", None).is_ok());
        let err = wire::check_status("geocode", "REQUEST_DENIED", Some("bad key")).unwrap_err();
        assert!(err.to_string().contains("REQUEST_DENIED"));
        assert!(err.to_string().contains("bad key"));
    }
}
