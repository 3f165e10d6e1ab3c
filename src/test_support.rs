//! In-memory fakes for the maps and generation seams

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::generation::TextGenerator;
use crate::maps::{AddressComponent, GeocodeResult, MapsProvider, MatrixElement, PlaceQuery, PlacesPage};
use crate::models::{Coordinates, Place};
use crate::{PlannerError, Result};

/// King Khalid International as the geocoder would return it
pub fn riyadh_geocode() -> GeocodeResult {
    GeocodeResult {
        formatted_address: "King Khalid International Airport, Riyadh Saudi Arabia".to_string(),
        location: Coordinates::new(24.9578, 46.6989),
        address_components: vec![AddressComponent {
            long_name: "Riyadh".to_string(),
            short_name: "Riyadh".to_string(),
            types: vec!["locality".to_string(), "political".to_string()],
        }],
    }
}

/// Scripted maps provider keyed by query label and destination
#[derive(Default)]
pub struct FakeMaps {
    geocode: Option<GeocodeResult>,
    pages: HashMap<String, Vec<Vec<Place>>>,
    failing_queries: HashSet<String>,
    fail_all_searches: bool,
    elements: HashMap<String, MatrixElement>,
    fail_matrix: bool,
    search_calls: Mutex<HashMap<String, usize>>,
    matrix_batches: Mutex<Vec<usize>>,
}

impl FakeMaps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_geocode(mut self, result: GeocodeResult) -> Self {
        self.geocode = Some(result);
        self
    }

    /// Pages returned for a query label such as `nearby:museum`
    pub fn with_results(mut self, label: &str, pages: Vec<Vec<Place>>) -> Self {
        self.pages.insert(label.to_string(), pages);
        self
    }

    pub fn with_failing_query(mut self, label: &str) -> Self {
        self.failing_queries.insert(label.to_string());
        self
    }

    pub fn failing_all_searches(mut self) -> Self {
        self.fail_all_searches = true;
        self
    }

    pub fn with_travel(mut self, destination: Coordinates, seconds: u64, meters: u64) -> Self {
        self.elements.insert(
            destination.to_query_value(),
            MatrixElement {
                status: "OK".to_string(),
                duration_secs: Some(seconds),
                duration_in_traffic_secs: None,
                distance_m: Some(meters),
            },
        );
        self
    }

    pub fn with_matrix_status(mut self, destination: Coordinates, status: &str) -> Self {
        self.elements.insert(
            destination.to_query_value(),
            MatrixElement {
                status: status.to_string(),
                duration_secs: None,
                duration_in_traffic_secs: None,
                distance_m: None,
            },
        );
        self
    }

    pub fn failing_matrix(mut self) -> Self {
        self.fail_matrix = true;
        self
    }

    pub fn search_calls(&self, label: &str) -> usize {
        self.search_calls
            .lock()
            .unwrap()
            .get(label)
            .copied()
            .unwrap_or(0)
    }

    pub fn matrix_batches(&self) -> Vec<usize> {
        self.matrix_batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl MapsProvider for FakeMaps {
    async fn geocode(&self, _address: &str) -> Result<Option<GeocodeResult>> {
        Ok(self.geocode.clone())
    }

    async fn search_places(
        &self,
        query: &PlaceQuery,
        page_token: Option<&str>,
    ) -> Result<PlacesPage> {
        let label = query.to_string();
        *self
            .search_calls
            .lock()
            .unwrap()
            .entry(label.clone())
            .or_default() += 1;

        if self.fail_all_searches || self.failing_queries.contains(&label) {
            return Err(PlannerError::upstream("maps", format!("{label} returned UNKNOWN_ERROR")));
        }

        let index: usize = page_token.map_or(0, |t| t.parse().unwrap());
        let Some(pages) = self.pages.get(&label) else {
            return Ok(PlacesPage::default());
        };
        Ok(PlacesPage {
            places: pages.get(index).cloned().unwrap_or_default(),
            next_page_token: (index + 1 < pages.len()).then(|| (index + 1).to_string()),
        })
    }

    async fn distance_matrix(
        &self,
        _origin: Coordinates,
        destinations: &[Coordinates],
    ) -> Result<Vec<MatrixElement>> {
        self.matrix_batches.lock().unwrap().push(destinations.len());
        if self.fail_matrix {
            return Err(PlannerError::upstream("maps", "distancematrix returned OVER_QUERY_LIMIT"));
        }
        Ok(destinations
            .iter()
            .map(|d| {
                self.elements
                    .get(&d.to_query_value())
                    .cloned()
                    .unwrap_or(MatrixElement {
                        status: "NOT_FOUND".to_string(),
                        duration_secs: None,
                        duration_in_traffic_secs: None,
                        distance_m: None,
                    })
            })
            .collect())
    }
}

/// Generator that replies with a fixed text and records prompts
pub struct FakeGenerator {
    reply: std::result::Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Ok(text.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, prompt: &str, _schema: &Value) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply
            .clone()
            .map_err(|message| PlannerError::upstream("generation", message))
    }
}
