//! One-way travel time annotation via the distance matrix

use tracing::{debug, info, instrument, warn};

use super::{MapsProvider, MatrixElement};
use crate::models::{Coordinates, Place, TravelAnnotation};

/// Destinations per distance matrix request
pub const MATRIX_BATCH_SIZE: usize = 25;

/// Straight-line speed no road trip can beat, used to skip hopeless places
const PRECHECK_SPEED_KMH: f64 = 120.0;

/// Annotates places with driving time from a fixed origin
pub struct TravelTimeAnnotator<'a> {
    maps: &'a dyn MapsProvider,
}

impl<'a> TravelTimeAnnotator<'a> {
    #[must_use]
    pub fn new(maps: &'a dyn MapsProvider) -> Self {
        Self { maps }
    }

    /// Annotate every place that has coordinates.
    ///
    /// Places without coordinates, places whose element was not `OK`, and
    /// places in a failed batch come back unannotated.
    #[instrument(skip(self, places), fields(places = places.len()))]
    pub async fn annotate(&self, origin: Coordinates, mut places: Vec<Place>) -> Vec<Place> {
        let targets: Vec<(usize, Coordinates)> = places
            .iter()
            .enumerate()
            .filter_map(|(index, place)| place.location.map(|loc| (index, loc)))
            .collect();

        let mut annotated = 0;
        for (batch_index, batch) in targets.chunks(MATRIX_BATCH_SIZE).enumerate() {
            let destinations: Vec<Coordinates> = batch.iter().map(|(_, loc)| *loc).collect();

            let elements = match self.maps.distance_matrix(origin, &destinations).await {
                Ok(elements) => elements,
                Err(e) => {
                    warn!(
                        "Distance matrix batch {} ({} places) failed: {}",
                        batch_index,
                        batch.len(),
                        e
                    );
                    continue;
                }
            };

            for ((index, _), element) in batch.iter().zip(&elements) {
                if let Some(travel) = travel_annotation(element) {
                    places[*index].travel = Some(travel);
                    annotated += 1;
                } else {
                    debug!(
                        "No route to {} ({})",
                        places[*index].name, element.status
                    );
                }
            }
        }

        info!(
            "Annotated {} of {} places ({} had coordinates)",
            annotated,
            places.len(),
            targets.len()
        );
        places
    }
}

/// Travel metrics for a successful element, preferring the traffic-aware duration
#[must_use]
pub fn travel_annotation(element: &MatrixElement) -> Option<TravelAnnotation> {
    if !element.is_ok() {
        return None;
    }
    let seconds = element.duration_in_traffic_secs.or(element.duration_secs)?;
    Some(TravelAnnotation {
        // halves go to the even neighbour: 1230 s is 20 min, 1290 s is 22 min
        duration_min: (seconds as f64 / 60.0).round_ties_even() as u32,
        distance_km: element
            .distance_m
            .map(|meters| (meters as f64 / 100.0).round_ties_even() / 10.0),
    })
}

/// Drop places that are provably out of reach in a straight line.
///
/// Places without coordinates are kept; they simply never get annotated.
#[must_use]
pub fn prefilter_unreachable(
    origin: Coordinates,
    places: Vec<Place>,
    one_way_minutes: u32,
) -> Vec<Place> {
    let max_km = PRECHECK_SPEED_KMH * f64::from(one_way_minutes) / 60.0;
    let before = places.len();
    let kept: Vec<Place> = places
        .into_iter()
        .filter(|place| {
            place
                .location
                .is_none_or(|loc| origin.distance_km(&loc) <= max_km)
        })
        .collect();
    if kept.len() < before {
        debug!(
            "Skipped {} places beyond {:.1} km straight-line",
            before - kept.len(),
            max_km
        );
    }
    kept
}
