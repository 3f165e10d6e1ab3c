//! Candidate ranking by reachability and quality

use std::cmp::Ordering;

use tracing::debug;

use crate::models::Place;

/// Places whose annotated travel time fits the one-way allowance.
///
/// Unannotated places never qualify.
pub fn filter_reachable(places: Vec<Place>, one_way_minutes: u32) -> Vec<Place> {
    places
        .into_iter()
        .filter(|place| {
            place
                .travel_minutes()
                .is_some_and(|minutes| minutes <= one_way_minutes)
        })
        .collect()
}

/// Best first: higher rating, then more reviews, then shorter travel
fn compare(a: &Place, b: &Place) -> Ordering {
    b.rating_or_zero()
        .total_cmp(&a.rating_or_zero())
        .then_with(|| b.reviews_or_zero().cmp(&a.reviews_or_zero()))
        .then_with(|| {
            a.travel_minutes()
                .unwrap_or(u32::MAX)
                .cmp(&b.travel_minutes().unwrap_or(u32::MAX))
        })
}

/// Stable in-place ranking
pub fn rank(places: &mut [Place]) {
    places.sort_by(compare);
}

/// Filter, rank, and cap the candidate list handed to plan synthesis
pub fn select_candidates(places: Vec<Place>, one_way_minutes: u32, limit: usize) -> Vec<Place> {
    let total = places.len();
    let mut reachable = filter_reachable(places, one_way_minutes);
    rank(&mut reachable);
    reachable.truncate(limit);
    debug!(
        "Selected {} of {} places within {} minutes",
        reachable.len(),
        total,
        one_way_minutes
    );
    reachable
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, rating: Option<f64>, reviews: Option<u32>, minutes: Option<u32>) -> Place {
        let mut place = Place::new(id, id.to_uppercase());
        place.rating = rating;
        place.user_ratings_total = reviews;
        if let Some(minutes) = minutes {
            place = place.with_travel(minutes, None);
        }
        place
    }

    fn ids(places: &[Place]) -> Vec<&str> {
        places.iter().map(|p| p.place_id.as_str()).collect()
    }

    #[test]
    fn test_filter_drops_unannotated_and_over_budget() {
        let places = vec![
            candidate("ok", Some(4.0), Some(10), Some(35)),
            candidate("slow", Some(5.0), Some(10), Some(36)),
            candidate("unknown", Some(5.0), Some(10), None),
        ];
        assert_eq!(ids(&filter_reachable(places, 35)), ["ok"]);
    }

    #[test]
    fn test_rank_order() {
        let mut places = vec![
            candidate("far-tie", Some(4.5), Some(300), Some(30)),
            candidate("unrated", None, None, Some(5)),
            candidate("best", Some(4.9), Some(10), Some(34)),
            candidate("near-tie", Some(4.5), Some(300), Some(12)),
            candidate("popular", Some(4.5), Some(5000), Some(25)),
        ];
        rank(&mut places);
        assert_eq!(
            ids(&places),
            ["best", "popular", "near-tie", "far-tie", "unrated"]
        );
    }

    #[test]
    fn test_ranking_is_stable_for_full_ties() {
        let mut places = vec![
            candidate("first", Some(4.2), Some(80), Some(20)),
            candidate("second", Some(4.2), Some(80), Some(20)),
        ];
        rank(&mut places);
        assert_eq!(ids(&places), ["first", "second"]);
    }

    #[test]
    fn test_select_caps_candidates() {
        let places: Vec<Place> = (0..50)
            .map(|i| candidate(&format!("p{i}"), Some(4.0), Some(i), Some(10)))
            .collect();
        let selected = select_candidates(places, 35, 30);
        assert_eq!(selected.len(), 30);
        assert_eq!(selected[0].place_id, "p49");
        assert!(
            selected
                .windows(2)
                .all(|w| compare(&w[0], &w[1]) != Ordering::Greater)
        );
    }
}
