//! Filtering, ranking and review summaries for place cards.

use std::collections::HashMap;
use std::sync::Mutex;

use rand::seq::SliceRandom;

use crate::bot::models::{status, Place, Review};
use crate::localization::{t_args_lang, t_lang};

/// Criteria collected by the guided search flow.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilters {
    pub category: Option<String>,
    pub price_level: Option<String>,
    pub min_rating: Option<f64>,
    pub query: Option<String>,
}

/// Statuses a card may have to be shown to users.
fn is_visible(place: &Place) -> bool {
    place.status == status::APPROVED || place.status == status::ACTIVE
}

/// Apply filters and sort by rating (ties broken by name).
pub fn filter_places(places: Vec<Place>, filters: &SearchFilters) -> Vec<Place> {
    let query = filters.query.as_ref().map(|q| q.to_lowercase());

    let mut matched: Vec<Place> = places
        .into_iter()
        .filter(is_visible)
        .filter(|place| {
            filters
                .category
                .as_ref()
                .is_none_or(|category| place.category.as_deref() == Some(category))
        })
        .filter(|place| {
            filters
                .price_level
                .as_ref()
                .is_none_or(|price| place.price_level.as_deref() == Some(price))
        })
        .filter(|place| {
            filters
                .min_rating
                .is_none_or(|min| place.rating >= min)
        })
        .filter(|place| {
            query.as_ref().is_none_or(|q| {
                place.name.to_lowercase().contains(q)
                    || place
                        .description
                        .as_ref()
                        .is_some_and(|d| d.to_lowercase().contains(q))
                    || place
                        .address
                        .as_ref()
                        .is_some_and(|a| a.to_lowercase().contains(q))
            })
        })
        .collect();

    matched.sort_by(|a, b| {
        b.rating
            .partial_cmp(&a.rating)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    matched
}

/// Merge catalog results (already filtered server-side) with local
/// submissions, dropping duplicates by id.
pub fn merge_results(api_places: Vec<Place>, local_places: Vec<Place>) -> Vec<Place> {
    let mut merged = api_places;
    for place in local_places {
        if !merged.iter().any(|existing| existing.id == place.id) {
            merged.push(place);
        }
    }
    merged
}

pub fn random_place(places: &[Place]) -> Option<Place> {
    let visible: Vec<&Place> = places.iter().filter(|p| is_visible(p)).collect();
    let mut rng = rand::thread_rng();
    visible.choose(&mut rng).map(|place| (*place).clone())
}

/// Top places by rating, like votes as the tie-breaker.
pub fn top_places(mut places: Vec<Place>, likes: impl Fn(&str) -> i32, count: usize) -> Vec<Place> {
    places.retain(is_visible);
    places.sort_by(|a, b| {
        b.rating
            .partial_cmp(&a.rating)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| likes(&b.id).cmp(&likes(&a.id)))
            .then_with(|| a.name.cmp(&b.name))
    });
    places.truncate(count);
    places
}

/// Template-based review summaries with a per-place cache.
///
/// Good enough to read naturally on a card without calling a language
/// model for every view.
pub struct ReviewSummaryService {
    cache: Mutex<HashMap<String, String>>,
}

impl ReviewSummaryService {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn summarize(
        &self,
        place: &Place,
        reviews: &[Review],
        language_code: Option<&str>,
    ) -> String {
        let lang = language_code.unwrap_or("en");
        let cache_key = format!("{lang}:{}:{}", place.id, reviews.len());
        if let Some(cached) = self.cache.lock().unwrap().get(&cache_key) {
            return cached.clone();
        }

        let summary = if reviews.is_empty() {
            t_lang("summary-no-reviews", language_code)
        } else {
            let average =
                reviews.iter().map(|r| r.rating).sum::<f64>() / reviews.len() as f64;
            let count = reviews.len().to_string();
            let average_text = format!("{average:.1}");
            let args = [
                ("count", count.as_str()),
                ("average", average_text.as_str()),
            ];
            if average >= 4.0 {
                t_args_lang("summary-positive", &args, language_code)
            } else {
                t_args_lang("summary-mixed", &args, language_code)
            }
        };

        self.cache
            .lock()
            .unwrap()
            .insert(cache_key, summary.clone());
        summary
    }
}

impl Default for ReviewSummaryService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(id: &str, name: &str, category: &str, rating: f64, status: &str) -> Place {
        Place {
            id: id.to_string(),
            name: name.to_string(),
            category: Some(category.to_string()),
            address: None,
            description: None,
            price_level: Some("budget".to_string()),
            rating,
            status: status.to_string(),
            created_by: None,
            created_at: None,
            contacts: None,
            latitude: None,
            longitude: None,
            score: None,
        }
    }

    #[test]
    fn test_filter_hides_pending_and_rejected() {
        let places = vec![
            place("1", "A", "cafes", 4.0, status::APPROVED),
            place("2", "B", "cafes", 5.0, status::PENDING),
            place("3", "C", "cafes", 5.0, status::REJECTED),
            place("4", "D", "cafes", 3.0, status::ACTIVE),
        ];
        let result = filter_places(places, &SearchFilters::default());
        let ids: Vec<&str> = result.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "4"]);
    }

    #[test]
    fn test_filter_by_category_price_and_rating() {
        let mut premium = place("1", "A", "bars", 4.8, status::APPROVED);
        premium.price_level = Some("premium".to_string());
        let places = vec![
            premium,
            place("2", "B", "bars", 4.2, status::APPROVED),
            place("3", "C", "cafes", 4.9, status::APPROVED),
        ];

        let filters = SearchFilters {
            category: Some("bars".to_string()),
            price_level: Some("premium".to_string()),
            min_rating: Some(4.5),
            query: None,
        };
        let result = filter_places(places, &filters);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "1");
    }

    #[test]
    fn test_filter_query_matches_name_and_address() {
        let mut with_address = place("1", "A", "cafes", 4.0, status::APPROVED);
        with_address.address = Some("Nevsky Prospect 1".to_string());
        let places = vec![
            with_address,
            place("2", "Nevsky Bar", "bars", 4.0, status::APPROVED),
            place("3", "Elsewhere", "bars", 4.0, status::APPROVED),
        ];

        let filters = SearchFilters {
            query: Some("nevsky".to_string()),
            ..Default::default()
        };
        let result = filter_places(places, &filters);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_sort_by_rating_descending() {
        let places = vec![
            place("1", "A", "cafes", 3.0, status::APPROVED),
            place("2", "B", "cafes", 5.0, status::APPROVED),
            place("3", "C", "cafes", 4.0, status::APPROVED),
        ];
        let result = filter_places(places, &SearchFilters::default());
        let ids: Vec<&str> = result.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3", "1"]);
    }

    #[test]
    fn test_merge_results_deduplicates() {
        let api = vec![place("1", "A", "cafes", 0.0, status::ACTIVE)];
        let local = vec![
            place("1", "A", "cafes", 4.0, status::APPROVED),
            place("2", "B", "cafes", 4.0, status::APPROVED),
        ];
        let merged = merge_results(api, local);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_random_place_skips_hidden() {
        let places = vec![
            place("1", "A", "cafes", 4.0, status::PENDING),
            place("2", "B", "cafes", 4.0, status::APPROVED),
        ];
        for _ in 0..10 {
            let chosen = random_place(&places).unwrap();
            assert_eq!(chosen.id, "2");
        }
    }

    #[test]
    fn test_random_place_empty() {
        assert!(random_place(&[]).is_none());
    }

    #[test]
    fn test_top_places_tie_break_by_likes() {
        let places = vec![
            place("1", "A", "cafes", 4.5, status::APPROVED),
            place("2", "B", "cafes", 4.5, status::APPROVED),
            place("3", "C", "cafes", 4.0, status::APPROVED),
            place("4", "D", "cafes", 5.0, status::APPROVED),
        ];
        let likes = |id: &str| if id == "2" { 3 } else { 0 };
        let top = top_places(places, likes, 3);
        let ids: Vec<&str> = top.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["4", "2", "1"]);
    }

    #[test]
    fn test_summary_cached_per_review_count() {
        let service = ReviewSummaryService::new();
        let subject = place("1", "A", "cafes", 4.0, status::APPROVED);
        let empty = service.summarize(&subject, &[], Some("en"));
        assert_eq!(empty, service.summarize(&subject, &[], Some("en")));

        let review = Review {
            id: "r1".to_string(),
            place_id: "1".to_string(),
            user_id: 7,
            rating: 5.0,
            text: "great".to_string(),
            status: status::APPROVED.to_string(),
            created_at: "2025-01-01T00:00:00Z".to_string(),
        };
        let with_review = service.summarize(&subject, &[review], Some("en"));
        assert_ne!(empty, with_review);
    }
}
