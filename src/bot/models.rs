//! Bot-side view models.
//!
//! The bot mixes two sources of places: the recommendation API
//! (OpenStreetMap catalog, searched by vector similarity) and its own
//! community submissions kept in JSON storage. Both are flattened into
//! one card-friendly [`Place`] shape.

use std::collections::HashSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::schemas::{PlaceResponse, PlaceSearchResultResponse};

/// Moderation / lifecycle status of a bot-side place.
pub mod status {
    /// Approved community submission.
    pub const APPROVED: &str = "approved";
    /// Submission awaiting moderation.
    pub const PENDING: &str = "pending";
    /// Rejected submission.
    pub const REJECTED: &str = "rejected";
    /// Active place fetched from the catalog API.
    pub const ACTIVE: &str = "active";
    /// Inactive catalog place.
    pub const INACTIVE: &str = "inactive";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price_level: Option<String>,
    #[serde(default)]
    pub rating: f64,
    pub status: String,
    #[serde(default)]
    pub created_by: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub contacts: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub score: Option<f64>,
}

impl Place {
    /// Build a card from an API search result.
    pub fn from_api(result: &PlaceSearchResultResponse) -> Self {
        let mut place = Self::from_api_place(&result.place);
        place.score = result.score.map(f64::from);
        place
    }

    /// Build a card from a bare API place.
    pub fn from_api_place(place: &PlaceResponse) -> Self {
        let status = if place.is_active {
            status::ACTIVE
        } else {
            status::INACTIVE
        };

        Self {
            id: place.id.to_string(),
            name: place.name.clone().unwrap_or_default(),
            category: place
                .category_value
                .clone()
                .or_else(|| place.category_key.clone()),
            address: format_address(&place.address),
            description: build_description(&place.tags),
            price_level: None,
            rating: 0.0,
            status: status.to_string(),
            created_by: None,
            created_at: Some(place.created_at.to_rfc3339()),
            contacts: tag_str(&place.tags, "contact:phone")
                .or_else(|| tag_str(&place.tags, "phone")),
            latitude: place.latitude,
            longitude: place.longitude,
            score: None,
        }
    }
}

fn tag_str(tags: &Value, key: &str) -> Option<String> {
    tags.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Flatten an OSM-style address object into a single line.
fn format_address(address: &Value) -> Option<String> {
    let object = address.as_object()?;
    if object.is_empty() {
        return None;
    }

    let parts: Vec<String> = ["road", "house_number", "city", "state", "country"]
        .iter()
        .filter_map(|key| tag_str(address, key))
        .collect();

    if !parts.is_empty() {
        return Some(parts.join(", "));
    }
    tag_str(address, "display_name")
}

/// A short human hint derived from OSM tags.
fn build_description(tags: &Value) -> Option<String> {
    let hints: Vec<String> = ["amenity", "cuisine", "tourism", "leisure"]
        .iter()
        .filter_map(|key| tag_str(tags, key))
        .collect();

    if hints.is_empty() {
        None
    } else {
        Some(hints.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub place_id: String,
    pub user_id: i64,
    pub rating: f64,
    pub text: String,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: i64,
    #[serde(default)]
    pub favorites: HashSet<String>,
}

impl UserProfile {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            favorites: HashSet::new(),
        }
    }
}

pub fn utc_now() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_result(json: &str) -> PlaceSearchResultResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_from_api_full_card() {
        let result = api_result(
            r#"{
                "place": {
                    "id": "7f8a1f74-2f5e-4b9f-9a53-0b6a4b1c2d3e",
                    "osm_id": "node:61669376",
                    "osm_type": "node",
                    "name": "Cinema Aurora",
                    "category_key": "amenity",
                    "category_value": "cinema",
                    "latitude": 55.7558,
                    "longitude": 37.6173,
                    "tags": {"amenity": "cinema", "contact:phone": "+7 495 000-00-00"},
                    "address": {"road": "Arbat", "house_number": "12", "city": "Moscow"},
                    "source": {},
                    "is_active": true,
                    "created_at": "2025-01-15T10:00:00Z",
                    "updated_at": "2025-01-15T10:00:00Z"
                },
                "score": 0.91
            }"#,
        );

        let place = Place::from_api(&result);
        assert_eq!(place.name, "Cinema Aurora");
        assert_eq!(place.category.as_deref(), Some("cinema"));
        assert_eq!(place.address.as_deref(), Some("Arbat, 12, Moscow"));
        assert_eq!(place.description.as_deref(), Some("cinema"));
        assert_eq!(place.contacts.as_deref(), Some("+7 495 000-00-00"));
        assert_eq!(place.status, status::ACTIVE);
        assert!((place.score.unwrap() - 0.91).abs() < 1e-6);
    }

    #[test]
    fn test_from_api_sparse_card() {
        let result = api_result(
            r#"{
                "place": {
                    "id": "7f8a1f74-2f5e-4b9f-9a53-0b6a4b1c2d3e",
                    "osm_id": "way:1",
                    "osm_type": null,
                    "name": null,
                    "category_key": null,
                    "category_value": null,
                    "latitude": null,
                    "longitude": null,
                    "tags": {},
                    "address": {},
                    "source": {},
                    "is_active": false,
                    "created_at": "2025-01-15T10:00:00Z",
                    "updated_at": "2025-01-15T10:00:00Z"
                },
                "score": null
            }"#,
        );

        let place = Place::from_api(&result);
        assert!(place.name.is_empty());
        assert!(place.category.is_none());
        assert!(place.address.is_none());
        assert!(place.description.is_none());
        assert_eq!(place.status, status::INACTIVE);
        assert!(place.score.is_none());
    }

    #[test]
    fn test_format_address_display_name_fallback() {
        let address = serde_json::json!({"display_name": "Somewhere far away"});
        assert_eq!(
            format_address(&address).as_deref(),
            Some("Somewhere far away")
        );
    }
}
