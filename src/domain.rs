//! Domain model: places, user-generated content and their value objects.
//!
//! Value objects validate on construction; a `Place` or `Ugc` that exists
//! is therefore always well-formed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;
pub const MAX_OSM_ID_LENGTH: usize = 64;

pub const MIN_LATITUDE: f64 = -90.0;
pub const MAX_LATITUDE: f64 = 90.0;
pub const MIN_LONGITUDE: f64 = -180.0;
pub const MAX_LONGITUDE: f64 = 180.0;

#[derive(Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("OSM id cannot be empty")]
    EmptyOsmId,
    #[error("OSM id cannot exceed {MAX_OSM_ID_LENGTH} characters")]
    OsmIdTooLong,
    #[error("latitude must be between {MIN_LATITUDE} and {MAX_LATITUDE}")]
    LatitudeOutOfRange,
    #[error("longitude must be between {MIN_LONGITUDE} and {MAX_LONGITUDE}")]
    LongitudeOutOfRange,
    #[error("rating must be between {MIN_RATING} and {MAX_RATING}")]
    RatingOutOfRange,
}

/// Unique identifier of a place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceId(pub Uuid);

impl PlaceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// OpenStreetMap object identifier, e.g. `node:61669376`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OsmId(String);

impl OsmId {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.is_empty() {
            return Err(DomainError::EmptyOsmId);
        }
        if value.len() > MAX_OSM_ID_LENGTH {
            return Err(DomainError::OsmIdTooLong);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Geographic coordinates (latitude and longitude, degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, DomainError> {
        if !(MIN_LATITUDE..=MAX_LATITUDE).contains(&latitude) {
            return Err(DomainError::LatitudeOutOfRange);
        }
        if !(MIN_LONGITUDE..=MAX_LONGITUDE).contains(&longitude) {
            return Err(DomainError::LongitudeOutOfRange);
        }
        Ok(Self { latitude, longitude })
    }
}

/// Rating score in the 1.0..=5.0 range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RatingScore(f64);

impl RatingScore {
    pub fn new(value: f64) -> Result<Self, DomainError> {
        if !(MIN_RATING..=MAX_RATING).contains(&value) {
            return Err(DomainError::RatingOutOfRange);
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Kinds of user-generated content attached to a place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UgcKind {
    Rating,
    Review,
    Comment,
}

impl UgcKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UgcKind::Rating => "rating",
            UgcKind::Review => "review",
            UgcKind::Comment => "comment",
        }
    }
}

impl std::str::FromStr for UgcKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rating" => Ok(UgcKind::Rating),
            "review" => Ok(UgcKind::Review),
            "comment" => Ok(UgcKind::Comment),
            other => Err(format!("unknown ugc kind: {other}")),
        }
    }
}

/// A point of interest imported from OpenStreetMap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: PlaceId,
    pub osm_id: OsmId,
    pub osm_type: Option<String>,
    pub name: Option<String>,
    pub category_key: Option<String>,
    pub category_value: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub tags: Value,
    pub address: Value,
    pub source: Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Place {
    /// Text used for the embedding vector. Falls back to a constant so
    /// unnamed places still land somewhere deterministic in the index.
    pub fn embedding_text(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown place")
    }

    /// Payload stored alongside the vector in Qdrant.
    pub fn vector_payload(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "category": self.category_value,
            "lat": self.coordinates.map(|c| c.latitude),
            "lon": self.coordinates.map(|c| c.longitude),
            "tags": self.tags,
        })
    }
}

/// A user-generated content row: a rating, review or comment on a place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ugc {
    pub id: Uuid,
    pub telegram_user_id: i64,
    pub place_id: PlaceId,
    pub kind: UgcKind,
    pub rating: Option<i16>,
    pub text: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_osm_id_valid() {
        let id = OsmId::new("node:61669376").unwrap();
        assert_eq!(id.as_str(), "node:61669376");
    }

    #[test]
    fn test_osm_id_empty() {
        assert_eq!(OsmId::new(""), Err(DomainError::EmptyOsmId));
    }

    #[test]
    fn test_osm_id_too_long() {
        let long = "n".repeat(MAX_OSM_ID_LENGTH + 1);
        assert_eq!(OsmId::new(long), Err(DomainError::OsmIdTooLong));
    }

    #[test]
    fn test_osm_id_max_length_boundary() {
        let exact = "n".repeat(MAX_OSM_ID_LENGTH);
        assert!(OsmId::new(exact).is_ok());
    }

    #[test]
    fn test_coordinates_valid() {
        let coords = Coordinates::new(55.7558, 37.6173).unwrap();
        assert_eq!(coords.latitude, 55.7558);
        assert_eq!(coords.longitude, 37.6173);
    }

    #[test]
    fn test_coordinates_extremes() {
        assert!(Coordinates::new(90.0, 180.0).is_ok());
        assert!(Coordinates::new(-90.0, -180.0).is_ok());
        assert_eq!(
            Coordinates::new(90.1, 0.0),
            Err(DomainError::LatitudeOutOfRange)
        );
        assert_eq!(
            Coordinates::new(0.0, -180.5),
            Err(DomainError::LongitudeOutOfRange)
        );
    }

    #[test]
    fn test_rating_score_range() {
        assert!(RatingScore::new(1.0).is_ok());
        assert!(RatingScore::new(5.0).is_ok());
        assert!(RatingScore::new(3.7).is_ok());
        assert_eq!(RatingScore::new(0.9), Err(DomainError::RatingOutOfRange));
        assert_eq!(RatingScore::new(5.1), Err(DomainError::RatingOutOfRange));
    }

    #[test]
    fn test_ugc_kind_round_trip() {
        for kind in [UgcKind::Rating, UgcKind::Review, UgcKind::Comment] {
            assert_eq!(kind.as_str().parse::<UgcKind>().unwrap(), kind);
        }
        assert!("unknown".parse::<UgcKind>().is_err());
    }

    #[test]
    fn test_embedding_text_fallback() {
        let place = sample_place(None);
        assert_eq!(place.embedding_text(), "Unknown place");

        let named = sample_place(Some("Cinema Aurora".to_string()));
        assert_eq!(named.embedding_text(), "Cinema Aurora");
    }

    #[test]
    fn test_vector_payload_shape() {
        let place = sample_place(Some("Cinema Aurora".to_string()));
        let payload = place.vector_payload();
        assert_eq!(payload["name"], "Cinema Aurora");
        assert_eq!(payload["category"], "cinema");
        assert!(payload["lat"].as_f64().is_some());
    }

    fn sample_place(name: Option<String>) -> Place {
        let now = Utc::now();
        Place {
            id: PlaceId::new(),
            osm_id: OsmId::new("node:1").unwrap(),
            osm_type: Some("node".to_string()),
            name,
            category_key: Some("amenity".to_string()),
            category_value: Some("cinema".to_string()),
            coordinates: Some(Coordinates::new(55.75, 37.61).unwrap()),
            tags: serde_json::json!({}),
            address: serde_json::json!({}),
            source: serde_json::json!({}),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
