//! Request and response schemas for the `/v1` API.
//!
//! These are the wire types the bot's `api_client` deserializes too, so
//! both services agree on the contract by construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{Place, Ugc};
use crate::service::{PlaceSearch, ScoredPlace};

pub const MAX_SEARCH_LIMIT: i64 = 100;

fn default_tags() -> Value {
    Value::Object(Default::default())
}

fn default_true() -> bool {
    true
}

fn default_limit() -> i64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceCreateRequest {
    pub osm_id: String,
    #[serde(default)]
    pub osm_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category_key: Option<String>,
    #[serde(default)]
    pub category_value: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default = "default_tags")]
    pub tags: Value,
    #[serde(default = "default_tags")]
    pub address: Value,
    #[serde(default = "default_tags")]
    pub source: Value,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaceUpdateRequest {
    #[serde(default)]
    pub osm_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category_key: Option<String>,
    #[serde(default)]
    pub category_value: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub tags: Option<Value>,
    #[serde(default)]
    pub address: Option<Value>,
    #[serde(default)]
    pub source: Option<Value>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Search parameters, shared by the GET query string and the POST body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaceSearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub category_key: Option<String>,
    #[serde(default)]
    pub category_value: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub radius_km: Option<f64>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub score_threshold: Option<f32>,
}

impl PlaceSearchRequest {
    /// Validate bounds and convert into service criteria.
    pub fn into_search(self) -> Result<PlaceSearch, String> {
        if !(1..=MAX_SEARCH_LIMIT).contains(&self.limit) {
            return Err(format!("limit must be between 1 and {MAX_SEARCH_LIMIT}"));
        }
        if self.offset < 0 {
            return Err("offset must not be negative".to_string());
        }
        if let Some(threshold) = self.score_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err("score_threshold must be between 0.0 and 1.0".to_string());
            }
        }

        Ok(PlaceSearch {
            query: self.query,
            category_key: self.category_key,
            category_value: self.category_value,
            latitude: self.latitude,
            longitude: self.longitude,
            radius_km: self.radius_km,
            limit: self.limit,
            offset: self.offset,
            score_threshold: self.score_threshold,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceResponse {
    pub id: Uuid,
    pub osm_id: String,
    pub osm_type: Option<String>,
    pub name: Option<String>,
    pub category_key: Option<String>,
    pub category_value: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub tags: Value,
    pub address: Value,
    pub source: Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Place> for PlaceResponse {
    fn from(place: Place) -> Self {
        Self {
            id: place.id.0,
            osm_id: place.osm_id.as_str().to_string(),
            osm_type: place.osm_type,
            name: place.name,
            category_key: place.category_key,
            category_value: place.category_value,
            latitude: place.coordinates.map(|c| c.latitude),
            longitude: place.coordinates.map(|c| c.longitude),
            tags: place.tags,
            address: place.address,
            source: place.source,
            is_active: place.is_active,
            created_at: place.created_at,
            updated_at: place.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceSearchResultResponse {
    pub place: PlaceResponse,
    pub score: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceSearchResponse {
    pub results: Vec<PlaceSearchResultResponse>,
    /// Total match count; never computed, kept for forward compatibility.
    pub total: Option<i64>,
    pub limit: i64,
    pub offset: i64,
}

impl PlaceSearchResponse {
    pub fn from_results(results: Vec<ScoredPlace>, limit: i64, offset: i64) -> Self {
        Self {
            results: results
                .into_iter()
                .map(|scored| PlaceSearchResultResponse {
                    place: scored.place.into(),
                    score: scored.score,
                })
                .collect(),
            total: None,
            limit,
            offset,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewCreateRequest {
    pub telegram_user_id: i64,
    #[serde(default)]
    pub rating: Option<i16>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub place_id: Uuid,
    pub telegram_user_id: i64,
    pub kind: String,
    pub rating: Option<i16>,
    pub text: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Ugc> for ReviewResponse {
    fn from(ugc: Ugc) -> Self {
        Self {
            id: ugc.id,
            place_id: ugc.place_id.0,
            telegram_user_id: ugc.telegram_user_id,
            kind: ugc.kind.as_str().to_string(),
            rating: ugc.rating,
            text: ugc.text,
            created_at: ugc.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewListResponse {
    pub reviews: Vec<ReviewResponse>,
    /// Mean of all stored ratings for the place, absent without any.
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_defaults() {
        let request: PlaceCreateRequest =
            serde_json::from_str(r#"{"osm_id": "node:61669376"}"#).unwrap();
        assert_eq!(request.osm_id, "node:61669376");
        assert!(request.is_active);
        assert!(request.tags.as_object().unwrap().is_empty());
        assert!(request.name.is_none());
    }

    #[test]
    fn test_search_request_defaults_and_bounds() {
        let request: PlaceSearchRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.limit, 10);
        assert_eq!(request.offset, 0);
        assert!(request.into_search().is_ok());

        let too_big: PlaceSearchRequest =
            serde_json::from_str(r#"{"limit": 1000}"#).unwrap();
        assert!(too_big.into_search().is_err());

        let bad_threshold: PlaceSearchRequest =
            serde_json::from_str(r#"{"score_threshold": 1.5}"#).unwrap();
        assert!(bad_threshold.into_search().is_err());
    }

    #[test]
    fn test_search_response_parses_realistic_payload() {
        let payload = r#"{
            "results": [{
                "place": {
                    "id": "7f8a1f74-2f5e-4b9f-9a53-0b6a4b1c2d3e",
                    "osm_id": "node:61669376",
                    "osm_type": "node",
                    "name": "Cinema Aurora",
                    "category_key": "amenity",
                    "category_value": "cinema",
                    "latitude": 55.7558,
                    "longitude": 37.6173,
                    "tags": {"contact:phone": "+7 495 000-00-00"},
                    "address": {"road": "Arbat", "city": "Moscow"},
                    "source": {},
                    "is_active": true,
                    "created_at": "2025-01-15T10:00:00Z",
                    "updated_at": "2025-01-15T10:00:00Z"
                },
                "score": 0.87
            }],
            "total": null,
            "limit": 10,
            "offset": 0
        }"#;

        let response: PlaceSearchResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(response.results.len(), 1);
        let result = &response.results[0];
        assert_eq!(result.place.name.as_deref(), Some("Cinema Aurora"));
        assert_eq!(result.score, Some(0.87));
        assert!(response.total.is_none());
    }
}
