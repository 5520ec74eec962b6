//! HTTP client the bot uses to talk to the recommendation API.
//!
//! Failures never bubble up to the chat user as crashes: a search that
//! cannot reach the API degrades to an empty result set with a warning
//! in the logs.

use std::time::Duration;

use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::api::schemas::{PlaceResponse, PlaceSearchResponse, PlaceSearchResultResponse};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct PlacesApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl PlacesApiClient {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Search places by free text and/or category.
    pub async fn search_places(
        &self,
        query: Option<&str>,
        category: Option<&str>,
        limit: i64,
    ) -> Vec<PlaceSearchResultResponse> {
        let url = format!("{}/v1/places", self.base_url);
        let mut params: Vec<(&str, String)> =
            vec![("limit", limit.to_string()), ("offset", "0".to_string())];
        if let Some(query) = query {
            params.push(("query", query.to_string()));
        }
        if let Some(category) = category {
            params.push(("category_value", category.to_string()));
        }

        let response = match self.client.get(&url).query(&params).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Failed to reach places API: {e}");
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            warn!("Places API search returned {}", response.status());
            return Vec::new();
        }

        match response.json::<PlaceSearchResponse>().await {
            Ok(payload) => payload.results,
            Err(e) => {
                warn!("Failed to parse places API response: {e}");
                Vec::new()
            }
        }
    }

    /// Fetch a single place, `None` when missing or unreachable.
    pub async fn get_place(&self, place_id: Uuid) -> Option<PlaceResponse> {
        let url = format!("{}/v1/places/{place_id}", self.base_url);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Failed to fetch place {place_id}: {e}");
                return None;
            }
        };

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return None;
        }
        if !response.status().is_success() {
            warn!("Places API get returned {}", response.status());
            return None;
        }

        match response.json::<PlaceResponse>().await {
            Ok(place) => Some(place),
            Err(e) => {
                warn!("Failed to parse place {place_id}: {e}");
                None
            }
        }
    }

    /// Submit a rating (1..=5) for an API-side place. Returns `false`
    /// when the API rejected or never received it.
    pub async fn submit_rating(&self, place_id: Uuid, telegram_user_id: i64, rating: i16) -> bool {
        let url = format!("{}/v1/places/{place_id}/reviews", self.base_url);
        let body = json!({
            "telegram_user_id": telegram_user_id,
            "rating": rating,
        });

        match self.client.post(&url).json(&body).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!("Places API review returned {}", response.status());
                false
            }
            Err(e) => {
                warn!("Failed to submit rating for {place_id}: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let client = PlacesApiClient::new("http://localhost:8000/");
        assert_eq!(client.base_url, "http://localhost:8000");
    }
}
