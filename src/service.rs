//! Place service: the application layer between the HTTP handlers and
//! the two backing stores.
//!
//! Writes go to PostgreSQL first, then the vector index is synchronized;
//! a search hydrates Qdrant hits from PostgreSQL and silently drops ids
//! that no longer resolve there.

use anyhow::Result;
use chrono::Utc;
use serde_json::Value;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::db;
use crate::domain::{Coordinates, OsmId, Place, PlaceId, Ugc, UgcKind};
use crate::embedding::Embedder;
use crate::vector::PlaceIndex;

pub const DEFAULT_SEARCH_LIMIT: i64 = 10;

/// Input for creating a place.
#[derive(Debug, Clone)]
pub struct PlaceCreate {
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
}

/// Partial update; `None` fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct PlaceUpdate {
    pub osm_type: Option<String>,
    pub name: Option<String>,
    pub category_key: Option<String>,
    pub category_value: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub tags: Option<Value>,
    pub address: Option<Value>,
    pub source: Option<Value>,
    pub is_active: Option<bool>,
}

/// Search criteria; free text wins over structured filters.
#[derive(Debug, Clone, Default)]
pub struct PlaceSearch {
    pub query: Option<String>,
    pub category_key: Option<String>,
    pub category_value: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_km: Option<f64>,
    pub limit: i64,
    pub offset: i64,
    pub score_threshold: Option<f32>,
}

/// A place with its similarity score when it came from vector search.
#[derive(Debug, Clone)]
pub struct ScoredPlace {
    pub place: Place,
    pub score: Option<f32>,
}

pub struct PlaceService {
    pool: PgPool,
    index: PlaceIndex,
    embedder: Embedder,
}

impl PlaceService {
    pub fn new(pool: PgPool, index: PlaceIndex, embedder: Embedder) -> Self {
        Self {
            pool,
            index,
            embedder,
        }
    }

    pub async fn create_place(&self, input: PlaceCreate) -> Result<Place> {
        let now = Utc::now();
        let coordinates = match (input.latitude, input.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)?),
            _ => None,
        };

        let place = Place {
            id: PlaceId::new(),
            osm_id: OsmId::new(input.osm_id)?,
            osm_type: input.osm_type,
            name: input.name,
            category_key: input.category_key,
            category_value: input.category_value,
            coordinates,
            tags: input.tags,
            address: input.address,
            source: input.source,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };

        let created = db::create_place(&self.pool, &place).await?;
        self.sync_to_index(&created).await?;

        info!("Created place {} ({:?})", created.id, created.name);
        Ok(created)
    }

    pub async fn get_place(&self, place_id: PlaceId) -> Result<Option<Place>> {
        db::get_place_by_id(&self.pool, place_id).await
    }

    pub async fn update_place(
        &self,
        place_id: PlaceId,
        update: PlaceUpdate,
    ) -> Result<Option<Place>> {
        let Some(mut place) = db::get_place_by_id(&self.pool, place_id).await? else {
            return Ok(None);
        };

        apply_update(&mut place, update)?;
        place.updated_at = Utc::now();

        let Some(updated) = db::update_place(&self.pool, &place).await? else {
            return Ok(None);
        };
        self.sync_to_index(&updated).await?;

        Ok(Some(updated))
    }

    pub async fn delete_place(&self, place_id: PlaceId) -> Result<bool> {
        let deleted = db::delete_place(&self.pool, place_id).await?;
        if deleted {
            // Index cleanup is best effort; a dangling point is dropped
            // at hydration time anyway.
            if let Err(e) = self.index.remove_place(place_id).await {
                warn!("Failed to remove place {place_id} from index: {e:#}");
            }
        }
        Ok(deleted)
    }

    /// Search places. A free-text `query` goes through the vector
    /// index first; when it finds nothing, structured filters run
    /// against PostgreSQL, with an ILIKE name match as the last resort
    /// for the query.
    pub async fn search_places(&self, search: PlaceSearch) -> Result<Vec<ScoredPlace>> {
        if let Some(query) = trimmed_query(&search) {
            let results = self.search_by_vector(query, &search).await?;
            if !results.is_empty() {
                return Ok(results);
            }
            info!("Vector search found nothing for '{query}', trying structured search");
        }

        let places = match structured_route(&search) {
            SearchRoute::Category => {
                db::search_places_by_category(
                    &self.pool,
                    search.category_key.as_deref(),
                    search.category_value.as_deref(),
                    search.limit,
                    search.offset,
                )
                .await?
            }
            SearchRoute::Coordinates { lat, lon, radius_km } => {
                let coordinates = Coordinates::new(lat, lon)?;
                db::search_places_by_coordinates(&self.pool, coordinates, radius_km, search.limit)
                    .await?
            }
            SearchRoute::Name => match trimmed_query(&search) {
                Some(query) => db::search_places_by_name(&self.pool, query, search.limit).await?,
                None => Vec::new(),
            },
            SearchRoute::Empty => Vec::new(),
        };

        Ok(places
            .into_iter()
            .map(|place| ScoredPlace { place, score: None })
            .collect())
    }

    async fn search_by_vector(
        &self,
        query: &str,
        search: &PlaceSearch,
    ) -> Result<Vec<ScoredPlace>> {
        info!("Vector search for: {query}");

        let vector = self.embedder.embed(query).await?;
        let hits = self
            .index
            .search(vector, search.limit.max(0) as u64, search.score_threshold)
            .await?;

        let mut results = Vec::with_capacity(hits.len());
        for (place_id, score) in hits {
            match db::get_place_by_id(&self.pool, place_id).await? {
                Some(place) if place.is_active => results.push(ScoredPlace {
                    place,
                    score: Some(score),
                }),
                Some(_) => {}
                None => warn!("Indexed place {place_id} not found in database, skipping"),
            }
        }

        // Structured filters still apply on top of the vector hits.
        if let Some(category_value) = search.category_value.as_deref() {
            results.retain(|r| r.place.category_value.as_deref() == Some(category_value));
        }
        if let Some(category_key) = search.category_key.as_deref() {
            results.retain(|r| r.place.category_key.as_deref() == Some(category_key));
        }

        info!("Vector search returned {} places", results.len());
        Ok(results)
    }

    /// Submit a rating and/or review text for a place.
    pub async fn add_review(
        &self,
        place_id: PlaceId,
        telegram_user_id: i64,
        rating: Option<i16>,
        text: Option<&str>,
    ) -> Result<Option<Ugc>> {
        if db::get_place_by_id(&self.pool, place_id).await?.is_none() {
            return Ok(None);
        }

        let kind = match (&rating, text) {
            (Some(_), None) => UgcKind::Rating,
            _ => UgcKind::Review,
        };
        let ugc = db::add_ugc(&self.pool, place_id, telegram_user_id, kind, rating, text).await?;
        Ok(Some(ugc))
    }

    pub async fn list_reviews(&self, place_id: PlaceId, limit: i64) -> Result<Option<Vec<Ugc>>> {
        if db::get_place_by_id(&self.pool, place_id).await?.is_none() {
            return Ok(None);
        }
        let reviews = db::list_reviews(&self.pool, place_id, limit).await?;
        Ok(Some(reviews))
    }

    pub async fn average_rating(&self, place_id: PlaceId) -> Result<Option<f64>> {
        db::average_rating(&self.pool, place_id).await
    }

    async fn sync_to_index(&self, place: &Place) -> Result<()> {
        let vector = self.embedder.embed(place.embedding_text()).await?;
        self.index
            .upsert_place(place.id, vector, place.vector_payload())
            .await
    }
}

fn trimmed_query(search: &PlaceSearch) -> Option<&str> {
    search.query.as_deref().filter(|q| !q.trim().is_empty())
}

/// Which PostgreSQL search runs when the vector index yields nothing.
/// Category filters win over coordinates; a bare query falls back to a
/// name match; no criteria at all means an empty result set.
#[derive(Debug, PartialEq)]
enum SearchRoute {
    Category,
    Coordinates { lat: f64, lon: f64, radius_km: f64 },
    Name,
    Empty,
}

fn structured_route(search: &PlaceSearch) -> SearchRoute {
    if search.category_key.is_some() || search.category_value.is_some() {
        return SearchRoute::Category;
    }
    if let (Some(lat), Some(lon), Some(radius_km)) =
        (search.latitude, search.longitude, search.radius_km)
    {
        return SearchRoute::Coordinates { lat, lon, radius_km };
    }
    if trimmed_query(search).is_some() {
        return SearchRoute::Name;
    }
    SearchRoute::Empty
}

fn apply_update(place: &mut Place, update: PlaceUpdate) -> Result<()> {
    if update.osm_type.is_some() {
        place.osm_type = update.osm_type;
    }
    if update.name.is_some() {
        place.name = update.name;
    }
    if update.category_key.is_some() {
        place.category_key = update.category_key;
    }
    if update.category_value.is_some() {
        place.category_value = update.category_value;
    }
    match (update.latitude, update.longitude) {
        (Some(lat), Some(lon)) => place.coordinates = Some(Coordinates::new(lat, lon)?),
        (None, None) => {}
        // A lone latitude or longitude replaces only that axis when the
        // place already has coordinates.
        (lat, lon) => {
            if let Some(current) = place.coordinates {
                place.coordinates = Some(Coordinates::new(
                    lat.unwrap_or(current.latitude),
                    lon.unwrap_or(current.longitude),
                )?);
            }
        }
    }
    if let Some(tags) = update.tags {
        place.tags = tags;
    }
    if let Some(address) = update.address {
        place.address = address;
    }
    if let Some(source) = update.source {
        place.source = source;
    }
    if let Some(is_active) = update.is_active {
        place.is_active = is_active;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OsmId;

    fn sample_place() -> Place {
        let now = Utc::now();
        Place {
            id: PlaceId::new(),
            osm_id: OsmId::new("node:7").unwrap(),
            osm_type: Some("node".to_string()),
            name: Some("Old Library".to_string()),
            category_key: Some("amenity".to_string()),
            category_value: Some("library".to_string()),
            coordinates: Some(Coordinates::new(48.85, 2.35).unwrap()),
            tags: serde_json::json!({"wheelchair": "yes"}),
            address: serde_json::json!({}),
            source: serde_json::json!({}),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_route_query_falls_back_to_name_search() {
        let search = PlaceSearch {
            query: Some("aurora".to_string()),
            limit: 10,
            ..Default::default()
        };
        assert_eq!(structured_route(&search), SearchRoute::Name);

        // A whitespace-only query is no query at all.
        let blank = PlaceSearch {
            query: Some("   ".to_string()),
            limit: 10,
            ..Default::default()
        };
        assert_eq!(structured_route(&blank), SearchRoute::Empty);
    }

    #[test]
    fn test_route_category_wins_over_coordinates() {
        let search = PlaceSearch {
            category_value: Some("bar".to_string()),
            latitude: Some(55.75),
            longitude: Some(37.61),
            radius_km: Some(2.0),
            limit: 10,
            ..Default::default()
        };
        assert_eq!(structured_route(&search), SearchRoute::Category);
    }

    #[test]
    fn test_route_coordinates_need_all_three_params() {
        let search = PlaceSearch {
            latitude: Some(55.75),
            longitude: Some(37.61),
            radius_km: Some(2.0),
            limit: 10,
            ..Default::default()
        };
        assert_eq!(
            structured_route(&search),
            SearchRoute::Coordinates {
                lat: 55.75,
                lon: 37.61,
                radius_km: 2.0
            }
        );

        let missing_radius = PlaceSearch {
            latitude: Some(55.75),
            longitude: Some(37.61),
            limit: 10,
            ..Default::default()
        };
        assert_eq!(structured_route(&missing_radius), SearchRoute::Empty);
    }

    #[test]
    fn test_route_no_criteria_is_empty() {
        let search = PlaceSearch {
            limit: 10,
            ..Default::default()
        };
        assert_eq!(structured_route(&search), SearchRoute::Empty);
    }

    #[test]
    fn test_apply_update_partial() {
        let mut place = sample_place();
        apply_update(
            &mut place,
            PlaceUpdate {
                name: Some("New Library".to_string()),
                is_active: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(place.name.as_deref(), Some("New Library"));
        assert!(!place.is_active);
        // Untouched fields survive.
        assert_eq!(place.category_value.as_deref(), Some("library"));
        assert!(place.coordinates.is_some());
    }

    #[test]
    fn test_apply_update_single_axis_coordinates() {
        let mut place = sample_place();
        apply_update(
            &mut place,
            PlaceUpdate {
                latitude: Some(50.0),
                ..Default::default()
            },
        )
        .unwrap();

        let coords = place.coordinates.unwrap();
        assert_eq!(coords.latitude, 50.0);
        assert_eq!(coords.longitude, 2.35);
    }

    #[test]
    fn test_apply_update_invalid_coordinates() {
        let mut place = sample_place();
        let result = apply_update(
            &mut place,
            PlaceUpdate {
                latitude: Some(91.0),
                longitude: Some(0.0),
                ..Default::default()
            },
        );
        assert!(result.is_err());
    }
}
