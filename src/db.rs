//! PostgreSQL access layer: schema bootstrap, place repository and
//! user-generated content queries.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use uuid::Uuid;

use crate::config::DatabaseSettings;
use crate::domain::{Coordinates, OsmId, Place, PlaceId, Ugc, UgcKind};

/// Connect a pool using the configured limits.
pub async fn connect_pool(settings: &DatabaseSettings) -> Result<PgPool> {
    info!("Connecting to database at {}", settings.dsn_as_safe_url());

    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.dsn())
        .await
        .context("Failed to connect to PostgreSQL")
}

/// Initialize the database schema.
///
/// Mirrors the initial migration: a `content` schema holding `place`
/// and `ugc`. Safe to run on every startup.
pub async fn init_database_schema(pool: &PgPool) -> Result<()> {
    info!("Initializing database schema...");

    sqlx::query("CREATE SCHEMA IF NOT EXISTS content")
        .execute(pool)
        .await
        .context("Failed to create content schema")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS content.place (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            osm_id VARCHAR(64) NOT NULL,
            osm_type VARCHAR(16),
            name VARCHAR(512),
            category_key VARCHAR(64),
            category_value VARCHAR(128),
            lat DOUBLE PRECISION,
            lon DOUBLE PRECISION,
            tags JSONB NOT NULL DEFAULT '{}'::jsonb,
            address JSONB NOT NULL DEFAULT '{}'::jsonb,
            source JSONB NOT NULL DEFAULT '{}'::jsonb,
            is_active BOOLEAN NOT NULL DEFAULT true,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            CONSTRAINT uq_place_osm_id UNIQUE (osm_id)
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create place table")?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS ix_place_category
         ON content.place (category_key, category_value)",
    )
    .execute(pool)
    .await
    .context("Failed to create place category index")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS ix_place_coords ON content.place (lat, lon)")
        .execute(pool)
        .await
        .context("Failed to create place coords index")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS ix_place_is_active ON content.place (is_active)")
        .execute(pool)
        .await
        .context("Failed to create place is_active index")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS content.ugc (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            telegram_user_id BIGINT NOT NULL,
            place_id UUID NOT NULL REFERENCES content.place (id) ON DELETE CASCADE,
            kind TEXT NOT NULL CHECK (kind IN ('rating', 'review', 'comment')),
            rating SMALLINT,
            text TEXT,
            is_deleted BOOLEAN NOT NULL DEFAULT false,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            CONSTRAINT ck_ugc_rating_range
                CHECK (rating IS NULL OR (rating >= 1 AND rating <= 5))
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create ugc table")?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS ix_ugc_place_id_created_at
         ON content.ugc (place_id, created_at)",
    )
    .execute(pool)
    .await
    .context("Failed to create ugc place index")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS ix_ugc_kind ON content.ugc (kind)")
        .execute(pool)
        .await
        .context("Failed to create ugc kind index")?;

    info!("Database schema initialized successfully");
    Ok(())
}

#[derive(Debug, FromRow)]
struct PlaceRow {
    id: Uuid,
    osm_id: String,
    osm_type: Option<String>,
    name: Option<String>,
    category_key: Option<String>,
    category_value: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    tags: Value,
    address: Value,
    source: Value,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PlaceRow {
    fn into_domain(self) -> Result<Place> {
        let coordinates = match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)?),
            _ => None,
        };
        Ok(Place {
            id: PlaceId(self.id),
            osm_id: OsmId::new(self.osm_id)?,
            osm_type: self.osm_type,
            name: self.name,
            category_key: self.category_key,
            category_value: self.category_value,
            coordinates,
            tags: self.tags,
            address: self.address,
            source: self.source,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const PLACE_COLUMNS: &str = "id, osm_id, osm_type, name, category_key, category_value, \
     lat, lon, tags, address, source, is_active, created_at, updated_at";

/// Create a new place and return the stored row.
pub async fn create_place(pool: &PgPool, place: &Place) -> Result<Place> {
    info!("Creating place {} ({})", place.id, place.osm_id.as_str());

    let row = sqlx::query_as::<_, PlaceRow>(&format!(
        "INSERT INTO content.place
            (id, osm_id, osm_type, name, category_key, category_value,
             lat, lon, tags, address, source, is_active, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
         RETURNING {PLACE_COLUMNS}"
    ))
    .bind(place.id.0)
    .bind(place.osm_id.as_str())
    .bind(&place.osm_type)
    .bind(&place.name)
    .bind(&place.category_key)
    .bind(&place.category_value)
    .bind(place.coordinates.map(|c| c.latitude))
    .bind(place.coordinates.map(|c| c.longitude))
    .bind(&place.tags)
    .bind(&place.address)
    .bind(&place.source)
    .bind(place.is_active)
    .bind(place.created_at)
    .bind(place.updated_at)
    .fetch_one(pool)
    .await
    .context("Failed to insert place")?;

    row.into_domain()
}

/// Read a place by id.
pub async fn get_place_by_id(pool: &PgPool, place_id: PlaceId) -> Result<Option<Place>> {
    let row = sqlx::query_as::<_, PlaceRow>(&format!(
        "SELECT {PLACE_COLUMNS} FROM content.place WHERE id = $1"
    ))
    .bind(place_id.0)
    .fetch_optional(pool)
    .await
    .context("Failed to read place")?;

    row.map(PlaceRow::into_domain).transpose()
}

/// Read a place by its OSM identifier.
pub async fn get_place_by_osm_id(pool: &PgPool, osm_id: &OsmId) -> Result<Option<Place>> {
    let row = sqlx::query_as::<_, PlaceRow>(&format!(
        "SELECT {PLACE_COLUMNS} FROM content.place WHERE osm_id = $1"
    ))
    .bind(osm_id.as_str())
    .fetch_optional(pool)
    .await
    .context("Failed to read place by osm_id")?;

    row.map(PlaceRow::into_domain).transpose()
}

/// Update an existing place. Returns the stored row, or `None` when the
/// place does not exist.
pub async fn update_place(pool: &PgPool, place: &Place) -> Result<Option<Place>> {
    info!("Updating place {}", place.id);

    let row = sqlx::query_as::<_, PlaceRow>(&format!(
        "UPDATE content.place SET
            osm_id = $2, osm_type = $3, name = $4, category_key = $5,
            category_value = $6, lat = $7, lon = $8, tags = $9, address = $10,
            source = $11, is_active = $12, updated_at = $13
         WHERE id = $1
         RETURNING {PLACE_COLUMNS}"
    ))
    .bind(place.id.0)
    .bind(place.osm_id.as_str())
    .bind(&place.osm_type)
    .bind(&place.name)
    .bind(&place.category_key)
    .bind(&place.category_value)
    .bind(place.coordinates.map(|c| c.latitude))
    .bind(place.coordinates.map(|c| c.longitude))
    .bind(&place.tags)
    .bind(&place.address)
    .bind(&place.source)
    .bind(place.is_active)
    .bind(place.updated_at)
    .fetch_optional(pool)
    .await
    .context("Failed to update place")?;

    row.map(PlaceRow::into_domain).transpose()
}

/// Delete a place. Returns `true` when a row was removed.
pub async fn delete_place(pool: &PgPool, place_id: PlaceId) -> Result<bool> {
    info!("Deleting place {place_id}");

    let result = sqlx::query("DELETE FROM content.place WHERE id = $1")
        .bind(place_id.0)
        .execute(pool)
        .await
        .context("Failed to delete place")?;

    Ok(result.rows_affected() > 0)
}

/// Case-insensitive substring search over active place names.
pub async fn search_places_by_name(pool: &PgPool, name: &str, limit: i64) -> Result<Vec<Place>> {
    let rows = sqlx::query_as::<_, PlaceRow>(&format!(
        "SELECT {PLACE_COLUMNS} FROM content.place
         WHERE name ILIKE $1 AND is_active = true
         LIMIT $2"
    ))
    .bind(format!("%{name}%"))
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to search places by name")?;

    rows.into_iter().map(PlaceRow::into_domain).collect()
}

/// Filter active places by category key and/or value.
pub async fn search_places_by_category(
    pool: &PgPool,
    category_key: Option<&str>,
    category_value: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Place>> {
    let rows = sqlx::query_as::<_, PlaceRow>(&format!(
        "SELECT {PLACE_COLUMNS} FROM content.place
         WHERE is_active = true
           AND ($1::text IS NULL OR category_key = $1)
           AND ($2::text IS NULL OR category_value = $2)
         OFFSET $3 LIMIT $4"
    ))
    .bind(category_key)
    .bind(category_value)
    .bind(offset)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to search places by category")?;

    rows.into_iter().map(PlaceRow::into_domain).collect()
}

/// Active places within `radius_km` of a point.
///
/// Uses the flat-earth approximation (1 degree ~ 111 km) the ingestion
/// pipeline uses; good enough at city scale.
pub async fn search_places_by_coordinates(
    pool: &PgPool,
    coordinates: Coordinates,
    radius_km: f64,
    limit: i64,
) -> Result<Vec<Place>> {
    let rows = sqlx::query_as::<_, PlaceRow>(&format!(
        "SELECT {PLACE_COLUMNS} FROM content.place
         WHERE lat IS NOT NULL AND lon IS NOT NULL AND is_active = true
           AND sqrt(pow((lat - $1) * 111.0, 2) + pow((lon - $2) * 111.0, 2)) <= $3
         LIMIT $4"
    ))
    .bind(coordinates.latitude)
    .bind(coordinates.longitude)
    .bind(radius_km)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to search places by coordinates")?;

    rows.into_iter().map(PlaceRow::into_domain).collect()
}

#[derive(Debug, FromRow)]
struct UgcRow {
    id: Uuid,
    telegram_user_id: i64,
    place_id: Uuid,
    kind: String,
    rating: Option<i16>,
    text: Option<String>,
    is_deleted: bool,
    created_at: DateTime<Utc>,
}

impl UgcRow {
    fn into_domain(self) -> Result<Ugc> {
        Ok(Ugc {
            id: self.id,
            telegram_user_id: self.telegram_user_id,
            place_id: PlaceId(self.place_id),
            kind: self
                .kind
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?,
            rating: self.rating,
            text: self.text,
            is_deleted: self.is_deleted,
            created_at: self.created_at,
        })
    }
}

const UGC_COLUMNS: &str =
    "id, telegram_user_id, place_id, kind, rating, text, is_deleted, created_at";

/// Attach a rating/review/comment to a place.
pub async fn add_ugc(
    pool: &PgPool,
    place_id: PlaceId,
    telegram_user_id: i64,
    kind: UgcKind,
    rating: Option<i16>,
    text: Option<&str>,
) -> Result<Ugc> {
    info!("Adding {} for place {place_id}", kind.as_str());

    let row = sqlx::query_as::<_, UgcRow>(&format!(
        "INSERT INTO content.ugc (telegram_user_id, place_id, kind, rating, text)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {UGC_COLUMNS}"
    ))
    .bind(telegram_user_id)
    .bind(place_id.0)
    .bind(kind.as_str())
    .bind(rating)
    .bind(text)
    .fetch_one(pool)
    .await
    .context("Failed to insert ugc")?;

    row.into_domain()
}

/// Reviews and ratings for a place, newest first.
pub async fn list_reviews(pool: &PgPool, place_id: PlaceId, limit: i64) -> Result<Vec<Ugc>> {
    let rows = sqlx::query_as::<_, UgcRow>(&format!(
        "SELECT {UGC_COLUMNS} FROM content.ugc
         WHERE place_id = $1 AND is_deleted = false
           AND kind IN ('rating', 'review')
         ORDER BY created_at DESC
         LIMIT $2"
    ))
    .bind(place_id.0)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to list reviews")?;

    rows.into_iter().map(UgcRow::into_domain).collect()
}

/// Average user rating of a place, when any ratings exist.
pub async fn average_rating(pool: &PgPool, place_id: PlaceId) -> Result<Option<f64>> {
    let avg: Option<f64> = sqlx::query_scalar(
        "SELECT AVG(rating)::double precision FROM content.ugc
         WHERE place_id = $1 AND rating IS NOT NULL AND is_deleted = false",
    )
    .bind(place_id.0)
    .fetch_one(pool)
    .await
    .context("Failed to compute average rating")?;

    Ok(avg)
}
