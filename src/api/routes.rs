//! Handlers for the `/v1` endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::schemas::{
    PlaceCreateRequest, PlaceResponse, PlaceSearchRequest, PlaceSearchResponse,
    PlaceUpdateRequest, ReviewCreateRequest, ReviewListResponse, ReviewResponse,
};
use crate::api::AppState;
use crate::domain::PlaceId;
use crate::service::{PlaceCreate, PlaceUpdate};

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn create_place(
    State(state): State<AppState>,
    Json(request): Json<PlaceCreateRequest>,
) -> Result<(StatusCode, Json<PlaceResponse>), ApiError> {
    info!("Creating place for osm_id {}", request.osm_id);

    let place = state
        .service
        .create_place(PlaceCreate {
            osm_id: request.osm_id,
            osm_type: request.osm_type,
            name: request.name,
            category_key: request.category_key,
            category_value: request.category_value,
            latitude: request.latitude,
            longitude: request.longitude,
            tags: request.tags,
            address: request.address,
            source: request.source,
            is_active: request.is_active,
        })
        .await
        .map_err(map_domain_error)?;

    Ok((StatusCode::CREATED, Json(place.into())))
}

pub async fn get_place(
    State(state): State<AppState>,
    Path(place_id): Path<Uuid>,
) -> Result<Json<PlaceResponse>, ApiError> {
    let place = state
        .service
        .get_place(PlaceId(place_id))
        .await?
        .ok_or(ApiError::PlaceNotFound(place_id))?;

    Ok(Json(place.into()))
}

pub async fn update_place(
    State(state): State<AppState>,
    Path(place_id): Path<Uuid>,
    Json(request): Json<PlaceUpdateRequest>,
) -> Result<Json<PlaceResponse>, ApiError> {
    let place = state
        .service
        .update_place(
            PlaceId(place_id),
            PlaceUpdate {
                osm_type: request.osm_type,
                name: request.name,
                category_key: request.category_key,
                category_value: request.category_value,
                latitude: request.latitude,
                longitude: request.longitude,
                tags: request.tags,
                address: request.address,
                source: request.source,
                is_active: request.is_active,
            },
        )
        .await
        .map_err(map_domain_error)?
        .ok_or(ApiError::PlaceNotFound(place_id))?;

    Ok(Json(place.into()))
}

pub async fn delete_place(
    State(state): State<AppState>,
    Path(place_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = state.service.delete_place(PlaceId(place_id)).await?;
    if !deleted {
        return Err(ApiError::PlaceNotFound(place_id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET search: the endpoint the bot talks to.
pub async fn search_places_get(
    State(state): State<AppState>,
    Query(request): Query<PlaceSearchRequest>,
) -> Result<Json<PlaceSearchResponse>, ApiError> {
    run_search(state, request).await
}

/// POST search: same criteria as a JSON body.
pub async fn search_places(
    State(state): State<AppState>,
    Json(request): Json<PlaceSearchRequest>,
) -> Result<Json<PlaceSearchResponse>, ApiError> {
    run_search(state, request).await
}

async fn run_search(
    state: AppState,
    request: PlaceSearchRequest,
) -> Result<Json<PlaceSearchResponse>, ApiError> {
    let limit = request.limit;
    let offset = request.offset;
    let search = request.into_search().map_err(ApiError::Validation)?;

    let results = state
        .service
        .search_places(search)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(PlaceSearchResponse::from_results(results, limit, offset)))
}

pub async fn create_review(
    State(state): State<AppState>,
    Path(place_id): Path<Uuid>,
    Json(request): Json<ReviewCreateRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>), ApiError> {
    if let Some(rating) = request.rating {
        if !(1..=5).contains(&rating) {
            return Err(ApiError::Validation(
                "rating must be between 1 and 5".to_string(),
            ));
        }
    }
    if request.rating.is_none() && request.text.as_deref().unwrap_or("").trim().is_empty() {
        return Err(ApiError::Validation(
            "a review needs a rating or a text".to_string(),
        ));
    }

    let ugc = state
        .service
        .add_review(
            PlaceId(place_id),
            request.telegram_user_id,
            request.rating,
            request.text.as_deref(),
        )
        .await?
        .ok_or(ApiError::PlaceNotFound(place_id))?;

    Ok((StatusCode::CREATED, Json(ugc.into())))
}

pub async fn list_reviews(
    State(state): State<AppState>,
    Path(place_id): Path<Uuid>,
) -> Result<Json<ReviewListResponse>, ApiError> {
    let reviews = state
        .service
        .list_reviews(PlaceId(place_id), 50)
        .await?
        .ok_or(ApiError::PlaceNotFound(place_id))?;
    let average_rating = state.service.average_rating(PlaceId(place_id)).await?;

    Ok(Json(ReviewListResponse {
        reviews: reviews.into_iter().map(Into::into).collect(),
        average_rating,
    }))
}

/// Domain validation failures travel as `anyhow` errors out of the
/// service layer; unwrap them back into 422s instead of 500s.
fn map_domain_error(err: anyhow::Error) -> ApiError {
    match err.downcast::<crate::domain::DomainError>() {
        Ok(domain) => domain.into(),
        Err(other) => ApiError::Internal(other),
    }
}
