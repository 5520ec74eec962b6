//! HTTP surface of the recommendation API.
//!
//! Routes live under the `/v1` prefix, plus an unversioned `/health`
//! endpoint. All handlers share one [`PlaceService`] through axum state.

pub mod error;
pub mod routes;
pub mod schemas;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::service::PlaceService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PlaceService>,
}

/// Build the application router.
pub fn build_router(service: Arc<PlaceService>) -> Router {
    let state = AppState { service };

    let v1 = Router::new()
        .route(
            "/places",
            post(routes::create_place).get(routes::search_places_get),
        )
        .route("/places/search", post(routes::search_places))
        .route(
            "/places/{place_id}",
            get(routes::get_place)
                .put(routes::update_place)
                .delete(routes::delete_place),
        )
        .route(
            "/places/{place_id}/reviews",
            post(routes::create_review).get(routes::list_reviews),
        );

    Router::new()
        .route("/health", get(routes::health_check))
        .nest("/v1", v1)
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
