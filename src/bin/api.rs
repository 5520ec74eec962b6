//! HTTP recommendation API server.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use nomad_places::api::build_router;
use nomad_places::config::Settings;
use nomad_places::db;
use nomad_places::embedding::Embedder;
use nomad_places::service::PlaceService;
use nomad_places::vector::PlaceIndex;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::from_env()?;
    info!("Connecting to database {}", settings.db.dsn_as_safe_url());

    let pool = db::connect_pool(&settings.db).await?;
    db::init_database_schema(&pool).await?;

    let index = PlaceIndex::connect(&settings.qdrant).await?;
    let embedder = Embedder::new();

    let service = Arc::new(PlaceService::new(pool, index, embedder));
    let router = build_router(service);

    let addr = settings.api.bind_addr();
    info!("Places API listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, router)
        .await
        .context("API server stopped")?;

    Ok(())
}
