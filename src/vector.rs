//! Qdrant-backed vector index over places.
//!
//! Points are keyed by the place UUID; payloads carry a compact summary
//! so the index stays useful for debugging, but search results are
//! always hydrated from PostgreSQL.

use anyhow::{Context, Result};
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, DeletePointsBuilder, Distance, PointStruct, PointsIdsList,
    SearchPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::QdrantSettings;
use crate::domain::PlaceId;

/// Qdrant wrapper scoped to the places collection.
pub struct PlaceIndex {
    client: Qdrant,
    collection_name: String,
}

impl PlaceIndex {
    /// Wrap an existing client. No network traffic happens until the
    /// first operation.
    pub fn new(client: Qdrant, collection_name: impl Into<String>) -> Self {
        Self {
            client,
            collection_name: collection_name.into(),
        }
    }

    /// Connect and make sure the collection exists.
    ///
    /// The collection is created with the dimensions of the
    /// all-MiniLM-L6-v2 model and cosine distance; an existing
    /// collection is left untouched.
    pub async fn connect(settings: &QdrantSettings) -> Result<Self> {
        info!("Connecting to Qdrant at {}", settings.url);

        let mut builder = Qdrant::from_url(&settings.url);
        if let Some(api_key) = &settings.api_key {
            builder = builder.api_key(api_key.clone());
        }
        let client = builder.build().context("Failed to build Qdrant client")?;

        let exists = client
            .collection_exists(&settings.collection_name)
            .await
            .context("Failed to check Qdrant collection")?;

        if !exists {
            info!(
                "Creating Qdrant collection '{}' ({} dims, cosine)",
                settings.collection_name, settings.vector_size
            );
            let collection = CreateCollectionBuilder::new(&settings.collection_name)
                .vectors_config(VectorParamsBuilder::new(settings.vector_size, Distance::Cosine));
            let res = client
                .create_collection(collection)
                .await
                .context("Failed to create Qdrant collection")?;
            anyhow::ensure!(res.result, "Qdrant collection could not be created");
        }

        Ok(Self::new(client, settings.collection_name.clone()))
    }

    /// Insert or replace the vector for a place.
    pub async fn upsert_place(
        &self,
        place_id: PlaceId,
        vector: Vec<f32>,
        payload: serde_json::Value,
    ) -> Result<()> {
        let payload = Payload::try_from(payload).context("Invalid Qdrant payload")?;
        let points = vec![PointStruct::new(place_id.to_string(), vector, payload)];

        self.client
            .upsert_points(qdrant_client::qdrant::UpsertPointsBuilder::new(
                &self.collection_name,
                points,
            ))
            .await
            .context("Failed to upsert place vector")?;

        debug!("Upserted vector for place {place_id}");
        Ok(())
    }

    /// Remove the vector of a deleted place. Missing points are not an
    /// error.
    pub async fn remove_place(&self, place_id: PlaceId) -> Result<()> {
        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection_name).points(PointsIdsList {
                    ids: vec![place_id.to_string().into()],
                }),
            )
            .await
            .context("Failed to delete place vector")?;
        Ok(())
    }

    /// Nearest places by embedding. Returns `(place id, similarity)`
    /// pairs; points with unparseable ids are skipped.
    pub async fn search(
        &self,
        vector: Vec<f32>,
        limit: u64,
        score_threshold: Option<f32>,
    ) -> Result<Vec<(PlaceId, f32)>> {
        let mut request = SearchPointsBuilder::new(&self.collection_name, vector, limit);
        if let Some(threshold) = score_threshold {
            request = request.score_threshold(threshold);
        }

        let response = self
            .client
            .search_points(request)
            .await
            .context("Failed to search place vectors")?;

        let mut results = Vec::with_capacity(response.result.len());
        for point in response.result {
            let Some(PointIdOptions::Uuid(raw)) =
                point.id.and_then(|id| id.point_id_options)
            else {
                warn!("Skipping Qdrant point with non-uuid id");
                continue;
            };
            match raw.parse::<Uuid>() {
                Ok(uuid) => results.push((PlaceId(uuid), point.score)),
                Err(_) => warn!("Skipping Qdrant point with malformed uuid: {raw}"),
            }
        }

        debug!("Vector search returned {} points", results.len());
        Ok(results)
    }
}
