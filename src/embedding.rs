//! Text embeddings for place names and search queries.
//!
//! Uses the same 384-dimension all-MiniLM-L6-v2 model the ingestion
//! pipeline indexed with. Model initialization is expensive, so one
//! instance is created lazily and reused for the lifetime of the
//! process; inference runs on a blocking thread to keep it off Tokio's
//! async scheduler.

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::{debug, info};

/// Dimension of the embeddings produced by [`Embedder`].
pub const EMBEDDING_DIM: usize = 384;

/// Thread-safe shared embedding model.
#[derive(Clone)]
pub struct Embedder {
    model: Arc<Mutex<Option<TextEmbedding>>>,
}

impl Embedder {
    pub fn new() -> Self {
        Self {
            model: Arc::new(Mutex::new(None)),
        }
    }

    /// Embed a single text. The first call initializes the model.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let input = text.to_owned();
        let model = Arc::clone(&self.model);

        let embedding = tokio::task::spawn_blocking(move || {
            let mut guard = model.lock().unwrap();
            if guard.is_none() {
                info!("Initializing all-MiniLM-L6-v2 embedding model");
                let instance = TextEmbedding::try_new(
                    InitOptions::new(EmbeddingModel::AllMiniLML6V2)
                        .with_show_download_progress(false),
                )
                .context("Failed to initialize embedding model")?;
                *guard = Some(instance);
            }

            let instance = guard.as_mut().expect("model initialized above");
            let mut embeddings = instance
                .embed(vec![input], None)
                .context("Failed to embed text")?;
            embeddings
                .pop()
                .context("Embedding model returned no vectors")
        })
        .await
        .context("Embedding task panicked")??;

        debug!("Embedded text into {} dimensions", embedding.len());
        Ok(embedding)
    }
}

impl Default for Embedder {
    fn default() -> Self {
        Self::new()
    }
}
