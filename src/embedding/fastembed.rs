//! Local embeddings via fastembed (all-MiniLM-L6-v2, 384 dimensions).

use super::Embedder;
use crate::error::{Result, TubeRagError};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Arc;
use tracing::{debug, info};

const DIMENSIONS: usize = 384;

/// Embedder running an ONNX sentence-transformer on the local CPU.
///
/// Inference is blocking, so calls run on the blocking thread pool.
pub struct FastEmbedEmbedder {
    model: Arc<TextEmbedding>,
}

impl FastEmbedEmbedder {
    /// Load the model, downloading it into the user cache on first use.
    pub fn new() -> Result<Self> {
        let mut options =
            InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(false);
        if let Some(cache) = dirs::cache_dir() {
            options = options.with_cache_dir(cache.join("tuberag").join("fastembed"));
        }

        let model =
            TextEmbedding::try_new(options).map_err(|e| TubeRagError::Embedding(e.to_string()))?;
        info!("Loaded local embedding model all-MiniLM-L6-v2");

        Ok(Self {
            model: Arc::new(model),
        })
    }
}

#[async_trait]
impl Embedder for FastEmbedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| TubeRagError::Embedding("empty embedding response".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = self.model.clone();
        let texts = texts.to_vec();
        debug!("Embedding {} texts locally", texts.len());

        tokio::task::spawn_blocking(move || {
            model
                .embed(texts, None)
                .map_err(|e| TubeRagError::Embedding(e.to_string()))
        })
        .await
        .map_err(|e| TubeRagError::Embedding(format!("embedding task failed: {}", e)))?
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }
}
