//! Embedding generation for semantic retrieval.

#[cfg(feature = "local-embeddings")]
mod fastembed;
mod openai;

#[cfg(feature = "local-embeddings")]
pub use self::fastembed::FastEmbedEmbedder;
pub use openai::OpenAIEmbedder;

use crate::config::{EmbeddingProvider, EmbeddingSettings, LlmSettings};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}

/// Build the configured embedder.
pub fn create_embedder(embedding: &EmbeddingSettings, llm: &LlmSettings) -> Result<Arc<dyn Embedder>> {
    match embedding.provider {
        EmbeddingProvider::OpenAI => Ok(Arc::new(OpenAIEmbedder::with_config(
            &embedding.model,
            embedding.dimensions as usize,
            llm.api_base.as_deref(),
            std::time::Duration::from_secs(llm.timeout_secs),
        )?)),
        #[cfg(feature = "local-embeddings")]
        EmbeddingProvider::FastEmbed => Ok(Arc::new(FastEmbedEmbedder::new()?)),
        #[cfg(not(feature = "local-embeddings"))]
        EmbeddingProvider::FastEmbed => Err(crate::error::TubeRagError::Config(
            "embedding.provider = \"fastembed\" requires building with --features local-embeddings"
                .to_string(),
        )),
    }
}
