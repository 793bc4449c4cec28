//! Similarity search over embedded transcript chunks.
//!
//! An index is built once per request from a single transcript and discarded
//! afterwards.

mod memory;

pub use memory::MemoryIndex;

use crate::chunking::Chunk;
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;

/// A retrieved chunk with its similarity to the query.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub chunk: Chunk,
    /// Cosine similarity (higher is better).
    pub score: f32,
}

/// Nearest-neighbour search over chunk embeddings.
#[async_trait]
pub trait SimilarityIndex: Send + Sync {
    /// Return the `k` most similar chunks, best first.
    ///
    /// Returns fewer than `k` results when the index holds fewer chunks.
    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<SearchResult>>;

    /// Number of indexed chunks.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
