//! Exact in-memory index.

use super::{cosine_similarity, SearchResult, SimilarityIndex};
use crate::chunking::Chunk;
use crate::error::{Result, TubeRagError};
use async_trait::async_trait;
use tracing::debug;

/// Brute-force cosine index. Scores every chunk on each query.
#[derive(Debug)]
pub struct MemoryIndex {
    entries: Vec<(Chunk, Vec<f32>)>,
    dimensions: usize,
}

impl MemoryIndex {
    /// Build an index from embedded chunks. All vectors must share one dimension.
    pub fn build(entries: Vec<(Chunk, Vec<f32>)>) -> Result<Self> {
        let dimensions = match entries.first() {
            Some((_, v)) if v.is_empty() => {
                return Err(TubeRagError::Index("empty embedding vector".to_string()))
            }
            Some((_, v)) => v.len(),
            None => return Err(TubeRagError::Index("no chunks to index".to_string())),
        };

        if let Some((chunk, v)) = entries.iter().find(|(_, v)| v.len() != dimensions) {
            return Err(TubeRagError::Index(format!(
                "chunk {} has {} dimensions, expected {}",
                chunk.order,
                v.len(),
                dimensions
            )));
        }

        debug!("Indexed {} chunks ({} dims)", entries.len(), dimensions);
        Ok(Self {
            entries,
            dimensions,
        })
    }
}

#[async_trait]
impl SimilarityIndex for MemoryIndex {
    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if query_embedding.len() != self.dimensions {
            return Err(TubeRagError::Index(format!(
                "query has {} dimensions, index has {}",
                query_embedding.len(),
                self.dimensions
            )));
        }

        let mut results: Vec<SearchResult> = self
            .entries
            .iter()
            .map(|(chunk, embedding)| SearchResult {
                chunk: chunk.clone(),
                score: cosine_similarity(query_embedding, embedding),
            })
            .collect();

        // Stable sort: equal scores keep transcript order.
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(k);

        Ok(results)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
