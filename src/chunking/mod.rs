//! Transcript chunking.
//!
//! Splits transcript text into overlapping passages no longer than a character budget,
//! preferring paragraph, then sentence, then word, then character boundaries.

use crate::embedding::Embedder;
use crate::error::{Result, TubeRagError};
use serde::Serialize;
use text_splitter::{ChunkConfig, TextSplitter};
use tracing::{debug, instrument};

/// A contiguous passage of the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// Position of this chunk in the transcript (0-based).
    pub order: usize,
    /// Byte offset of the chunk start within the transcript.
    pub start: usize,
    /// Chunk text, an exact substring of the transcript.
    pub content: String,
}

impl Chunk {
    /// Byte offset one past the chunk end.
    pub fn end(&self) -> usize {
        self.start + self.content.len()
    }
}

/// Configuration for chunking.
#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters of context shared by consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl From<&crate::config::ChunkingSettings> for ChunkingConfig {
    fn from(settings: &crate::config::ChunkingSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
        }
    }
}

/// Split `text` into overlapping chunks.
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Result<Vec<Chunk>> {
    let chunk_config = ChunkConfig::new(config.chunk_size)
        .with_overlap(config.chunk_overlap)
        .map_err(|e| TubeRagError::Chunking(e.to_string()))?
        .with_trim(false);

    let splitter = TextSplitter::new(chunk_config);

    let chunks: Vec<Chunk> = splitter
        .chunk_indices(text)
        .enumerate()
        .map(|(order, (start, content))| Chunk {
            order,
            start,
            content: content.to_string(),
        })
        .collect();

    debug!("Split {} chars into {} chunks", text.len(), chunks.len());
    Ok(chunks)
}

/// Split `text` and embed every chunk with one batch call.
///
/// The same `embedder` must later embed the query; vectors from different models
/// are not comparable.
#[instrument(skip(text, embedder), fields(text_len = text.len()))]
pub async fn chunk_and_embed(
    text: &str,
    config: &ChunkingConfig,
    embedder: &dyn Embedder,
) -> Result<Vec<(Chunk, Vec<f32>)>> {
    let chunks = chunk_text(text, config)?;
    if chunks.is_empty() {
        return Ok(Vec::new());
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let embeddings = embedder.embed_batch(&texts).await?;

    if embeddings.len() != chunks.len() {
        return Err(TubeRagError::Embedding(format!(
            "expected {} embeddings, got {}",
            chunks.len(),
            embeddings.len()
        )));
    }

    Ok(chunks.into_iter().zip(embeddings).collect())
}
