//! Error types for tuberag.

use thiserror::Error;

/// Library-level error type for tuberag operations.
#[derive(Error, Debug)]
pub enum TubeRagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid video locator: {0}")]
    InvalidLocator(String),

    #[error("Transcript unavailable: {0}")]
    TranscriptUnavailable(String),

    #[error("Caption fetch failed: {0}")]
    Captions(String),

    #[error("Browser automation failed: {0}")]
    Browser(String),

    #[error("Chunking failed: {0}")]
    Chunking(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Similarity index error: {0}")]
    Index(String),

    #[error("Answer generation failed: {0}")]
    Answer(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for tuberag operations.
pub type Result<T> = std::result::Result<T, TubeRagError>;
