//! Configuration module for tuberag.
//!
//! Handles loading application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts, FALLBACK_ANSWER};
pub use settings::{
    ChunkingSettings, EmbeddingProvider, EmbeddingSettings, GeneralSettings, LlmSettings,
    PromptSettings, RetrievalSettings, ScraperSettings, ServerSettings, Settings,
    TranscriptSettings,
};
