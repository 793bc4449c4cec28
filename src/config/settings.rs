//! Configuration settings for tuberag.

use crate::error::{Result, TubeRagError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub transcript: TranscriptSettings,
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub llm: LlmSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Transcript acquisition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    /// Caption languages in order of preference.
    pub languages: Vec<String>,
    /// Minimum trimmed transcript length accepted from either source.
    pub min_chars: usize,
    /// Timeout for the caption API call.
    pub api_timeout_secs: u64,
    /// Browser fallback settings.
    pub scraper: ScraperSettings,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string(), "hi".to_string(), "ur".to_string()],
            min_chars: 200,
            api_timeout_secs: 30,
            scraper: ScraperSettings::default(),
        }
    }
}

/// Headless-browser fallback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperSettings {
    /// Enable the browser fallback.
    pub enabled: bool,
    /// Transcript extraction page driven by the browser.
    pub page_url: String,
    /// Maximum wait for the completion signal, in seconds.
    pub wait_timeout_secs: u64,
    /// Pause after the completion signal so the page can finish rendering.
    pub render_delay_ms: u64,
    /// Path to a Chrome/Chromium binary. Auto-detected when unset.
    pub chrome_executable: Option<String>,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            page_url: "https://tactiq.io/tools/youtube-transcript".to_string(),
            wait_timeout_secs: 30,
            render_delay_ms: 3000,
            chrome_executable: None,
        }
    }
}

/// Text chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Embedding provider type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Hosted OpenAI-compatible embeddings.
    #[default]
    OpenAI,
    /// Local fastembed model (requires the `local-embeddings` feature).
    FastEmbed,
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(EmbeddingProvider::OpenAI),
            "fastembed" | "local" => Ok(EmbeddingProvider::FastEmbed),
            _ => Err(format!("Unknown embedding provider: {}", s)),
        }
    }
}

impl std::fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProvider::OpenAI => write!(f, "openai"),
            EmbeddingProvider::FastEmbed => write!(f, "fastembed"),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    /// Embedding model identifier.
    pub model: String,
    /// Embedding dimensions (hosted provider only).
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::OpenAI,
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of chunks handed to the language model.
    pub k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { k: 3 }
    }
}

/// Language model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Chat model identifier.
    pub model: String,
    /// OpenAI-compatible base URL. Defaults to the OpenAI API.
    pub api_base: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            api_base: None,
            timeout_secs: 120,
            temperature: 0.0,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory holding a `rag.toml` that overrides the default prompt.
    pub custom_dir: Option<String>,
}

impl Settings {
    /// Load settings from the default configuration file, then apply environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Apply `TUBERAG_*` overrides. `lookup` abstracts the environment for testing.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("TUBERAG_CHUNK_SIZE") {
            self.chunking.chunk_size = parse_env("TUBERAG_CHUNK_SIZE", &v)?;
        }
        if let Some(v) = lookup("TUBERAG_CHUNK_OVERLAP") {
            self.chunking.chunk_overlap = parse_env("TUBERAG_CHUNK_OVERLAP", &v)?;
        }
        if let Some(v) = lookup("TUBERAG_RETRIEVAL_K") {
            self.retrieval.k = parse_env("TUBERAG_RETRIEVAL_K", &v)?;
        }
        if let Some(v) = lookup("TUBERAG_EMBEDDING_PROVIDER") {
            self.embedding.provider = v.parse().map_err(TubeRagError::Config)?;
        }
        if let Some(v) = lookup("TUBERAG_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Some(v) = lookup("TUBERAG_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = lookup("TUBERAG_LLM_API_BASE") {
            self.llm.api_base = Some(v);
        }
        if let Some(v) = lookup("TUBERAG_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("TUBERAG_PORT") {
            self.server.port = parse_env("TUBERAG_PORT", &v)?;
        }
        Ok(())
    }

    /// Check values that would otherwise fail midway through a request.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(TubeRagError::Config("chunking.chunk_size must be positive".to_string()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(TubeRagError::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.k == 0 {
            return Err(TubeRagError::Config("retrieval.k must be at least 1".to_string()));
        }
        if self.transcript.languages.is_empty() {
            return Err(TubeRagError::Config(
                "transcript.languages must name at least one language".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tuberag")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Expanded Chrome binary path, if configured.
    pub fn chrome_executable(&self) -> Option<PathBuf> {
        self.transcript
            .scraper
            .chrome_executable
            .as_deref()
            .map(Self::expand_path)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| TubeRagError::Config(format!("{} has an invalid value: {:?}", key, value)))
}
