//! OpenAI-compatible client construction.
//!
//! The language model and the hosted embedder both talk to an OpenAI-compatible
//! endpoint. The base URL can point at any compatible provider (OpenAI, Groq, a local
//! gateway); the key is always read from `OPENAI_API_KEY`.

use crate::error::{Result, TubeRagError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Environment variable holding the provider API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Default timeout for model requests (2 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Create a client with an optional custom base URL and a request timeout.
pub fn create_client_with(api_base: Option<&str>, timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| TubeRagError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let mut config = OpenAIConfig::default();
    if let Some(base) = api_base.filter(|b| !b.is_empty()) {
        config = config.with_api_base(base);
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}
