//! Pre-flight checks before running the pipeline.
//!
//! Validates that required credentials and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::{EmbeddingProvider, Settings};
use crate::error::{Result, TubeRagError};
use crate::openai::API_KEY_ENV;
use std::path::PathBuf;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Serving requires the API key and a valid configuration.
    Serve,
    /// Asking requires the API key.
    Ask,
    /// Search needs the API key only for hosted embeddings.
    Search,
    /// Fetching a transcript has no credential requirements.
    Transcript,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    check_with(operation, settings, |k| std::env::var(k).ok())
}

fn check_with<F>(operation: Operation, settings: &Settings, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    settings.validate()?;

    match operation {
        Operation::Serve | Operation::Ask => check_api_key(&lookup)?,
        Operation::Search => {
            if settings.embedding.provider == EmbeddingProvider::OpenAI {
                check_api_key(&lookup)?;
            }
        }
        Operation::Transcript => {}
    }
    Ok(())
}

fn check_api_key<F>(lookup: &F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(API_KEY_ENV) {
        Some(key) if !key.trim().is_empty() => Ok(()),
        Some(_) => Err(TubeRagError::Config(format!(
            "{} is empty. Set it with: export {}='sk-...'",
            API_KEY_ENV, API_KEY_ENV
        ))),
        None => Err(TubeRagError::Config(format!(
            "{} not set. Set it with: export {}='sk-...'",
            API_KEY_ENV, API_KEY_ENV
        ))),
    }
}

/// Locate a Chrome or Chromium binary: the configured path first, then `PATH`.
pub fn find_chrome(settings: &Settings) -> Option<PathBuf> {
    if let Some(path) = settings.chrome_executable() {
        return path.exists().then_some(path);
    }

    const CANDIDATES: &[&str] = &[
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
        "chrome",
    ];

    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        for name in CANDIDATES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }

    let mac = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
    mac.exists().then_some(mac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_has_no_credential_requirements() {
        assert!(check_with(Operation::Transcript, &Settings::default(), |_| None).is_ok());
    }

    #[test]
    fn test_ask_and_serve_require_api_key() {
        let settings = Settings::default();
        for op in [Operation::Ask, Operation::Serve] {
            assert!(matches!(
                check_with(op, &settings, |_| None),
                Err(TubeRagError::Config(_))
            ));
            assert!(check_with(op, &settings, |_| Some("  ".to_string())).is_err());
            assert!(check_with(op, &settings, |_| Some("sk-test".to_string())).is_ok());
        }
    }

    #[test]
    fn test_search_with_local_embeddings_needs_no_key() {
        let mut settings = Settings::default();
        settings.embedding.provider = EmbeddingProvider::FastEmbed;
        assert!(check_with(Operation::Search, &settings, |_| None).is_ok());
    }

    #[test]
    fn test_invalid_settings_fail_preflight() {
        let mut settings = Settings::default();
        settings.retrieval.k = 0;
        assert!(check_with(Operation::Transcript, &settings, |_| None).is_err());
    }

    #[test]
    fn test_configured_chrome_must_exist() {
        let mut settings = Settings::default();
        settings.transcript.scraper.chrome_executable = Some("/definitely/not/chrome".to_string());
        assert!(find_chrome(&settings).is_none());
    }
}
