//! Doctor command - verify credentials, browser and configuration.

use crate::cli::{preflight, Output};
use crate::config::{EmbeddingProvider, Settings};
use crate::openai::API_KEY_ENV;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks. Fails when any check is an error.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("tuberag Doctor");
    println!();

    let sections = [
        ("API Configuration", vec![check_api_key(std::env::var(API_KEY_ENV).ok())]),
        ("Browser Fallback", vec![check_browser(settings)]),
        (
            "Configuration",
            vec![check_config_file(config_path), check_settings(settings)],
        ),
    ];

    let mut errors = 0;
    let mut warnings = 0;
    for (title, checks) in &sections {
        println!("{}", style(title).bold());
        for check in checks {
            check.print();
            match check.status {
                CheckStatus::Error => errors += 1,
                CheckStatus::Warning => warnings += 1,
                CheckStatus::Ok => {}
            }
        }
        println!();
    }

    if errors > 0 {
        Output::error(&format!("{} error(s) found. Please fix them before using tuberag.", errors));
        anyhow::bail!("{} doctor check(s) failed", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! tuberag is ready to use.");
    }

    Ok(())
}

/// Check the provider API key without printing it.
fn check_api_key(key: Option<String>) -> CheckResult {
    match key {
        Some(key) if key.trim().is_empty() => {
            CheckResult::error(API_KEY_ENV, "empty", "Set with: export OPENAI_API_KEY='sk-...'")
        }
        Some(key) if key.chars().count() > 12 => {
            let chars: Vec<char> = key.chars().collect();
            let head: String = chars[..3].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            let masked = format!("{}...{}", head, tail);
            CheckResult::ok(API_KEY_ENV, &format!("configured ({})", masked))
        }
        Some(_) => CheckResult::warning(
            API_KEY_ENV,
            "set but looks too short",
            "Check that the full key was copied",
        ),
        None => CheckResult::error(
            API_KEY_ENV,
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...' (or add it to .env)",
        ),
    }
}

fn check_browser(settings: &Settings) -> CheckResult {
    if !settings.transcript.scraper.enabled {
        return CheckResult::ok("Chrome", "browser fallback disabled");
    }
    match preflight::find_chrome(settings) {
        Some(path) => CheckResult::ok("Chrome", &path.display().to_string()),
        None => CheckResult::warning(
            "Chrome",
            "not found",
            "Install Chrome/Chromium or set transcript.scraper.chrome_executable; \
             videos without captions will fail",
        ),
    }
}

fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &config_path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            &format!("Create {} to override defaults", config_path.display()),
        )
    }
}

fn check_settings(settings: &Settings) -> CheckResult {
    if let Err(e) = settings.validate() {
        return CheckResult::error("Settings", &e.to_string(), "Fix the value in your config or environment");
    }
    if settings.embedding.provider == EmbeddingProvider::FastEmbed && !cfg!(feature = "local-embeddings") {
        return CheckResult::error(
            "Settings",
            "embedding.provider is fastembed but local embeddings are not compiled in",
            "Rebuild with --features local-embeddings",
        );
    }
    CheckResult::ok(
        "Settings",
        &format!(
            "chunks {}/{} overlap, k={}, llm {}",
            settings.chunking.chunk_size, settings.chunking.chunk_overlap, settings.retrieval.k, settings.llm.model
        ),
    )
}
