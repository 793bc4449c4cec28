//! Prompt templates for tuberag.
//!
//! The default answer prompt can be replaced by placing a `rag.toml` file in the
//! custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Sentence the model is asked to return when the context does not cover the question.
pub const FALLBACK_ANSWER: &str = "I don't know based on the video content.";

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub rag: RagPrompts,
}

/// Prompts for answer generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    /// Template rendered with `{{context}}` and `{{question}}`.
    pub user: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            user: format!(
                r#"You are a helpful assistant.
Answer only from the provided context.
If the context is insufficient, just say "{FALLBACK_ANSWER}"

Context:
{{{{context}}}}

Question: {{{{question}}}}

Answer:"#
            ),
        }
    }
}

impl Prompts {
    /// Load prompts, overriding defaults from `custom_dir` when present.
    pub fn load(custom_dir: Option<&str>) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render the answer prompt for a context block and question.
    pub fn render_answer(&self, context: &str, question: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context.to_string());
        vars.insert("question".to_string(), question.to_string());
        Self::render(&self.rag.user, &vars)
    }
}
