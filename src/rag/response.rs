//! Answer generation with a chat-completion model.

use crate::config::{LlmSettings, Prompts};
use crate::error::{Result, TubeRagError};
use crate::openai::create_client_with;
use async_openai::types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// A text-in, text-out language model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send one user prompt and return the model's reply.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Chat model behind an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAIChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIChatModel {
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        Ok(Self {
            client: create_client_with(
                settings.api_base.as_deref(),
                Duration::from_secs(settings.timeout_secs),
            )?,
            model: settings.model.clone(),
            temperature: settings.temperature,
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAIChatModel {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| TubeRagError::Answer(e.to_string()))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![message.into()])
            .temperature(self.temperature)
            .build()
            .map_err(|e| TubeRagError::Answer(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| TubeRagError::OpenAI(format!("chat completion failed: {}", e)))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| TubeRagError::Answer("empty response from model".to_string()))
    }
}

/// Renders the answer prompt and asks the model.
pub struct AnswerGenerator {
    llm: Arc<dyn LanguageModel>,
    prompts: Prompts,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LanguageModel>, prompts: Prompts) -> Self {
        Self { llm, prompts }
    }

    /// Answer `question` from `context`. The prompt asks the model to reply with
    /// [`crate::config::FALLBACK_ANSWER`] when the context does not cover the question.
    #[instrument(skip(self, context), fields(context_len = context.len()))]
    pub async fn generate_answer(&self, context: &str, question: &str) -> Result<String> {
        let prompt = self.prompts.render_answer(context, question);
        debug!("Rendered prompt ({} chars)", prompt.len());

        let answer = self.llm.complete(&prompt).await?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(TubeRagError::Answer("model returned an empty answer".to_string()));
        }

        info!("Generated answer ({} chars)", answer.len());
        Ok(answer.to_string())
    }
}
