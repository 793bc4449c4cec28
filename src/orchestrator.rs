//! Pipeline orchestrator for tuberag.
//!
//! Runs one question through locate, acquire, chunk and embed, index, retrieve and
//! synthesize. Every stage failure short-circuits the run and is mapped to a
//! [`PipelineError`] here, and only here.

use crate::chunking::{chunk_and_embed, ChunkingConfig};
use crate::config::{Prompts, Settings};
use crate::embedding::{create_embedder, Embedder};
use crate::error::{Result, TubeRagError};
use crate::rag::{format_context, AnswerGenerator, LanguageModel, OpenAIChatModel};
use crate::transcript::{Transcript, TranscriptFetcher, TranscriptService, TranscriptSource, VideoId};
use crate::vector_store::{MemoryIndex, SearchResult, SimilarityIndex};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

/// User-facing failure of a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid video locator: {0}")]
    InvalidLocator(String),

    #[error("question must not be empty")]
    EmptyQuestion,

    #[error("transcript unavailable: {0}")]
    TranscriptUnavailable(String),

    #[error("embedding failed: {0}")]
    EmbeddingFailure(String),

    #[error("answer generation failed: {0}")]
    AnswerGenerationFailure(String),

    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl PipelineError {
    /// HTTP status for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            PipelineError::InvalidLocator(_) => 400,
            PipelineError::EmptyQuestion => 422,
            PipelineError::TranscriptUnavailable(_) => 404,
            PipelineError::EmbeddingFailure(_)
            | PipelineError::AnswerGenerationFailure(_)
            | PipelineError::Unexpected(_) => 500,
        }
    }

    /// Message safe to show to callers. Internal failures get a fixed sentence.
    pub fn public_detail(&self) -> String {
        match self {
            PipelineError::InvalidLocator(input) => {
                format!("Invalid YouTube URL or video ID: {}", input)
            }
            PipelineError::EmptyQuestion => "Question must not be empty.".to_string(),
            PipelineError::TranscriptUnavailable(reason) => {
                format!("Transcript not available for this video ({}).", reason)
            }
            PipelineError::EmbeddingFailure(_) => {
                "Failed to process the video transcript.".to_string()
            }
            PipelineError::AnswerGenerationFailure(_) => "Failed to generate an answer.".to_string(),
            PipelineError::Unexpected(_) => "Internal server error.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Acquire,
    Embed,
    Index,
    Synthesize,
}

impl Stage {
    fn fail(self, err: TubeRagError) -> PipelineError {
        error!(stage = ?self, "Pipeline stage failed: {}", err);
        match (self, err) {
            (Stage::Acquire, TubeRagError::TranscriptUnavailable(reason)) => {
                PipelineError::TranscriptUnavailable(reason)
            }
            (Stage::Acquire, _) => {
                PipelineError::TranscriptUnavailable("transcript service error".to_string())
            }
            (Stage::Embed, e) => PipelineError::EmbeddingFailure(e.to_string()),
            (Stage::Index, e) => PipelineError::Unexpected(e.to_string()),
            (Stage::Synthesize, e) => PipelineError::AnswerGenerationFailure(e.to_string()),
        }
    }
}

/// Result of a successful question.
#[derive(Debug, Clone, Serialize)]
pub struct AskOutcome {
    pub video_id: VideoId,
    pub answer: String,
    /// Retrieved chunks the answer was conditioned on, best first.
    pub sources: Vec<SearchResult>,
    pub transcript_source: TranscriptSource,
}

/// Retrieved chunks for a query, without answer synthesis.
#[derive(Debug, Clone, Serialize)]
pub struct Retrieval {
    pub video_id: VideoId,
    pub results: Vec<SearchResult>,
    pub total_chunks: usize,
}

/// The main orchestrator for the tuberag pipeline.
///
/// Holds only immutable, shareable collaborators; concurrent runs never share
/// transcript, chunk or index state.
pub struct Orchestrator {
    settings: Settings,
    transcripts: Arc<dyn TranscriptFetcher>,
    embedder: Arc<dyn Embedder>,
    answerer: AnswerGenerator,
}

impl Orchestrator {
    /// Create an orchestrator wired to YouTube, headless Chrome and the configured models.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(settings.prompts.custom_dir.as_deref())?;
        let transcripts = Arc::new(TranscriptService::from_settings(&settings));
        let embedder = create_embedder(&settings.embedding, &settings.llm)?;
        let llm = Arc::new(OpenAIChatModel::new(&settings.llm)?);

        info!(
            "Pipeline ready (embedding: {} {}, llm: {})",
            settings.embedding.provider, settings.embedding.model, settings.llm.model
        );

        Ok(Self::with_components(settings, transcripts, embedder, llm, prompts))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        transcripts: Arc<dyn TranscriptFetcher>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LanguageModel>,
        prompts: Prompts,
    ) -> Self {
        Self {
            settings,
            transcripts,
            embedder,
            answerer: AnswerGenerator::new(llm, prompts),
        }
    }

    /// Answer `question` about the video at `locator`.
    pub async fn ask(&self, locator: &str, question: &str) -> std::result::Result<AskOutcome, PipelineError> {
        let video_id = parse_locator(locator)?;
        let question = question.trim();
        if question.is_empty() {
            return Err(PipelineError::EmptyQuestion);
        }

        let span = info_span!("ask", request_id = %Uuid::new_v4(), video_id = %video_id);
        async {
            info!("Question received ({} chars)", question.len());

            let (transcript, results, _) = self
                .retrieve_for(&video_id, question, self.settings.retrieval.k)
                .await?;

            let context = format_context(&results);
            let answer = self
                .answerer
                .generate_answer(&context, question)
                .await
                .map_err(|e| Stage::Synthesize.fail(e))?;

            info!("Pipeline finished");
            Ok::<_, PipelineError>(AskOutcome {
                video_id: video_id.clone(),
                answer,
                sources: results,
                transcript_source: transcript.source,
            })
        }
        .instrument(span)
        .await
    }

    /// Retrieve the `k` chunks most similar to `query`.
    pub async fn retrieve(
        &self,
        locator: &str,
        query: &str,
        k: usize,
    ) -> std::result::Result<Retrieval, PipelineError> {
        let video_id = parse_locator(locator)?;
        if query.trim().is_empty() {
            return Err(PipelineError::EmptyQuestion);
        }

        let span = info_span!("retrieve", request_id = %Uuid::new_v4(), video_id = %video_id);
        async {
            let (_, results, total_chunks) = self.retrieve_for(&video_id, query.trim(), k).await?;
            Ok::<_, PipelineError>(Retrieval {
                video_id: video_id.clone(),
                results,
                total_chunks,
            })
        }
        .instrument(span)
        .await
    }

    /// Acquire the transcript only.
    pub async fn fetch_transcript(&self, locator: &str) -> std::result::Result<Transcript, PipelineError> {
        let video_id = parse_locator(locator)?;
        let span = info_span!("transcript", request_id = %Uuid::new_v4(), video_id = %video_id);
        self.acquire(&video_id).instrument(span).await
    }

    async fn acquire(&self, video_id: &VideoId) -> std::result::Result<Transcript, PipelineError> {
        self.transcripts
            .fetch_transcript(video_id, &self.settings.transcript.languages)
            .await
            .map_err(|e| Stage::Acquire.fail(e))
    }

    async fn retrieve_for(
        &self,
        video_id: &VideoId,
        query: &str,
        k: usize,
    ) -> std::result::Result<(Transcript, Vec<SearchResult>, usize), PipelineError> {
        let transcript = self.acquire(video_id).await?;
        info!("Transcript acquired from {} ({} chars)", transcript.source, transcript.text.len());

        let pairs = chunk_and_embed(
            &transcript.text,
            &ChunkingConfig::from(&self.settings.chunking),
            self.embedder.as_ref(),
        )
        .await
        .map_err(|e| Stage::Embed.fail(e))?;

        let index = MemoryIndex::build(pairs).map_err(|e| Stage::Index.fail(e))?;
        info!("Indexed {} chunks", index.len());

        let query_embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| Stage::Embed.fail(e))?;

        let results = index
            .search(&query_embedding, k)
            .await
            .map_err(|e| Stage::Index.fail(e))?;

        Ok((transcript, results, index.len()))
    }
}

fn parse_locator(locator: &str) -> std::result::Result<VideoId, PipelineError> {
    VideoId::extract(locator).ok_or_else(|| PipelineError::InvalidLocator(locator.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FALLBACK_ANSWER;
    use crate::embedding::tests::KeywordEmbedder;
    use crate::rag::ScriptedModel;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TRANSCRIPT: &str = "Welcome back to the channel. Today we are talking about the Rust language.\n\n\
        Ownership means every value has a single owner. When the owner goes out of scope the value is dropped.\n\n\
        Borrowing lets you reference a value without taking ownership. References must never outlive the owner.\n\n\
        Lifetimes are how the compiler checks that references stay valid for as long as they are used.\n\n\
        Thanks for watching, remember to like and subscribe for more systems programming videos.";

    /// Fetcher returning a fixed transcript, counting calls.
    struct FixedTranscripts {
        text: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl FixedTranscripts {
        fn with(text: &'static str) -> Arc<Self> {
            Arc::new(Self {
                text: Some(text),
                calls: AtomicUsize::new(0),
            })
        }

        fn unavailable() -> Arc<Self> {
            Arc::new(Self {
                text: None,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TranscriptFetcher for FixedTranscripts {
        async fn fetch_transcript(&self, video_id: &VideoId, _languages: &[String]) -> Result<Transcript> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.text {
                Some(text) => Ok(Transcript {
                    video_id: video_id.clone(),
                    text: text.to_string(),
                    source: TranscriptSource::Captions,
                    language_code: Some("en".to_string()),
                }),
                None => Err(TubeRagError::TranscriptUnavailable(
                    "transcripts are disabled for this video; browser fallback failed".to_string(),
                )),
            }
        }
    }

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.chunking.chunk_size = 160;
        settings.chunking.chunk_overlap = 30;
        settings.retrieval.k = 2;
        settings
    }

    fn orchestrator(
        transcripts: Arc<FixedTranscripts>,
        embedder: Arc<KeywordEmbedder>,
        llm: Arc<ScriptedModel>,
    ) -> Orchestrator {
        Orchestrator::with_components(settings(), transcripts, embedder, llm, Prompts::default())
    }

    #[tokio::test]
    async fn test_ask_answers_from_retrieved_chunks() {
        let llm = Arc::new(ScriptedModel::replying("Every value has a single owner."));
        let orch = orchestrator(
            FixedTranscripts::with(TRANSCRIPT),
            Arc::new(KeywordEmbedder::default()),
            llm.clone(),
        );

        let outcome = orch
            .ask("https://youtu.be/dQw4w9WgXcQ?t=42", "What does ownership mean for a value?")
            .await
            .unwrap();

        assert_eq!(outcome.video_id.as_str(), "dQw4w9WgXcQ");
        assert_eq!(outcome.answer, "Every value has a single owner.");
        assert!(!outcome.sources.is_empty() && outcome.sources.len() <= 2);
        for source in &outcome.sources {
            assert!(TRANSCRIPT.contains(&source.chunk.content));
        }
        assert!(outcome
            .sources
            .iter()
            .any(|s| s.chunk.content.contains("single owner")));

        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains(&outcome.sources[0].chunk.content));
    }

    #[tokio::test]
    async fn test_fallback_answer_passes_through() {
        let orch = orchestrator(
            FixedTranscripts::with(TRANSCRIPT),
            Arc::new(KeywordEmbedder::default()),
            Arc::new(ScriptedModel::replying(FALLBACK_ANSWER)),
        );
        let outcome = orch.ask("dQw4w9WgXcQ", "What is the capital of France?").await.unwrap();
        assert_eq!(outcome.answer, FALLBACK_ANSWER);
    }

    #[tokio::test]
    async fn test_invalid_locator_skips_acquisition() {
        let transcripts = FixedTranscripts::with(TRANSCRIPT);
        let orch = orchestrator(
            transcripts.clone(),
            Arc::new(KeywordEmbedder::default()),
            Arc::new(ScriptedModel::replying("unused")),
        );

        for bad in ["not a url", "https://example.com/watch?v=dQw4w9WgXcQ", "abc123"] {
            let err = orch.ask(bad, "question").await.unwrap_err();
            assert!(matches!(err, PipelineError::InvalidLocator(_)));
            assert_eq!(err.status_code(), 400);
        }
        assert_eq!(transcripts.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_question_skips_acquisition() {
        let transcripts = FixedTranscripts::with(TRANSCRIPT);
        let orch = orchestrator(
            transcripts.clone(),
            Arc::new(KeywordEmbedder::default()),
            Arc::new(ScriptedModel::replying("unused")),
        );

        let err = orch.ask("dQw4w9WgXcQ", "   ").await.unwrap_err();
        assert!(matches!(err, PipelineError::EmptyQuestion));
        assert_eq!(err.status_code(), 422);
        assert_eq!(transcripts.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unavailable_transcript_is_not_found() {
        let embedder = Arc::new(KeywordEmbedder::default());
        let llm = Arc::new(ScriptedModel::replying("unused"));
        let orch = orchestrator(FixedTranscripts::unavailable(), embedder.clone(), llm.clone());

        let err = orch.ask("dQw4w9WgXcQ", "What is this about?").await.unwrap_err();

        assert_eq!(err.status_code(), 404);
        assert!(err.public_detail().contains("transcripts are disabled"));
        assert_eq!(embedder.batch_calls(), 0);
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_embedding_failure_is_internal_and_generic() {
        let llm = Arc::new(ScriptedModel::replying("unused"));
        let orch = orchestrator(
            FixedTranscripts::with(TRANSCRIPT),
            Arc::new(KeywordEmbedder::failing()),
            llm.clone(),
        );

        let err = orch.ask("dQw4w9WgXcQ", "What is ownership?").await.unwrap_err();

        assert!(matches!(err, PipelineError::EmbeddingFailure(_)));
        assert_eq!(err.status_code(), 500);
        assert!(!err.public_detail().contains("backend offline"));
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_model_failure_does_not_leak_details() {
        let orch = orchestrator(
            FixedTranscripts::with(TRANSCRIPT),
            Arc::new(KeywordEmbedder::default()),
            Arc::new(ScriptedModel::failing("401 invalid key sk-secret")),
        );

        let err = orch.ask("dQw4w9WgXcQ", "What is ownership?").await.unwrap_err();

        assert!(matches!(err, PipelineError::AnswerGenerationFailure(_)));
        assert_eq!(err.status_code(), 500);
        assert!(!err.public_detail().contains("sk-secret"));
    }

    #[tokio::test]
    async fn test_retrieve_is_deterministic_and_bounded() {
        let orch = orchestrator(
            FixedTranscripts::with(TRANSCRIPT),
            Arc::new(KeywordEmbedder::default()),
            Arc::new(ScriptedModel::replying("unused")),
        );

        let first = orch.retrieve("dQw4w9WgXcQ", "borrowing references", 3).await.unwrap();
        let second = orch.retrieve("dQw4w9WgXcQ", "borrowing references", 3).await.unwrap();

        assert!(first.results.len() <= 3);
        assert!(first.total_chunks > 1);
        let orders = |r: &Retrieval| r.results.iter().map(|s| s.chunk.order).collect::<Vec<_>>();
        assert_eq!(orders(&first), orders(&second));
        assert!(first.results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn test_fetch_transcript_maps_errors() {
        let orch = orchestrator(
            FixedTranscripts::unavailable(),
            Arc::new(KeywordEmbedder::default()),
            Arc::new(ScriptedModel::replying("unused")),
        );
        let err = orch.fetch_transcript("dQw4w9WgXcQ").await.unwrap_err();
        assert!(matches!(err, PipelineError::TranscriptUnavailable(_)));
    }
}
