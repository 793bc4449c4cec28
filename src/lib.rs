//! tuberag - question answering over YouTube transcripts
//!
//! Given a video URL (or bare ID) and a question, tuberag fetches the video's
//! transcript, splits it into overlapping chunks, embeds them into a per-request
//! in-memory index, retrieves the most relevant chunks and asks a language model
//! to answer from them alone.
//!
//! # Architecture
//!
//! - `transcript` - Video locators and two-tier transcript acquisition (captions, browser scrape)
//! - `chunking` - Overlapping character-budget chunking
//! - `embedding` - Embedding generation
//! - `vector_store` - Per-request similarity index
//! - `rag` - Context formatting and answer generation
//! - `orchestrator` - Pipeline coordination and error mapping
//! - `config` - Settings and prompt templates
//! - `cli` - Command line and HTTP front ends
//!
//! # Example
//!
//! ```rust,no_run
//! use tuberag::config::Settings;
//! use tuberag::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let outcome = orchestrator
//!         .ask("https://youtu.be/dQw4w9WgXcQ", "What is the song about?")
//!         .await?;
//!     println!("{}", outcome.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod transcript;
pub mod vector_store;

pub use error::{Result, TubeRagError};
