//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(video: &str, question: &str, show_sources: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'tuberag doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Fetching transcript and thinking...");
    let result = orchestrator.ask(video, question).await;
    spinner.finish_and_clear();

    match result {
        Ok(outcome) => {
            println!("\n{}\n", outcome.answer);

            if show_sources && !outcome.sources.is_empty() {
                Output::header(&format!("Sources ({}, via {})", outcome.video_id, outcome.transcript_source));
                for (i, source) in outcome.sources.iter().enumerate() {
                    Output::search_result(i + 1, source.chunk.order, source.score, &source.chunk.content);
                }
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&e.public_detail());
            Err(e.into())
        }
    }
}
