//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the search command: retrieve chunks without generating an answer.
pub async fn run_search(video: &str, query: &str, k: Option<usize>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let k = k.unwrap_or(settings.retrieval.k);
    if k == 0 {
        anyhow::bail!("-k must be at least 1");
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Searching transcript...");
    let result = orchestrator.retrieve(video, query, k).await;
    spinner.finish_and_clear();

    match result {
        Ok(retrieval) => {
            Output::success(&format!(
                "Top {} of {} chunks for {}",
                retrieval.results.len(),
                retrieval.total_chunks,
                retrieval.video_id
            ));
            for (i, result) in retrieval.results.iter().enumerate() {
                Output::search_result(i + 1, result.chunk.order, result.score, &result.chunk.content);
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e.public_detail()));
            Err(e.into())
        }
    }
}
