//! Transcript command - fetch and print a video's transcript.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::transcript::{Transcript, TranscriptFetcher, TranscriptService, VideoId};
use anyhow::Result;

/// Run the transcript command.
pub async fn run_transcript(video: &str, output: Option<String>, json: bool, settings: Settings) -> Result<()> {
    preflight::check(Operation::Transcript, &settings)?;

    let video_id = VideoId::parse(video)?;
    let service = TranscriptService::from_settings(&settings);

    let spinner = Output::spinner(&format!("Fetching transcript for {}...", video_id));
    let result = service
        .fetch_transcript(&video_id, &settings.transcript.languages)
        .await;
    spinner.finish_and_clear();

    let transcript = match result {
        Ok(t) => t,
        Err(e) => {
            Output::error(&format!("{}", e));
            return Err(e.into());
        }
    };

    let rendered = render(&transcript, json)?;

    match output {
        Some(path) => {
            let path = Settings::expand_path(&path);
            std::fs::write(&path, rendered)?;
            Output::success(&format!(
                "Wrote {} characters ({}) to {}",
                transcript.text.chars().count(),
                transcript.source,
                path.display()
            ));
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

fn render(transcript: &Transcript, json: bool) -> Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(transcript)?)
    } else {
        Ok(transcript.text.clone())
    }
}
