//! Caption tier: structured transcripts from YouTube's caption tracks.

use super::VideoId;
use crate::error::{Result, TubeRagError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};
use yt_transcript_rs::api::YouTubeTranscriptApi;

/// Caption segments for one language, in temporal order.
#[derive(Debug, Clone)]
pub struct CaptionTrack {
    /// Language code of the track that matched the preference list.
    pub language_code: String,
    /// Segment texts.
    pub segments: Vec<String>,
}

impl CaptionTrack {
    /// Concatenate segment texts with single spaces.
    pub fn text(&self) -> String {
        self.segments.join(" ")
    }
}

/// Source of structured caption tracks.
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Fetch the first available track from `languages` (ordered by preference).
    async fn fetch_captions(&self, video_id: &VideoId, languages: &[String]) -> Result<CaptionTrack>;
}

/// Caption source backed by YouTube's timedtext endpoints.
pub struct YoutubeCaptionSource {
    timeout: Duration,
}

impl YoutubeCaptionSource {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CaptionSource for YoutubeCaptionSource {
    #[instrument(skip(self, languages), fields(video_id = %video_id))]
    async fn fetch_captions(&self, video_id: &VideoId, languages: &[String]) -> Result<CaptionTrack> {
        let api = YouTubeTranscriptApi::new(None, None, None)
            .map_err(|e| TubeRagError::Captions(e.to_string()))?;
        let languages: Vec<&str> = languages.iter().map(String::as_str).collect();

        let fetched = tokio::time::timeout(
            self.timeout,
            api.fetch_transcript(video_id.as_str(), &languages, false),
        )
        .await
        .map_err(|_| TubeRagError::Timeout(self.timeout.as_secs()))?
        .map_err(|e| {
            let message = e.to_string();
            debug!("Caption API error: {}", message);
            TubeRagError::Captions(summarize_failure(&message).to_string())
        })?;

        debug!(
            "Fetched {} caption segments ({})",
            fetched.snippets.len(),
            fetched.language_code
        );

        Ok(CaptionTrack {
            language_code: fetched.language_code.clone(),
            segments: fetched.snippets.into_iter().map(|s| s.text).collect(),
        })
    }
}

/// Reduce a caption library error to a short reason that is safe to show users.
fn summarize_failure(message: &str) -> &'static str {
    let lower = message.to_lowercase();
    if lower.contains("disabled") {
        "transcripts are disabled for this video"
    } else if lower.contains("no transcripts were found") || lower.contains("no transcript found") {
        "no transcript in the requested languages"
    } else if lower.contains("unavailable") || lower.contains("unplayable") {
        "the video is unavailable"
    } else if lower.contains("too many requests") || lower.contains("blocked") {
        "caption requests are being blocked"
    } else {
        "caption service error"
    }
}
