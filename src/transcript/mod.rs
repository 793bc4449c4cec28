//! Transcript acquisition.
//!
//! Transcripts come from YouTube's caption tracks when possible. When captions are
//! missing, disabled, or too short, a headless browser scrapes a third-party
//! transcript page instead. Each tier is tried exactly once.

mod browser;
mod captions;
mod locator;
mod scraper;

pub use browser::{BrowserLauncher, BrowserSession, ChromeLauncher};
pub use captions::{CaptionSource, CaptionTrack, YoutubeCaptionSource};
pub use locator::VideoId;
pub use scraper::{ScraperConfig, TranscriptScraper};

use crate::config::Settings;
use crate::error::{Result, TubeRagError};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

/// Which tier produced a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptSource {
    Captions,
    Scraper,
}

impl std::fmt::Display for TranscriptSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscriptSource::Captions => write!(f, "captions"),
            TranscriptSource::Scraper => write!(f, "scraper"),
        }
    }
}

/// Full transcript text for one video.
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub video_id: VideoId,
    /// Spoken text in temporal order. Never empty.
    pub text: String,
    pub source: TranscriptSource,
    /// Caption language, when the caption tier produced the text.
    pub language_code: Option<String>,
}

/// Anything that can turn a video ID into a transcript.
#[async_trait]
pub trait TranscriptFetcher: Send + Sync {
    /// Fetch a transcript, trying `languages` in order.
    ///
    /// Fails with [`TubeRagError::TranscriptUnavailable`] when no source yields usable text.
    async fn fetch_transcript(&self, video_id: &VideoId, languages: &[String]) -> Result<Transcript>;
}

/// Two-tier transcript acquisition: captions first, browser scrape second.
pub struct TranscriptService {
    captions: Arc<dyn CaptionSource>,
    scraper: Option<TranscriptScraper>,
    min_chars: usize,
}

impl TranscriptService {
    pub fn new(
        captions: Arc<dyn CaptionSource>,
        scraper: Option<TranscriptScraper>,
        min_chars: usize,
    ) -> Self {
        Self {
            captions,
            scraper,
            min_chars,
        }
    }

    /// Build the service from settings, using YouTube captions and headless Chrome.
    pub fn from_settings(settings: &Settings) -> Self {
        let transcript = &settings.transcript;

        let captions = Arc::new(YoutubeCaptionSource::new(Duration::from_secs(
            transcript.api_timeout_secs,
        )));

        let scraper = transcript.scraper.enabled.then(|| {
            TranscriptScraper::new(
                Arc::new(ChromeLauncher::new(settings.chrome_executable())),
                ScraperConfig::from(&transcript.scraper),
            )
        });

        Self::new(captions, scraper, transcript.min_chars)
    }

    fn is_usable(&self, text: &str) -> bool {
        let len = text.trim().chars().count();
        len > self.min_chars
    }
}

#[async_trait]
impl TranscriptFetcher for TranscriptService {
    #[instrument(skip(self, languages), fields(video_id = %video_id))]
    async fn fetch_transcript(&self, video_id: &VideoId, languages: &[String]) -> Result<Transcript> {
        info!("Fetching captions ({})", languages.join(", "));

        let caption_failure = match self.captions.fetch_captions(video_id, languages).await {
            Ok(track) => {
                let text = track.text();
                if self.is_usable(&text) {
                    info!("Transcript fetched from captions ({} chars)", text.len());
                    return Ok(Transcript {
                        video_id: video_id.clone(),
                        text: text.trim().to_string(),
                        source: TranscriptSource::Captions,
                        language_code: Some(track.language_code),
                    });
                }
                warn!(
                    "Caption track ({}) too short: {} chars",
                    track.language_code,
                    text.trim().chars().count()
                );
                "caption track is too short".to_string()
            }
            Err(TubeRagError::Captions(reason)) => {
                warn!("Caption fetch failed: {}", reason);
                reason
            }
            Err(e) => {
                warn!("Caption fetch failed: {}", e);
                "caption service error".to_string()
            }
        };

        let scraper_failure = match &self.scraper {
            None => "browser fallback is disabled",
            Some(scraper) => {
                info!("Falling back to browser scraper");
                match scraper.scrape(video_id).await {
                    Ok(text) if self.is_usable(&text) => {
                        info!("Transcript fetched by scraper ({} chars)", text.len());
                        return Ok(Transcript {
                            video_id: video_id.clone(),
                            text: text.trim().to_string(),
                            source: TranscriptSource::Scraper,
                            language_code: None,
                        });
                    }
                    Ok(text) => {
                        warn!(
                            "Scraper returned insufficient text ({} chars)",
                            text.trim().chars().count()
                        );
                        "browser fallback returned too little text"
                    }
                    Err(e) => {
                        warn!("Scraper failed: {}", e);
                        "browser fallback failed"
                    }
                }
            }
        };

        error!("Transcript unavailable: {}; {}", caption_failure, scraper_failure);
        Err(TubeRagError::TranscriptUnavailable(format!(
            "{}; {}",
            caption_failure, scraper_failure
        )))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::scraper::tests::{fast_config, FakeLauncher, FakePage};
    use super::*;

    /// Caption source returning a fixed result.
    pub(crate) struct FakeCaptions {
        pub result: std::result::Result<Vec<String>, String>,
    }

    #[async_trait]
    impl CaptionSource for FakeCaptions {
        async fn fetch_captions(&self, _video_id: &VideoId, languages: &[String]) -> Result<CaptionTrack> {
            match &self.result {
                Ok(segments) => Ok(CaptionTrack {
                    language_code: languages[0].clone(),
                    segments: segments.clone(),
                }),
                Err(reason) => Err(TubeRagError::Captions(reason.clone())),
            }
        }
    }

    fn languages() -> Vec<String> {
        vec!["en".to_string(), "hi".to_string()]
    }

    fn video() -> VideoId {
        VideoId::parse("dQw4w9WgXcQ").unwrap()
    }

    fn long_segments() -> Vec<String> {
        (0..40).map(|i| format!("segment {} of the talk", i)).collect()
    }

    fn service(captions: FakeCaptions, launcher: Option<Arc<FakeLauncher>>) -> TranscriptService {
        let scraper = launcher.map(|l| TranscriptScraper::new(l, fast_config()));
        TranscriptService::new(Arc::new(captions), scraper, 200)
    }

    #[tokio::test]
    async fn test_captions_win_without_launching_browser() {
        let launcher = Arc::new(FakeLauncher::new(FakePage::default()));
        let svc = service(
            FakeCaptions {
                result: Ok(long_segments()),
            },
            Some(launcher.clone()),
        );

        let transcript = svc.fetch_transcript(&video(), &languages()).await.unwrap();

        assert_eq!(transcript.source, TranscriptSource::Captions);
        assert_eq!(transcript.language_code.as_deref(), Some("en"));
        assert!(transcript.text.starts_with("segment 0 of the talk segment 1"));
        assert_eq!(launcher.launched.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_short_captions_fall_through_to_scraper() {
        let launcher = Arc::new(FakeLauncher::new(FakePage {
            lines: long_segments(),
            ..Default::default()
        }));
        let svc = service(
            FakeCaptions {
                result: Ok(vec!["hi".to_string()]),
            },
            Some(launcher.clone()),
        );

        let transcript = svc.fetch_transcript(&video(), &languages()).await.unwrap();

        assert_eq!(transcript.source, TranscriptSource::Scraper);
        assert_eq!(transcript.text.lines().count(), 40);
        assert_eq!(launcher.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_both_tiers_short_is_unavailable_and_browser_released() {
        let launcher = Arc::new(FakeLauncher::new(FakePage {
            lines: vec![],
            anchor_text: Some("00:00 Transcript header only".to_string()),
            ..Default::default()
        }));
        let svc = service(
            FakeCaptions {
                result: Err("transcripts are disabled for this video".to_string()),
            },
            Some(launcher.clone()),
        );

        let err = svc.fetch_transcript(&video(), &languages()).await.unwrap_err();

        match err {
            TubeRagError::TranscriptUnavailable(reason) => {
                assert!(reason.contains("transcripts are disabled"));
                assert!(reason.contains("too little text"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(launcher.launched.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(launcher.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_launch_failure_is_unavailable() {
        let launcher = Arc::new(FakeLauncher::new(FakePage {
            launch_fails: true,
            ..Default::default()
        }));
        let svc = service(
            FakeCaptions {
                result: Err("caption service error".to_string()),
            },
            Some(launcher.clone()),
        );

        let err = svc.fetch_transcript(&video(), &languages()).await.unwrap_err();
        assert!(matches!(err, TubeRagError::TranscriptUnavailable(ref r) if r.contains("browser fallback failed")));
        assert_eq!(launcher.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_disabled_scraper() {
        let svc = service(
            FakeCaptions {
                result: Err("no transcript in the requested languages".to_string()),
            },
            None,
        );

        let err = svc.fetch_transcript(&video(), &languages()).await.unwrap_err();
        assert!(matches!(err, TubeRagError::TranscriptUnavailable(ref r) if r.contains("disabled")));
    }

    #[tokio::test]
    async fn test_min_chars_is_exclusive() {
        let at_limit = service(
            FakeCaptions {
                result: Ok(vec!["a".repeat(200)]),
            },
            None,
        );
        let err = at_limit.fetch_transcript(&video(), &languages()).await.unwrap_err();
        assert!(matches!(err, TubeRagError::TranscriptUnavailable(_)));

        let above_limit = service(
            FakeCaptions {
                result: Ok(vec!["a".repeat(201)]),
            },
            None,
        );
        let transcript = above_limit.fetch_transcript(&video(), &languages()).await.unwrap();
        assert_eq!(transcript.source, TranscriptSource::Captions);
    }
}
