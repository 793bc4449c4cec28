//! Scraper tier: extracts a transcript through a third-party transcript page.

use super::browser::{BrowserLauncher, BrowserSession};
use super::VideoId;
use crate::config::ScraperSettings;
use crate::error::{Result, TubeRagError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const INPUT_SELECTOR: &str = "#yt-2";
const SUBMIT_SELECTOR: &str = "input[value='Get Video Transcript']";
const DONE_SELECTOR: &str = "#copy";
const LINE_SELECTOR: &str = "[data-astro-cid-puhxsgk4]";

/// Fewer line elements than this means the page layout changed; use the anchor instead.
const MIN_LINE_ELEMENTS: usize = 5;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Parent text of the first node whose text contains the `00:00` timestamp.
const TIMESTAMP_ANCHOR_SCRIPT: &str = r#"(() => {
    const hit = document.evaluate("//*[contains(text(), '00:00')]", document, null,
        XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue;
    return hit && hit.parentElement ? hit.parentElement.innerText : null;
})()"#;

/// Timing and target for the scraper.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub page_url: String,
    pub wait_timeout: Duration,
    pub render_delay: Duration,
}

impl From<&ScraperSettings> for ScraperConfig {
    fn from(settings: &ScraperSettings) -> Self {
        Self {
            page_url: settings.page_url.clone(),
            wait_timeout: Duration::from_secs(settings.wait_timeout_secs),
            render_delay: Duration::from_millis(settings.render_delay_ms),
        }
    }
}

/// Drives a headless browser through the transcript extraction page.
pub struct TranscriptScraper {
    launcher: Arc<dyn BrowserLauncher>,
    config: ScraperConfig,
}

impl TranscriptScraper {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, config: ScraperConfig) -> Self {
        Self { launcher, config }
    }

    /// Scrape the transcript for `video_id`. The browser is closed before returning,
    /// whatever the outcome.
    #[instrument(skip(self), fields(video_id = %video_id))]
    pub async fn scrape(&self, video_id: &VideoId) -> Result<String> {
        let mut session = self.launcher.launch().await?;

        let outcome = self.drive(session.as_mut(), &video_id.watch_url()).await;

        if let Err(e) = session.close().await {
            warn!("Browser shutdown reported an error: {}", e);
        }

        let text = outcome?;
        info!("Scraper extracted {} characters", text.chars().count());
        Ok(text)
    }

    async fn drive(&self, session: &mut dyn BrowserSession, video_url: &str) -> Result<String> {
        session.open(&self.config.page_url).await?;

        wait_for(session, INPUT_SELECTOR, self.config.wait_timeout).await?;
        session.type_into(INPUT_SELECTOR, video_url).await?;
        debug!("Video URL entered");

        session.click(SUBMIT_SELECTOR).await?;
        debug!("Transcript request submitted");

        wait_for(session, DONE_SELECTOR, self.config.wait_timeout).await?;
        tokio::time::sleep(self.config.render_delay).await;

        let lines = session.texts(LINE_SELECTOR).await?;
        if let Some(text) = join_transcript_lines(&lines) {
            return Ok(text);
        }

        debug!("Only {} line elements found, trying timestamp anchor", lines.len());
        match session.evaluate_string(TIMESTAMP_ANCHOR_SCRIPT).await? {
            Some(text) => Ok(text.trim().to_string()),
            None => {
                warn!("No timestamp anchor found on transcript page");
                Ok(String::new())
            }
        }
    }
}

/// Poll for `selector` until it appears or `timeout` elapses.
async fn wait_for(session: &mut dyn BrowserSession, selector: &str, timeout: Duration) -> Result<()> {
    let poll = async {
        loop {
            if session.exists(selector).await? {
                return Ok::<(), TubeRagError>(());
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    };

    tokio::time::timeout(timeout, poll)
        .await
        .map_err(|_| TubeRagError::Timeout(timeout.as_secs()))?
}

/// Join transcript line texts, skipping near-empty lines. `None` when too few
/// line elements were found to trust the layout.
fn join_transcript_lines(lines: &[String]) -> Option<String> {
    if lines.len() <= MIN_LINE_ELEMENTS {
        return None;
    }

    let text = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| l.chars().count() > 2)
        .collect::<Vec<_>>()
        .join("\n");

    Some(text)
}
