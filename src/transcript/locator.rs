//! YouTube video locator parsing.

use crate::error::{Result, TubeRagError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use url::Url;

static VIDEO_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("Invalid regex"));

/// An 11-character YouTube video identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VideoId(String);

impl VideoId {
    /// Extract a video ID from a watch/short/embed URL or a bare ID.
    ///
    /// Returns `None` when the input does not resolve to a well-formed ID.
    pub fn extract(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        if VIDEO_ID_RE.is_match(input) {
            return Some(Self(input.to_string()));
        }

        let url = parse_loose_url(input)?;
        let candidate = id_from_url(&url)?;

        VIDEO_ID_RE.is_match(&candidate).then_some(Self(candidate))
    }

    /// Like [`VideoId::extract`], but reports malformed input as an error.
    pub fn parse(input: &str) -> Result<Self> {
        Self::extract(input).ok_or_else(|| {
            TubeRagError::InvalidLocator(format!(
                "could not find an 11-character YouTube video ID in {:?}",
                input.trim()
            ))
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch URL for this video.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for VideoId {
    type Error = TubeRagError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<VideoId> for String {
    fn from(id: VideoId) -> Self {
        id.0
    }
}

/// Parse a URL, tolerating a missing scheme (`youtu.be/ID`, `www.youtube.com/...`).
fn parse_loose_url(input: &str) -> Option<Url> {
    match Url::parse(input) {
        Ok(url) if url.host_str().is_some() => Some(url),
        _ => Url::parse(&format!("https://{}", input)).ok(),
    }
}

fn id_from_url(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());

    if host == "youtu.be" || host.ends_with(".youtu.be") {
        return segments.next().map(str::to_string);
    }

    let is_youtube = ["youtube.com", "youtube-nocookie.com"]
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{}", domain)));
    if !is_youtube {
        return None;
    }

    match segments.next()? {
        "watch" => url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned()),
        "embed" | "shorts" | "live" | "v" => segments.next().map(str::to_string),
        _ => None,
    }
}
