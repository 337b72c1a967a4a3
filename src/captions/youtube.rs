/// YouTube caption fetcher backed by `yt-transcript-rs`
use super::{CaptionError, CaptionFetcher, RawCue};
use async_trait::async_trait;
use tracing::{debug, info};
use yt_transcript_rs::api::YouTubeTranscriptApi;

use crate::config::CaptionConfig;

/// Language tried when the preferred one has no track
const FALLBACK_LANGUAGE: &str = "en";

/// Fetches captions straight from youtube.com
pub struct YouTubeCaptionFetcher {
    api: YouTubeTranscriptApi,
    languages: Vec<String>,
}

impl YouTubeCaptionFetcher {
    pub fn new(config: &CaptionConfig) -> Result<Self, CaptionError> {
        let api = YouTubeTranscriptApi::new(None, None, None)
            .map_err(|e| CaptionError::Upstream(e.to_string()))?;

        Ok(Self {
            api,
            languages: preferred_languages(&config.language),
        })
    }
}

#[async_trait]
impl CaptionFetcher for YouTubeCaptionFetcher {
    async fn fetch_captions(&self, video_id: &str) -> Result<Vec<RawCue>, CaptionError> {
        let languages: Vec<&str> = self.languages.iter().map(String::as_str).collect();
        debug!("Requesting captions for {} in {:?}", video_id, languages);

        let transcript = self
            .api
            .fetch_transcript(video_id, &languages, false)
            .await
            .map_err(|e| CaptionError::NoCaptions(e.to_string()))?;

        info!(
            "🎬 Using {} caption track ({}) for {}",
            transcript.language_code,
            if transcript.is_generated { "auto-generated" } else { "manual" },
            video_id
        );

        Ok(transcript
            .snippets
            .iter()
            .map(|snippet| cue_from_snippet(snippet.start, snippet.duration, &snippet.text))
            .collect())
    }
}

/// Preferred caption language first, then English
fn preferred_languages(language: &str) -> Vec<String> {
    let language = language.trim();
    let mut languages = Vec::new();
    if !language.is_empty() {
        languages.push(language.to_string());
    }
    if !languages.iter().any(|l| l.eq_ignore_ascii_case(FALLBACK_LANGUAGE)) {
        languages.push(FALLBACK_LANGUAGE.to_string());
    }
    languages
}

/// Convert a snippet timed in seconds into a millisecond cue
fn cue_from_snippet(start: f64, duration: f64, text: &str) -> RawCue {
    RawCue::new(seconds_to_ms(start), seconds_to_ms(duration), text)
}

fn seconds_to_ms(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    }
}
