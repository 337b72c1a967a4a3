/// Transcript sources
///
/// A transcript source turns a video id into normalized caption lines, or
/// reports that it has nothing. The orchestrator walks an ordered list of
/// sources and takes the first one that produces data: platform captions
/// first, the generated placeholder last.

pub mod placeholder;
pub mod youtube;

pub use placeholder::PlaceholderSource;
pub use youtube::YouTubeCaptionFetcher;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::transcript::{round_tenths, CaptionLine, SourceLabel};

/// Minimum length given to cues whose timing rounds to zero
const MIN_CUE_SECONDS: f64 = 0.1;

/// One raw caption unit as delivered by the captions provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawCue {
    pub offset_ms: u64,
    pub duration_ms: u64,
    pub text: String,
}

impl RawCue {
    pub fn new(offset_ms: u64, duration_ms: u64, text: impl Into<String>) -> Self {
        Self {
            offset_ms,
            duration_ms,
            text: text.into(),
        }
    }
}

/// Reasons a captions provider can come back empty-handed.
///
/// Callers treat every variant the same way; the distinction only shows up
/// in logs.
#[derive(thiserror::Error, Debug)]
pub enum CaptionError {
    #[error("No captions available: {0}")]
    NoCaptions(String),

    #[error("Captions provider error: {0}")]
    Upstream(String),

    #[error("Captions request timed out after {0:?}")]
    Timeout(Duration),
}

/// Fetches raw caption cues from an upstream provider
#[async_trait]
pub trait CaptionFetcher: Send + Sync {
    async fn fetch_captions(&self, video_id: &str) -> Result<Vec<RawCue>, CaptionError>;
}

/// Tagged result of asking one source for a transcript
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome {
    Found(Vec<CaptionLine>),
    Unavailable(String),
}

/// One strategy in the transcript fallback chain
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Label attached to transcripts built from this source
    fn label(&self) -> SourceLabel;

    async fn acquire(&self, video_id: &str) -> SourceOutcome;
}

/// Convert provider cues into caption lines.
///
/// Millisecond timings become seconds rounded to one decimal, line breaks
/// become spaces, blank cues are dropped and the result is ordered by start
/// time. Overlapping cues are kept as delivered.
pub fn normalize_cues(cues: &[RawCue]) -> Vec<CaptionLine> {
    let mut lines: Vec<CaptionLine> = cues
        .iter()
        .filter_map(|cue| {
            let text = normalize_text(&cue.text);
            if text.is_empty() {
                return None;
            }

            let start = round_tenths(cue.offset_ms as f64 / 1000.0);
            let mut end = round_tenths(cue.offset_ms.saturating_add(cue.duration_ms) as f64 / 1000.0);
            if end <= start {
                end = round_tenths(start + MIN_CUE_SECONDS);
            }

            Some(CaptionLine { start, end, text })
        })
        .collect();

    lines.sort_by(|a, b| a.start.total_cmp(&b.start));
    lines
}

fn normalize_text(text: &str) -> String {
    text.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_string()
}

/// Platform captions as a transcript source
pub struct CaptionSource {
    fetcher: Arc<dyn CaptionFetcher>,
    timeout: Duration,
}

impl CaptionSource {
    pub fn new(fetcher: Arc<dyn CaptionFetcher>, timeout: Duration) -> Self {
        Self { fetcher, timeout }
    }
}

#[async_trait]
impl TranscriptSource for CaptionSource {
    fn label(&self) -> SourceLabel {
        SourceLabel::Captions
    }

    async fn acquire(&self, video_id: &str) -> SourceOutcome {
        debug!("Fetching captions for {}", video_id);

        let result = match tokio::time::timeout(self.timeout, self.fetcher.fetch_captions(video_id)).await {
            Ok(result) => result,
            Err(_) => Err(CaptionError::Timeout(self.timeout)),
        };

        match result {
            Ok(cues) => {
                let lines = normalize_cues(&cues);
                if lines.is_empty() {
                    info!("📭 Captions for {} were empty", video_id);
                    SourceOutcome::Unavailable("captions contained no text".to_string())
                } else {
                    info!("📝 Found {} caption segments for {}", lines.len(), video_id);
                    SourceOutcome::Found(lines)
                }
            }
            Err(e) => {
                warn!("No captions available for {}: {}", video_id, e);
                SourceOutcome::Unavailable(e.to_string())
            }
        }
    }
}
