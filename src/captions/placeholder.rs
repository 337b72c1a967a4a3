use async_trait::async_trait;
use tracing::info;

use super::{SourceOutcome, TranscriptSource};
use crate::transcript::{CaptionLine, SourceLabel};

/// Filler lines served when a video has no obtainable captions
const PLACEHOLDER_LINES: &[(f64, f64, &str)] = &[
    (0.0, 5.0, "This video doesn't have captions available."),
    (5.0, 10.0, "We would normally use Whisper AI to transcribe it."),
    (10.0, 15.0, "For now, this is a demo transcript."),
];

/// Last resort in the source chain; always produces a transcript
#[derive(Debug, Clone, Default)]
pub struct PlaceholderSource;

impl PlaceholderSource {
    pub fn new() -> Self {
        Self
    }

    pub fn lines() -> Vec<CaptionLine> {
        PLACEHOLDER_LINES
            .iter()
            .map(|(start, end, text)| CaptionLine::new(*start, *end, *text))
            .collect()
    }
}

#[async_trait]
impl TranscriptSource for PlaceholderSource {
    fn label(&self) -> SourceLabel {
        SourceLabel::GeneratedFallback
    }

    async fn acquire(&self, video_id: &str) -> SourceOutcome {
        info!("🧩 Using placeholder transcript for {}", video_id);
        SourceOutcome::Found(Self::lines())
    }
}
