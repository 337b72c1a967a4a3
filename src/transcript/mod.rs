/// Transcript data model
///
/// Types shared by every stage of the pipeline: the normalized caption lines
/// produced by transcript sources, the bilingual segments handed to the
/// presentation layer, and the finalized transcript stored in the cache.

pub mod difficulty;
pub mod video_id;

pub use difficulty::Difficulty;
pub use video_id::VideoId;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a transcript came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum SourceLabel {
    /// Platform caption data
    Captions,
    /// Fixed placeholder content used when no captions were obtainable
    GeneratedFallback,
    /// Served from the transcript cache
    Cache,
}

impl SourceLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceLabel::Captions => "captions",
            SourceLabel::GeneratedFallback => "generated-fallback",
            SourceLabel::Cache => "cache",
        }
    }
}

impl fmt::Display for SourceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized, untranslated caption line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaptionLine {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Text in the source language
    pub text: String,
}

impl CaptionLine {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// One bilingual transcript unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptSegment {
    /// Start time in seconds (inclusive)
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Original language text
    pub source_text: String,
    /// Target language text, equal to `source_text` when untranslated
    pub translated_text: String,
    /// Estimated reading difficulty of the source text
    pub difficulty: Difficulty,
}

impl TranscriptSegment {
    /// Build a segment from a caption line and its translation.
    ///
    /// An empty translation is replaced by the source text.
    pub fn from_line(line: &CaptionLine, translated_text: String) -> Self {
        let translated_text = if translated_text.trim().is_empty() {
            line.text.clone()
        } else {
            translated_text
        };

        Self {
            start: line.start,
            end: line.end,
            source_text: line.text.clone(),
            translated_text,
            difficulty: Difficulty::assess(&line.text),
        }
    }

    /// Whether a translation differs from the source text
    pub fn is_translated(&self) -> bool {
        self.translated_text != self.source_text
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// A finalized, time-aligned bilingual transcript
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    /// External video identifier
    pub video_id: String,
    /// How this particular result was obtained
    pub source_label: SourceLabel,
    /// Provenance of the content itself, kept when served from cache
    pub origin: SourceLabel,
    /// Language code the segments were translated into
    pub target_language: String,
    /// When the transcript was generated
    pub generated_at: DateTime<Utc>,
    /// Segments ordered by start time
    pub segments: Vec<TranscriptSegment>,
}

impl Transcript {
    pub fn new(
        video_id: impl Into<String>,
        origin: SourceLabel,
        target_language: impl Into<String>,
        segments: Vec<TranscriptSegment>,
    ) -> Self {
        Self {
            video_id: video_id.into(),
            source_label: origin,
            origin,
            target_language: target_language.into(),
            generated_at: Utc::now(),
            segments,
        }
    }

    /// Copy of this transcript relabelled as a cache hit
    pub fn as_cached(&self) -> Self {
        Self {
            source_label: SourceLabel::Cache,
            ..self.clone()
        }
    }

    /// Whether the content is placeholder filler rather than real captions
    pub fn is_placeholder(&self) -> bool {
        self.origin == SourceLabel::GeneratedFallback
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// End time of the last segment
    pub fn total_duration(&self) -> f64 {
        self.segments.iter().map(|s| s.end).fold(0.0, f64::max)
    }

    /// Segment playing at `time` seconds, if any
    pub fn segment_at(&self, time: f64) -> Option<&TranscriptSegment> {
        self.segments
            .iter()
            .find(|s| time >= s.start && time < s.end)
    }

    /// Number of segments whose translation differs from the source
    pub fn translated_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_translated()).count()
    }
}

/// Round seconds to one decimal place
pub fn round_tenths(seconds: f64) -> f64 {
    (seconds * 10.0).round() / 10.0
}
