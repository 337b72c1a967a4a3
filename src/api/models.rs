//! API data models

use serde::{Deserialize, Serialize};

use crate::transcript::{SourceLabel, Transcript, TranscriptSegment};

/// Body of `POST /api/youtube/transcript`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptRequest {
    #[serde(default)]
    pub video_id: String,
    pub target_language: Option<String>,
}

/// Query string carrying a video id
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoQuery {
    pub video_id: Option<String>,
}

/// Transcript as returned to the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptResponse {
    pub video_id: String,
    pub transcript: Vec<TranscriptSegment>,
    pub source: SourceLabel,
    pub origin: SourceLabel,
    /// True when the segments are filler rather than real captions
    pub placeholder: bool,
    pub language: String,
    pub total_segments: usize,
}

impl From<Transcript> for TranscriptResponse {
    fn from(transcript: Transcript) -> Self {
        Self {
            placeholder: transcript.is_placeholder(),
            total_segments: transcript.len(),
            video_id: transcript.video_id,
            source: transcript.source_label,
            origin: transcript.origin,
            language: transcript.target_language,
            transcript: transcript.segments,
        }
    }
}

/// Result of a read-only cache lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedTranscriptResponse {
    pub transcript: Transcript,
    pub cached: bool,
}

/// Error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { error: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::CaptionLine;

    #[test]
    fn test_request_defaults() {
        let request: TranscriptRequest = serde_json::from_str(r#"{"videoId":"abc123"}"#).unwrap();
        assert_eq!(request.video_id, "abc123");
        assert!(request.target_language.is_none());

        let empty: TranscriptRequest = serde_json::from_str("{}").unwrap();
        assert!(empty.video_id.is_empty());
    }

    #[test]
    fn test_response_shape() {
        let line = CaptionLine::new(0.0, 5.0, "Hello");
        let transcript = Transcript::new(
            "xyz789",
            SourceLabel::GeneratedFallback,
            "es",
            vec![TranscriptSegment::from_line(&line, "Hola".to_string())],
        );

        let json = serde_json::to_value(TranscriptResponse::from(transcript.as_cached())).unwrap();
        assert_eq!(json["videoId"], "xyz789");
        assert_eq!(json["source"], "cache");
        assert_eq!(json["origin"], "generated-fallback");
        assert_eq!(json["placeholder"], true);
        assert_eq!(json["language"], "es");
        assert_eq!(json["totalSegments"], 1);
        assert_eq!(json["transcript"][0]["translatedText"], "Hola");
    }
}
