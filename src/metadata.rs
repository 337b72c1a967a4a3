/// Video metadata lookup through the YouTube Data API
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::MetadataConfig;
use crate::error::{PipelineError, Result};

const VIDEOS_URL: &str = "https://www.googleapis.com/youtube/v3/videos";

/// Read-only description of a video
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub channel_title: String,
    pub published_at: Option<String>,
    /// Duration in seconds
    pub duration: u64,
    pub view_count: Option<u64>,
    pub default_language: String,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    snippet: Snippet,
    content_details: Option<ContentDetails>,
    statistics: Option<Statistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    channel_title: String,
    published_at: Option<String>,
    default_language: Option<String>,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    maxres: Option<Thumbnail>,
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
}

impl From<VideoItem> for VideoMetadata {
    fn from(item: VideoItem) -> Self {
        let Snippet {
            title,
            description,
            channel_title,
            published_at,
            default_language,
            thumbnails,
        } = item.snippet;

        Self {
            id: item.id,
            title,
            description,
            thumbnail: thumbnails.maxres.or(thumbnails.high).map(|t| t.url),
            channel_title,
            published_at,
            duration: item
                .content_details
                .map_or(0, |details| parse_iso8601_duration(&details.duration)),
            view_count: item
                .statistics
                .and_then(|s| s.view_count)
                .and_then(|count| count.parse().ok()),
            default_language: default_language.unwrap_or_else(|| "en".to_string()),
        }
    }
}

/// Parse a `PT#H#M#S` duration into seconds; anything unparsable is zero
pub fn parse_iso8601_duration(duration: &str) -> u64 {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^P(?:(\d+)D)?T?(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$").ok());

    let Some(caps) = re.as_ref().and_then(|re| re.captures(duration.trim())) else {
        return 0;
    };

    let part = |i: usize| -> u64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };

    part(1) * 86_400 + part(2) * 3600 + part(3) * 60 + part(4)
}

pub struct YouTubeMetadataClient {
    client: Client,
    api_key: String,
}

impl YouTubeMetadataClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Metadata(e.to_string()))?;
        Ok(Self { client, api_key })
    }

    /// Build a client when an API key is configured
    pub fn from_config(config: &MetadataConfig) -> Option<Self> {
        let api_key = config.api_key.clone().filter(|k| !k.trim().is_empty())?;
        match Self::new(api_key, Duration::from_secs(config.timeout_seconds)) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("Metadata lookup disabled: {}", e);
                None
            }
        }
    }

    pub async fn lookup(&self, video_id: &str) -> Result<VideoMetadata> {
        debug!("Looking up metadata for {}", video_id);

        let response = self
            .client
            .get(VIDEOS_URL)
            .query(&[
                ("id", video_id),
                ("key", self.api_key.as_str()),
                ("part", "snippet,contentDetails,statistics"),
            ])
            .send()
            .await
            .map_err(|e| PipelineError::Metadata(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::Metadata(format!(
                "YouTube Data API returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PipelineError::Metadata(e.to_string()))?;
        parse_video_list(&body, video_id)
    }
}

fn parse_video_list(body: &str, video_id: &str) -> Result<VideoMetadata> {
    let list: VideoListResponse =
        serde_json::from_str(body).map_err(|e| PipelineError::Metadata(e.to_string()))?;

    list.items
        .into_iter()
        .next()
        .map(VideoMetadata::from)
        .ok_or_else(|| PipelineError::VideoNotFound(video_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_iso8601_duration("PT1H2M3S"), 3723);
        assert_eq!(parse_iso8601_duration("PT4M13S"), 253);
        assert_eq!(parse_iso8601_duration("PT45S"), 45);
        assert_eq!(parse_iso8601_duration("PT2H"), 7200);
        assert_eq!(parse_iso8601_duration("P1DT1S"), 86_401);
        assert_eq!(parse_iso8601_duration("garbage"), 0);
    }

    #[test]
    fn test_parse_video_list() {
        let body = r#"{
            "items": [{
                "id": "abc123",
                "snippet": {
                    "title": "Learn Spanish",
                    "description": "Lesson one",
                    "channelTitle": "Profe Luis",
                    "publishedAt": "2023-01-01T00:00:00Z",
                    "thumbnails": {
                        "high": {"url": "https://i.ytimg.com/vi/abc123/hqdefault.jpg"},
                        "maxres": {"url": "https://i.ytimg.com/vi/abc123/maxresdefault.jpg"}
                    }
                },
                "contentDetails": {"duration": "PT10M5S"},
                "statistics": {"viewCount": "1234"}
            }]
        }"#;

        let metadata = parse_video_list(body, "abc123").unwrap();
        assert_eq!(metadata.title, "Learn Spanish");
        assert_eq!(metadata.duration, 605);
        assert_eq!(metadata.view_count, Some(1234));
        assert_eq!(metadata.default_language, "en");
        assert_eq!(
            metadata.thumbnail.as_deref(),
            Some("https://i.ytimg.com/vi/abc123/maxresdefault.jpg")
        );
    }

    #[test]
    fn test_high_thumbnail_when_no_maxres() {
        let body = r#"{"items":[{"id":"x","snippet":{"title":"t","thumbnails":{"high":{"url":"h.jpg"}},"defaultLanguage":"fr"}}]}"#;
        let metadata = parse_video_list(body, "x").unwrap();
        assert_eq!(metadata.thumbnail.as_deref(), Some("h.jpg"));
        assert_eq!(metadata.default_language, "fr");
        assert_eq!(metadata.duration, 0);
    }

    #[test]
    fn test_unknown_video() {
        let err = parse_video_list(r#"{"items":[]}"#, "missing").unwrap_err();
        assert_eq!(err, PipelineError::VideoNotFound("missing".to_string()));
    }

    #[test]
    fn test_from_config_requires_key() {
        assert!(YouTubeMetadataClient::from_config(&MetadataConfig::default()).is_none());
    }
}
