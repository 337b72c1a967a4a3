use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Path prefixes that are followed directly by a video id
const ID_PATH_PREFIXES: &[&str] = &["embed", "shorts", "live", "v"];

/// An opaque YouTube video identifier.
///
/// Only emptiness is checked; whether the id names a real video is for the
/// caption provider to find out.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Parse a raw id or a YouTube URL pasted by the user
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(PipelineError::InvalidRequest("Video ID is required".to_string()));
        }

        if let Some(url) = as_youtube_url(input) {
            return extract_from_url(&url)
                .map(VideoId)
                .ok_or_else(|| {
                    PipelineError::InvalidRequest(format!("No video ID found in URL: {}", input))
                });
        }

        Ok(VideoId(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn as_youtube_url(input: &str) -> Option<Url> {
    let candidate = if input.starts_with("http://") || input.starts_with("https://") {
        input.to_string()
    } else if input.contains("youtube.com/") || input.starts_with("youtu.be/") {
        format!("https://{}", input)
    } else {
        return None;
    };

    let url = Url::parse(&candidate).ok()?;
    let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");
    match host {
        "youtube.com" | "music.youtube.com" | "youtu.be" | "youtube-nocookie.com" => Some(url),
        _ => None,
    }
}

fn extract_from_url(url: &Url) -> Option<String> {
    let host = url.host_str().unwrap_or_default();
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());

    if host.ends_with("youtu.be") {
        return segments.next().map(str::to_string);
    }

    if let Some((_, id)) = url.query_pairs().find(|(k, _)| k == "v") {
        let id = id.trim();
        if !id.is_empty() {
            return Some(id.to_string());
        }
    }

    let first = segments.next()?;
    if ID_PATH_PREFIXES.contains(&first) {
        return segments.next().map(str::to_string);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_id_passes_through() {
        assert_eq!(VideoId::parse("  dQw4w9WgXcQ ").unwrap().as_str(), "dQw4w9WgXcQ");
        // malformed ids are left for the caption provider to reject
        assert_eq!(VideoId::parse("not a real id").unwrap().as_str(), "not a real id");
    }

    #[test]
    fn test_empty_id_is_rejected() {
        assert!(matches!(VideoId::parse(""), Err(PipelineError::InvalidRequest(_))));
        assert!(matches!(VideoId::parse("   "), Err(PipelineError::InvalidRequest(_))));
    }

    #[test]
    fn test_url_forms() {
        let cases = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?feature=shared&v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?feature=shared",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ&t=42s",
            "www.youtube.com/watch?v=dQw4w9WgXcQ",
            "youtu.be/dQw4w9WgXcQ",
        ];
        for case in cases {
            assert_eq!(VideoId::parse(case).unwrap().as_str(), "dQw4w9WgXcQ", "{}", case);
        }
    }

    #[test]
    fn test_url_without_id_is_rejected() {
        assert!(VideoId::parse("https://www.youtube.com/feed/trending").is_err());
        assert!(VideoId::parse("https://youtu.be/").is_err());
    }
}
