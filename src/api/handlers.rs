//! API request handlers

use serde_json::Value;
use tracing::info;

use super::models::{CachedTranscriptResponse, TranscriptRequest, TranscriptResponse};
use super::server::AppState;
use crate::error::{PipelineError, Result};
use crate::metadata::VideoMetadata;
use crate::transcript::VideoId;

/// Handle health check requests
pub async fn health_check(state: &AppState) -> Result<Value> {
    let cache = state.orchestrator.cache();
    Ok(serde_json::json!({
        "status": "healthy",
        "service": "yt-dualsub",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "translation": state.orchestrator.translation_enabled(),
        "durableCache": cache.durable_name(),
        "cachedInProcess": cache.memory_len().await,
        "inflight": state.orchestrator.inflight_count(),
        "metadata": state.metadata.is_some(),
    }))
}

/// Resolve a transcript, generating and caching it on a miss
pub async fn resolve_transcript(state: &AppState, request: &TranscriptRequest) -> Result<TranscriptResponse> {
    let target_language = request.target_language.as_deref().unwrap_or_default();
    let transcript = state
        .orchestrator
        .resolve(&request.video_id, target_language)
        .await?;

    info!(
        "📤 Serving {} transcript for {} ({} segments)",
        transcript.source_label,
        transcript.video_id,
        transcript.len()
    );
    Ok(TranscriptResponse::from(transcript))
}

/// Read a cached transcript without generating anything
pub async fn cached_transcript(state: &AppState, video_id: Option<&str>) -> Result<Option<CachedTranscriptResponse>> {
    let video_id = VideoId::parse(video_id.unwrap_or_default())?;
    Ok(state
        .orchestrator
        .cache()
        .get(video_id.as_str())
        .await
        .map(|transcript| CachedTranscriptResponse {
            transcript,
            cached: true,
        }))
}

/// Look up video metadata
pub async fn video_info(state: &AppState, video_id: Option<&str>) -> Result<VideoMetadata> {
    let video_id = VideoId::parse(video_id.unwrap_or_default())?;
    let client = state
        .metadata
        .as_ref()
        .ok_or_else(|| PipelineError::NotConfigured("YouTube Data API key".to_string()))?;
    client.lookup(video_id.as_str()).await
}
