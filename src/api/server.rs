//! HTTP server implementation for the API

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use super::handlers;
use super::models::{ErrorResponse, TranscriptRequest, VideoQuery};
use crate::config::Config;
use crate::error::PipelineError;
use crate::metadata::YouTubeMetadataClient;
use crate::orchestrator::TranscriptOrchestrator;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: TranscriptOrchestrator,
    pub metadata: Option<Arc<YouTubeMetadataClient>>,
    pub config: Arc<Config>,
}

/// Build the router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        // Health check endpoints (both paths for compatibility)
        .route("/health", get(health_handler))
        .route("/api/health", get(health_handler))
        .route("/api/youtube/transcript", post(transcript_handler))
        .route("/api/youtube/cache", get(cache_handler))
        .route("/api/youtube/info", get(info_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

/// Configure and start the HTTP server
pub async fn start_http_server(state: AppState) -> Result<()> {
    let address = format!("{}:{}", state.config.server.host, state.config.server.port);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("🌐 API server listening on http://{}", address);

    axum::serve(listener, app).await?;

    Ok(())
}

/// HTTP status for a pipeline error
fn status_for(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        PipelineError::VideoNotFound(_) => StatusCode::NOT_FOUND,
        PipelineError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
        PipelineError::Metadata(_) => StatusCode::BAD_GATEWAY,
        PipelineError::SourceUnavailable(_)
        | PipelineError::CacheWriteFailed(_)
        | PipelineError::TaskFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: PipelineError) -> Response {
    let status = status_for(&err);
    if status.is_server_error() {
        error!("Request failed: {}", err);
    } else {
        warn!("Request rejected: {}", err);
    }
    (status, Json(ErrorResponse::new(err.to_string()))).into_response()
}

/// Health check handler
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    match handlers::health_check(&state).await {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Transcript resolve handler
async fn transcript_handler(
    State(state): State<AppState>,
    Json(request): Json<TranscriptRequest>,
) -> impl IntoResponse {
    match handlers::resolve_transcript(&state, &request).await {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Read-only cache lookup handler
async fn cache_handler(State(state): State<AppState>, Query(query): Query<VideoQuery>) -> impl IntoResponse {
    match handlers::cached_transcript(&state, query.video_id.as_deref()).await {
        Ok(Some(data)) => (StatusCode::OK, Json(data)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("No cached transcript found")),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// Video metadata handler
async fn info_handler(State(state): State<AppState>, Query(query): Query<VideoQuery>) -> impl IntoResponse {
    match handlers::video_info(&state, query.video_id.as_deref()).await {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TranscriptCache;
    use crate::captions::{PlaceholderSource, TranscriptSource};
    use crate::config::{CacheConfig, TranslationConfig};
    use crate::translation::TranslationEngine;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let sources: Vec<Arc<dyn TranscriptSource>> = vec![Arc::new(PlaceholderSource::new())];
        let orchestrator = TranscriptOrchestrator::new(
            sources,
            TranslationEngine::new(None, &TranslationConfig::default()),
            Arc::new(TranscriptCache::in_memory(&CacheConfig::default())),
            "es",
        );
        AppState {
            orchestrator,
            metadata: None,
            config: Arc::new(Config::default()),
        }
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_transcript(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/youtube/transcript")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&PipelineError::InvalidRequest("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&PipelineError::VideoNotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&PipelineError::NotConfigured("x".into())), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_for(&PipelineError::Metadata("x".into())), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(build_router(test_state()), get("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["translation"], false);
    }

    #[tokio::test]
    async fn test_transcript_then_cache() {
        let state = test_state();

        let (status, body) = send(
            build_router(state.clone()),
            post_transcript(r#"{"videoId":"xyz789","targetLanguage":"es"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "generated-fallback");
        assert_eq!(body["placeholder"], true);
        assert_eq!(body["totalSegments"], 3);

        let (status, body) = send(build_router(state.clone()), get("/api/youtube/cache?videoId=xyz789")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cached"], true);
        assert_eq!(body["transcript"]["videoId"], "xyz789");

        let (status, body) = send(
            build_router(state),
            post_transcript(r#"{"videoId":"xyz789","targetLanguage":"es"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "cache");
        assert_eq!(body["origin"], "generated-fallback");
    }

    #[tokio::test]
    async fn test_missing_video_id_is_bad_request() {
        let (status, body) = send(build_router(test_state()), post_transcript(r#"{"videoId":"  "}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Video ID is required"));
    }

    #[tokio::test]
    async fn test_cache_miss_is_not_found() {
        let (status, _) = send(build_router(test_state()), get("/api/youtube/cache?videoId=nothing")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_info_without_key_is_unavailable() {
        let (status, _) = send(build_router(test_state()), get("/api/youtube/info?videoId=abc123")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
