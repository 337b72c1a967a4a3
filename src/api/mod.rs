//! HTTP API for the transcript pipeline
//!
//! Exposes transcript resolution, read-only cache lookups and video
//! metadata to the web frontend.

use anyhow::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::TranscriptCache;
use crate::config::Config;
use crate::metadata::YouTubeMetadataClient;
use crate::orchestrator::TranscriptOrchestrator;

pub mod handlers;
pub mod models;
pub mod server;

pub use server::{build_router, AppState};

/// API server wiring the pipeline to HTTP
pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    /// Build the production pipeline from configuration
    pub fn from_config(config: Arc<Config>) -> Self {
        let cache = Arc::new(TranscriptCache::from_config(&config.cache));
        let orchestrator = TranscriptOrchestrator::from_config(&config, cache);
        let metadata = YouTubeMetadataClient::from_config(&config.metadata).map(Arc::new);

        Self::new(orchestrator, metadata, config)
    }

    pub fn new(
        orchestrator: TranscriptOrchestrator,
        metadata: Option<Arc<YouTubeMetadataClient>>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            state: AppState {
                orchestrator,
                metadata,
                config,
            },
        }
    }

    /// Start the API server in the background
    pub fn start_background(self) -> JoinHandle<Result<()>> {
        tokio::spawn(async move { self.start().await })
    }

    /// Run the API server until it fails
    pub async fn start(self) -> Result<()> {
        info!(
            "🚀 Starting API server on {}:{}",
            self.state.config.server.host, self.state.config.server.port
        );
        server::start_http_server(self.state).await
    }
}
