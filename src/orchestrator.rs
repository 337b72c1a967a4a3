/// Transcript orchestration
///
/// Composes the transcript cache, the ordered source chain and the
/// translation engine into a single `resolve` operation. Concurrent requests
/// for the same video and language share one in-flight computation, which
/// runs as its own task and is cached even if every caller stops waiting.
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::cache::TranscriptCache;
use crate::captions::{CaptionSource, PlaceholderSource, SourceOutcome, TranscriptSource, YouTubeCaptionFetcher};
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::transcript::{CaptionLine, SourceLabel, Transcript, TranscriptSegment, VideoId};
use crate::translation::TranslationEngine;

type FlightKey = (String, String);
type Flight = Shared<BoxFuture<'static, Result<Transcript>>>;

struct Inner {
    sources: Vec<Arc<dyn TranscriptSource>>,
    translator: TranslationEngine,
    cache: Arc<TranscriptCache>,
    default_target_language: String,
    request_timeout: Option<Duration>,
    inflight: Mutex<HashMap<FlightKey, Flight>>,
}

/// Removes a finished computation from the in-flight table
struct FlightGuard {
    inner: Arc<Inner>,
    key: FlightKey,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        let mut inflight = self.inner.inflight.lock().unwrap_or_else(|e| e.into_inner());
        inflight.remove(&self.key);
    }
}

/// Produces finalized bilingual transcripts
#[derive(Clone)]
pub struct TranscriptOrchestrator {
    inner: Arc<Inner>,
}

impl TranscriptOrchestrator {
    /// Create an orchestrator over an explicit source chain.
    ///
    /// Sources are tried in order; the first one that produces lines wins.
    pub fn new(
        sources: Vec<Arc<dyn TranscriptSource>>,
        translator: TranslationEngine,
        cache: Arc<TranscriptCache>,
        default_target_language: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                sources,
                translator,
                cache,
                default_target_language: default_target_language.into(),
                request_timeout: None,
                inflight: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Bound the time a caller waits for `resolve`.
    ///
    /// A caller that runs out of time gets the placeholder transcript while
    /// the real one keeps building in the background. Must be called before
    /// the orchestrator is cloned.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.request_timeout = Some(timeout);
        }
        self
    }

    /// Build the production pipeline: YouTube captions, then the placeholder
    pub fn from_config(config: &Config, cache: Arc<TranscriptCache>) -> Self {
        let mut sources: Vec<Arc<dyn TranscriptSource>> = Vec::new();
        match YouTubeCaptionFetcher::new(&config.captions) {
            Ok(fetcher) => sources.push(Arc::new(CaptionSource::new(
                Arc::new(fetcher),
                Duration::from_secs(config.captions.timeout_seconds),
            ))),
            Err(e) => warn!("YouTube captions disabled: {}", e),
        }
        sources.push(Arc::new(PlaceholderSource::new()));

        Self::new(
            sources,
            TranslationEngine::from_config(&config.translation),
            cache,
            config.translation.default_target_language.clone(),
        )
        .with_request_timeout(Duration::from_secs(config.server.request_timeout_seconds))
    }

    pub fn cache(&self) -> &Arc<TranscriptCache> {
        &self.inner.cache
    }

    pub fn default_target_language(&self) -> &str {
        &self.inner.default_target_language
    }

    pub fn translation_enabled(&self) -> bool {
        self.inner.translator.is_enabled()
    }

    /// Number of computations currently in flight
    pub fn inflight_count(&self) -> usize {
        self.inner.inflight.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Return the transcript for `video_id` in `target_language`.
    ///
    /// `video_id` may be a bare id or a YouTube URL. An empty language falls
    /// back to the configured default. Fails only on invalid input or when
    /// every source came back empty.
    pub async fn resolve(&self, video_id: &str, target_language: &str) -> Result<Transcript> {
        let video_id = VideoId::parse(video_id)?;
        let target_language = match target_language.trim() {
            "" => self.inner.default_target_language.clone(),
            language => language.to_string(),
        };

        let flight = self.join_flight((video_id.as_str().to_string(), target_language.clone()));

        let Some(limit) = self.inner.request_timeout else {
            return flight.await;
        };

        match tokio::time::timeout(limit, flight).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "⏳ Transcript for {} not ready after {:?}, serving placeholder",
                    video_id, limit
                );
                Ok(placeholder_transcript(video_id.as_str(), &target_language))
            }
        }
    }

    fn join_flight(&self, key: FlightKey) -> Flight {
        let mut inflight = self.inner.inflight.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = inflight.get(&key) {
            debug!("Joining in-flight resolve for {} ({})", key.0, key.1);
            return existing.clone();
        }

        let inner = self.inner.clone();
        let flight_key = key.clone();
        let task = tokio::spawn(async move {
            let _guard = FlightGuard {
                inner: inner.clone(),
                key: flight_key.clone(),
            };
            inner.produce(&flight_key.0, &flight_key.1).await
        });

        let flight = task
            .map(|joined| {
                joined.unwrap_or_else(|e| {
                    error!("Transcript task failed: {}", e);
                    Err(PipelineError::TaskFailed(e.to_string()))
                })
            })
            .boxed()
            .shared();

        inflight.insert(key, flight.clone());
        flight
    }
}

/// Untranslated placeholder handed to callers that stop waiting; never cached
fn placeholder_transcript(video_id: &str, target_language: &str) -> Transcript {
    let segments = PlaceholderSource::lines()
        .iter()
        .map(|line| TranscriptSegment::from_line(line, line.text.clone()))
        .collect();
    Transcript::new(video_id, SourceLabel::GeneratedFallback, target_language, segments)
}

impl Inner {
    async fn produce(&self, video_id: &str, target_language: &str) -> Result<Transcript> {
        if let Some(cached) = self.cache.get(video_id).await {
            if cached.target_language == target_language {
                info!("📚 Cache hit for {} ({})", video_id, target_language);
                return Ok(cached.as_cached());
            }
            info!(
                "Cached transcript for {} is in {}, regenerating for {}",
                video_id, cached.target_language, target_language
            );
        }

        for source in &self.sources {
            match source.acquire(video_id).await {
                SourceOutcome::Found(lines) if !lines.is_empty() => {
                    return Ok(self
                        .finalize(video_id, source.label(), &lines, target_language)
                        .await);
                }
                SourceOutcome::Found(_) => {
                    debug!("{} source returned no lines for {}", source.label(), video_id);
                }
                SourceOutcome::Unavailable(reason) => {
                    info!("{} unavailable for {}: {}", source.label(), video_id, reason);
                }
            }
        }

        warn!("No transcript source produced data for {}", video_id);
        Err(PipelineError::SourceUnavailable(video_id.to_string()))
    }

    async fn finalize(
        &self,
        video_id: &str,
        origin: SourceLabel,
        lines: &[CaptionLine],
        target_language: &str,
    ) -> Transcript {
        let texts: Vec<String> = lines.iter().map(|line| line.text.clone()).collect();
        let pairs = self.translator.translate(&texts, target_language).await;

        let segments: Vec<TranscriptSegment> = lines
            .iter()
            .zip(pairs)
            .map(|(line, pair)| TranscriptSegment::from_line(line, pair.translated_text))
            .collect();

        let transcript = Transcript::new(video_id, origin, target_language, segments);
        info!(
            "✅ Built {} transcript for {}: {} segments, {} translated",
            origin,
            video_id,
            transcript.len(),
            transcript.translated_count()
        );

        if let Err(e) = self.cache.put(video_id, &transcript).await {
            warn!("Transcript for {} was not cached: {}", video_id, e);
        }

        transcript
    }
}
