/// Tiered transcript cache
///
/// Finalized transcripts live under `transcript:{videoId}`. Reads try the
/// durable store first and fall back to the in-process tier; writes always
/// land in process and go to the durable store best-effort. A durable store
/// that errors or times out only costs durability, never a request.

pub mod file_store;
pub mod memory;
pub mod upstash;

pub use file_store::FileStore;
pub use memory::MemoryStore;
pub use upstash::UpstashStore;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{CacheConfig, DurableBackend};
use crate::error::PipelineError;
use crate::transcript::Transcript;

/// Namespace for transcript records in shared stores
pub const KEY_PREFIX: &str = "transcript:";

/// Cache key for a video
pub fn cache_key(video_id: &str) -> String {
    format!("{}{}", KEY_PREFIX, video_id)
}

/// Errors from a durable backing store
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Backend(String),

    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),
}

/// Key-value store with per-entry expiry
#[async_trait]
pub trait DurableStore: Send + Sync {
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;
}

/// Build the durable store selected in configuration
pub fn create_durable_store(config: &CacheConfig) -> Result<Option<Arc<dyn DurableStore>>, StoreError> {
    match config.backend {
        DurableBackend::None => Ok(None),
        DurableBackend::Upstash => {
            let url = config
                .upstash_url
                .clone()
                .ok_or_else(|| StoreError::Backend("upstash_url not configured".to_string()))?;
            let token = config
                .upstash_token
                .clone()
                .ok_or_else(|| StoreError::Backend("upstash_token not configured".to_string()))?;
            let store = UpstashStore::new(url, token, Duration::from_secs(config.timeout_seconds))?;
            Ok(Some(Arc::new(store)))
        }
        DurableBackend::File => Ok(Some(Arc::new(FileStore::new(config.cache_dir.clone())))),
    }
}

/// Two-tier transcript cache
pub struct TranscriptCache {
    durable: Option<Arc<dyn DurableStore>>,
    memory: MemoryStore,
    ttl: Duration,
    op_timeout: Duration,
}

impl TranscriptCache {
    pub fn new(durable: Option<Arc<dyn DurableStore>>, config: &CacheConfig) -> Self {
        let ttl = Duration::from_secs(config.ttl_seconds);
        Self {
            durable,
            memory: MemoryStore::new(config.memory_capacity, ttl),
            ttl,
            op_timeout: Duration::from_secs(config.timeout_seconds),
        }
    }

    /// Cache without a durable tier
    pub fn in_memory(config: &CacheConfig) -> Self {
        Self::new(None, config)
    }

    /// Build the cache described by configuration.
    ///
    /// A durable store that cannot be created leaves the cache in-process
    /// only.
    pub fn from_config(config: &CacheConfig) -> Self {
        let durable = match create_durable_store(config) {
            Ok(durable) => durable,
            Err(e) => {
                warn!("Durable cache unavailable, caching in process only: {}", e);
                None
            }
        };

        match &durable {
            Some(store) => info!("🗄️ Transcript cache using {} store (TTL {}s)", store.name(), config.ttl_seconds),
            None => info!("🗄️ Transcript cache running in process only"),
        }

        Self::new(durable, config)
    }

    /// Name of the durable tier, if any
    pub fn durable_name(&self) -> Option<&'static str> {
        self.durable.as_ref().map(|d| d.name())
    }

    /// Number of transcripts held in process
    pub async fn memory_len(&self) -> usize {
        self.memory.len().await
    }

    /// Look up a finalized transcript
    pub async fn get(&self, video_id: &str) -> Option<Transcript> {
        let key = cache_key(video_id);

        if let Some(durable) = &self.durable {
            match tokio::time::timeout(self.op_timeout, durable.get(&key)).await {
                Ok(Ok(Some(value))) => match serde_json::from_str::<Transcript>(&value) {
                    Ok(transcript) => {
                        debug!("Durable cache hit for {}", key);
                        return Some(transcript);
                    }
                    Err(e) => warn!("Ignoring undecodable cache entry {}: {}", key, e),
                },
                Ok(Ok(None)) => debug!("Durable cache miss for {}", key),
                Ok(Err(e)) => warn!("{} cache read failed for {}: {}", durable.name(), key, e),
                Err(_) => warn!(
                    "{} cache read timed out for {} after {:?}",
                    durable.name(),
                    key,
                    self.op_timeout
                ),
            }
        }

        let hit = self.memory.get(&key).await;
        if hit.is_some() {
            debug!("In-process cache hit for {}", key);
        }
        hit
    }

    /// Store a finalized transcript.
    ///
    /// The in-process tier is always written. Durable store failures are
    /// logged and do not fail the call.
    pub async fn put(&self, video_id: &str, transcript: &Transcript) -> Result<(), PipelineError> {
        let key = cache_key(video_id);
        self.memory.insert(&key, transcript.clone()).await;

        let Some(durable) = &self.durable else {
            return Ok(());
        };

        let value = serde_json::to_string(transcript)
            .map_err(|e| PipelineError::CacheWriteFailed(e.to_string()))?;

        match tokio::time::timeout(self.op_timeout, durable.set(&key, &value, self.ttl)).await {
            Ok(Ok(())) => debug!("Stored {} in {} cache", key, durable.name()),
            Ok(Err(e)) => warn!("{} cache write failed for {}: {}", durable.name(), key, e),
            Err(_) => warn!(
                "{} cache write timed out for {} after {:?}",
                durable.name(),
                key,
                self.op_timeout
            ),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::{CaptionLine, SourceLabel, TranscriptSegment};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    struct BrokenStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DurableStore for BrokenStore {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Backend("connection refused".to_string()))
        }

        async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Backend("connection refused".to_string()))
        }
    }

    #[derive(Default)]
    struct MapStore {
        entries: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl DurableStore for MapStore {
        fn name(&self) -> &'static str {
            "map"
        }

        async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            Ok(self.entries.lock().await.get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str, _ttl: Duration) -> Result<(), StoreError> {
            self.entries.lock().await.insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    fn transcript(video_id: &str) -> Transcript {
        let line = CaptionLine::new(0.0, 3.0, "Hello");
        Transcript::new(
            video_id,
            SourceLabel::Captions,
            "es",
            vec![TranscriptSegment::from_line(&line, "Hola".to_string())],
        )
    }

    #[test]
    fn test_cache_key_format() {
        assert_eq!(cache_key("abc123"), "transcript:abc123");
    }

    #[tokio::test]
    async fn test_miss_then_hit_in_memory() {
        let cache = TranscriptCache::in_memory(&CacheConfig::default());
        assert!(cache.get("abc123").await.is_none());

        let stored = transcript("abc123");
        cache.put("abc123", &stored).await.unwrap();
        assert_eq!(cache.get("abc123").await, Some(stored));
        assert!(cache.get("other").await.is_none());
        assert_eq!(cache.memory_len().await, 1);
    }

    #[tokio::test]
    async fn test_broken_durable_store_falls_back_to_memory() {
        let broken = Arc::new(BrokenStore { calls: AtomicUsize::new(0) });
        let cache = TranscriptCache::new(Some(broken.clone()), &CacheConfig::default());

        let stored = transcript("abc123");
        assert!(cache.put("abc123", &stored).await.is_ok());
        assert_eq!(cache.get("abc123").await, Some(stored));
        assert_eq!(broken.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_durable_store_round_trip() {
        let store = Arc::new(MapStore::default());
        let cache = TranscriptCache::new(Some(store.clone()), &CacheConfig::default());

        let stored = transcript("abc123");
        cache.put("abc123", &stored).await.unwrap();
        assert!(store.entries.lock().await.contains_key("transcript:abc123"));

        // a fresh process sees the durable copy
        let restarted = TranscriptCache::new(Some(store), &CacheConfig::default());
        assert_eq!(restarted.memory_len().await, 0);
        assert_eq!(restarted.get("abc123").await, Some(stored));
    }

    #[tokio::test]
    async fn test_undecodable_durable_value_is_a_miss() {
        let store = Arc::new(MapStore::default());
        store
            .entries
            .lock()
            .await
            .insert("transcript:abc123".to_string(), "{not json".to_string());

        let cache = TranscriptCache::new(Some(store), &CacheConfig::default());
        assert!(cache.get("abc123").await.is_none());
    }
}
