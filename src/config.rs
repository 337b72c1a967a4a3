use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::llm::{LLMConfig, LLMProvider};

/// Seven days, the retention window for cached transcripts
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 604_800;

/// Configuration for the transcript service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Caption provider settings
    pub captions: CaptionConfig,

    /// Translation settings
    pub translation: TranslationConfig,

    /// Transcript cache settings
    pub cache: CacheConfig,

    /// Video metadata lookup settings
    pub metadata: MetadataConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// File the configuration was read from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Upper bound on a whole resolve request (seconds)
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    /// Preferred caption language
    pub language: String,

    /// Timeout for caption requests (seconds)
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Segments per translation request
    pub batch_size: usize,

    /// Batches in flight at once for a single transcript
    pub max_concurrent_batches: usize,

    /// Language the captions are written in
    pub source_language: String,

    /// Target language when a request does not name one
    pub default_target_language: String,

    /// LLM used for translation
    pub llm: LLMConfig,
}

/// Durable cache tier backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DurableBackend {
    /// In-process caching only
    None,
    /// Upstash Redis over its REST API
    Upstash,
    /// JSON files in a local directory
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Durable tier backend
    pub backend: DurableBackend,

    /// Upstash REST URL
    pub upstash_url: Option<String>,

    /// Upstash REST token
    pub upstash_token: Option<String>,

    /// Directory for the file backend
    pub cache_dir: PathBuf,

    /// Retention window for cached transcripts (seconds)
    pub ttl_seconds: u64,

    /// Maximum transcripts held in process
    pub memory_capacity: usize,

    /// Timeout for durable store calls (seconds)
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// YouTube Data API key; lookups are disabled without one
    pub api_key: Option<String>,

    /// Request timeout (seconds)
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter, overridden by RUST_LOG
    pub level: String,
}

impl Config {
    /// Load configuration from the first readable file, then apply
    /// environment overrides
    pub fn load() -> Result<Self> {
        let config_paths = [
            "yt-dualsub.toml",
            "config/yt-dualsub.toml",
            "/etc/yt-dualsub/config.toml",
        ];

        let mut config = None;
        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str::<Config>(&config_str) {
                    Ok(parsed) => {
                        config = Some(Config {
                            source: Some(PathBuf::from(path)),
                            ..parsed
                        });
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        let mut config = config.unwrap_or_default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file, then apply environment
    /// overrides
    pub fn load_from(path: &str) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Cannot read config file {}: {}", path, e))?;
        let mut config: Config = toml::from_str(&config_str)?;
        config.source = Some(PathBuf::from(path));
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        if let Some(api_key) = var("OPENAI_API_KEY") {
            self.translation.llm.api_key = Some(api_key);
        }

        if let Some(endpoint) = var("TRANSLATION_ENDPOINT") {
            self.translation.llm.endpoint = Some(endpoint);
        }

        if let Some(url) = var("UPSTASH_REDIS_REST_URL") {
            self.cache.upstash_url = Some(url);
            self.cache.backend = DurableBackend::Upstash;
        }

        if let Some(token) = var("UPSTASH_REDIS_REST_TOKEN") {
            self.cache.upstash_token = Some(token);
        }

        if let Some(dir) = var("TRANSCRIPT_CACHE_DIR") {
            self.cache.cache_dir = PathBuf::from(dir);
            if self.cache.backend == DurableBackend::None {
                self.cache.backend = DurableBackend::File;
            }
        }

        if let Some(api_key) = var("YOUTUBE_API_KEY") {
            self.metadata.api_key = Some(api_key);
        }

        if let Some(host) = var("DUALSUB_HOST") {
            self.server.host = host;
        }

        if let Some(port) = var("DUALSUB_PORT") {
            self.server.port = port.parse().unwrap_or(self.server.port);
        }

        if let Some(level) = var("DUALSUB_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &str) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path);
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.translation.batch_size == 0 {
            return Err(anyhow!("translation.batch_size must be greater than 0"));
        }

        if self.translation.max_concurrent_batches == 0 {
            return Err(anyhow!("translation.max_concurrent_batches must be greater than 0"));
        }

        if self.cache.ttl_seconds == 0 {
            return Err(anyhow!("cache.ttl_seconds must be greater than 0"));
        }

        if self.cache.memory_capacity == 0 {
            return Err(anyhow!("cache.memory_capacity must be greater than 0"));
        }

        match self.cache.backend {
            DurableBackend::Upstash => {
                if self.cache.upstash_url.is_none() || self.cache.upstash_token.is_none() {
                    return Err(anyhow!("Upstash backend requires upstash_url and upstash_token"));
                }
            }
            DurableBackend::File | DurableBackend::None => {}
        }

        if self.translation.llm.provider == LLMProvider::LMStudio && self.translation.llm.endpoint.is_none() {
            return Err(anyhow!("LMStudio translation provider requires an endpoint"));
        }

        tracing::info!("✅ Configuration validation passed");
        Ok(())
    }

    /// Get runtime configuration summary
    /// Where the configuration came from, for log output
    pub fn source_description(&self) -> String {
        match &self.source {
            Some(path) => path.display().to_string(),
            None => "defaults and environment".to_string(),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Transcript Service Configuration:\n\
            - Loaded From: {}\n\
            - Listen: {}:{}\n\
            - Caption Language: {}\n\
            - Translation: {} ({:?}, batch size {})\n\
            - Durable Cache: {:?}\n\
            - Cache TTL: {}s, in-process capacity {}\n\
            - Metadata Lookup: {}",
            self.source_description(),
            self.server.host,
            self.server.port,
            self.captions.language,
            if self.translation.llm.is_configured() { "enabled" } else { "disabled" },
            self.translation.llm.provider,
            self.translation.batch_size,
            self.cache.backend,
            self.cache.ttl_seconds,
            self.cache.memory_capacity,
            if self.metadata.api_key.is_some() { "enabled" } else { "disabled" }
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            captions: CaptionConfig::default(),
            translation: TranslationConfig::default(),
            cache: CacheConfig::default(),
            metadata: MetadataConfig::default(),
            logging: LoggingConfig::default(),
            source: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            request_timeout_seconds: 120,
        }
    }
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            timeout_seconds: 15,
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            max_concurrent_batches: 8,
            source_language: "en".to_string(),
            default_target_language: "es".to_string(),
            llm: LLMConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: DurableBackend::None,
            upstash_url: None,
            upstash_token: None,
            cache_dir: PathBuf::from("./transcript_cache"),
            ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            memory_capacity: 500,
            timeout_seconds: 5,
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            timeout_seconds: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "yt_dualsub=info,tower_http=info,warn".to_string(),
        }
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_openai_key(mut self, api_key: String) -> Self {
        self.config.translation.llm.api_key = Some(api_key);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.config.translation.batch_size = batch_size;
        self
    }

    pub fn with_upstash(mut self, url: String, token: String) -> Self {
        self.config.cache.backend = DurableBackend::Upstash;
        self.config.cache.upstash_url = Some(url);
        self.config.cache.upstash_token = Some(token);
        self
    }

    pub fn with_file_cache(mut self, dir: PathBuf) -> Self {
        self.config.cache.backend = DurableBackend::File;
        self.config.cache.cache_dir = dir;
        self
    }

    pub fn with_cache_ttl(mut self, ttl_seconds: u64) -> Self {
        self.config.cache.ttl_seconds = ttl_seconds;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.translation.batch_size, 5);
        assert_eq!(config.cache.ttl_seconds, 604_800);
        assert_eq!(config.cache.backend, DurableBackend::None);
        assert!(!config.translation.llm.is_configured());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .with_port(8080)
            .with_batch_size(10)
            .with_openai_key("sk-test".to_string())
            .build();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.translation.batch_size, 10);
        assert!(config.translation.llm.is_configured());
    }

    #[test]
    fn test_config_validation() {
        assert!(Config::default().validate().is_ok());
        assert!(ConfigBuilder::new().with_batch_size(0).build().validate().is_err());

        let mut upstash = Config::default();
        upstash.cache.backend = DurableBackend::Upstash;
        assert!(upstash.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("OPENAI_API_KEY", "sk-env"),
            ("UPSTASH_REDIS_REST_URL", "https://example.upstash.io"),
            ("UPSTASH_REDIS_REST_TOKEN", "token"),
            ("DUALSUB_PORT", "9000"),
            ("YOUTUBE_API_KEY", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.translation.llm.api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.cache.backend, DurableBackend::Upstash);
        assert_eq!(config.cache.upstash_token.as_deref(), Some("token"));
        assert_eq!(config.server.port, 9000);
        // blank values are ignored
        assert!(config.metadata.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [translation]
            batch_size = 8

            [cache]
            backend = "File"
            cache_dir = "/tmp/transcripts"
            "#,
        )
        .unwrap();

        assert_eq!(config.translation.batch_size, 8);
        assert_eq!(config.translation.default_target_language, "es");
        assert_eq!(config.cache.backend, DurableBackend::File);
        assert_eq!(config.cache.ttl_seconds, DEFAULT_CACHE_TTL_SECONDS);
    }

    #[test]
    fn test_load_from_records_source() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("yt-dualsub.toml");
        std::fs::write(&path, "[server]\nport = 4000\n").unwrap();

        let config = Config::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(config.source.as_deref(), Some(path.as_path()));
        assert!(config.summary().contains(&path.display().to_string()));
        assert!(Config::default().summary().contains("defaults and environment"));
    }

    #[test]
    fn test_example_config_parses() {
        let config: Config = toml::from_str(include_str!("../config/yt-dualsub.example.toml")).unwrap();
        assert_eq!(config.cache.backend, DurableBackend::File);
        assert_eq!(config.translation.llm.model, "gpt-4o-mini");
        assert!(config.validate().is_ok());
    }
}
