/// Batched machine translation of caption text
///
/// Text is split into fixed-size batches, each batch goes out as one
/// numbered prompt, and the numbered reply is matched back to its inputs.
/// Nothing in here fails: missing credentials, transport errors, timeouts and
/// unreadable replies all degrade to returning the source text.

pub mod prompt;

pub use prompt::{build_batch_prompt, language_name, parse_numbered_response};

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::TranslationConfig;
use crate::llm::{create_llm, ChatMessage, LLM};

const SYSTEM_PROMPT: &str =
    "You are a professional translator. Translate accurately while maintaining natural flow.";

/// Source text paired with its best-effort translation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranslationPair {
    pub source_text: String,
    pub translated_text: String,
}

impl TranslationPair {
    fn untranslated(text: &str) -> Self {
        Self {
            source_text: text.to_string(),
            translated_text: text.to_string(),
        }
    }
}

/// Translates ordered caption text through an LLM, batch by batch
pub struct TranslationEngine {
    llm: Option<Arc<dyn LLM>>,
    batch_size: usize,
    max_concurrent_batches: usize,
    source_language: String,
    batch_timeout: Duration,
}

impl TranslationEngine {
    /// Create an engine around an explicit LLM; `None` gives a no-op engine
    pub fn new(llm: Option<Arc<dyn LLM>>, config: &TranslationConfig) -> Self {
        Self {
            llm,
            batch_size: config.batch_size.max(1),
            max_concurrent_batches: config.max_concurrent_batches.max(1),
            source_language: config.source_language.clone(),
            batch_timeout: Duration::from_secs(config.llm.timeout_seconds),
        }
    }

    /// Create an engine from configuration.
    ///
    /// Without credentials the engine runs in no-op mode.
    pub fn from_config(config: &TranslationConfig) -> Self {
        if !config.llm.is_configured() {
            info!("🔇 No translation credentials configured, transcripts stay untranslated");
            return Self::new(None, config);
        }

        match create_llm(&config.llm) {
            Ok(llm) => {
                info!("🌐 Translation enabled with {:?} ({})", config.llm.provider, config.llm.model);
                Self::new(Some(llm), config)
            }
            Err(e) => {
                warn!("Failed to initialize translation provider: {}", e);
                Self::new(None, config)
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.llm.is_some()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Translate `texts` into `target_language`.
    ///
    /// The result has the same length and order as the input.
    pub async fn translate(&self, texts: &[String], target_language: &str) -> Vec<TranslationPair> {
        let llm = match &self.llm {
            Some(llm) if !self.is_source_language(target_language) => llm,
            _ => {
                debug!("Skipping translation of {} segments", texts.len());
                return texts.iter().map(|t| TranslationPair::untranslated(t)).collect();
            }
        };

        let batches: Vec<&[String]> = texts.chunks(self.batch_size).collect();
        info!(
            "🔤 Translating {} segments into {} ({} batches)",
            texts.len(),
            target_language,
            batches.len()
        );

        let pending: Vec<_> = batches
            .into_iter()
            .enumerate()
            .map(|(index, batch)| self.translate_batch(llm.as_ref(), index, batch, target_language))
            .collect();

        // `buffered` yields results in submission order, whatever order the
        // batches finish in
        let translated: Vec<Vec<TranslationPair>> = stream::iter(pending)
            .buffered(self.max_concurrent_batches)
            .collect()
            .await;

        translated.into_iter().flatten().collect()
    }

    async fn translate_batch(
        &self,
        llm: &dyn LLM,
        index: usize,
        batch: &[String],
        target_language: &str,
    ) -> Vec<TranslationPair> {
        let messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_batch_prompt(batch, &self.source_language, target_language)),
        ];

        let response = match tokio::time::timeout(self.batch_timeout, llm.chat(messages)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!("Translation batch {} failed, keeping source text: {}", index, e);
                return batch.iter().map(|t| TranslationPair::untranslated(t)).collect();
            }
            Err(_) => {
                warn!(
                    "Translation batch {} timed out after {:?}, keeping source text",
                    index, self.batch_timeout
                );
                return batch.iter().map(|t| TranslationPair::untranslated(t)).collect();
            }
        };

        debug!("Translation batch {} completed (tokens: {:?})", index, response.tokens_used);

        let parsed = parse_numbered_response(&response.content, batch.len());
        let missing = parsed.iter().filter(|p| p.is_none()).count();
        if missing > 0 {
            warn!(
                "Translation batch {}: {} of {} lines unreadable, keeping source text for them",
                index,
                missing,
                batch.len()
            );
        }

        batch
            .iter()
            .zip(parsed)
            .map(|(source, translated)| TranslationPair {
                source_text: source.clone(),
                translated_text: translated.unwrap_or_else(|| source.clone()),
            })
            .collect()
    }

    fn is_source_language(&self, language: &str) -> bool {
        base_code(language) == base_code(&self.source_language)
    }
}

fn base_code(language: &str) -> String {
    language
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LLMProvider, LLMResponse};
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Echoes each numbered line back as `N. <text> [es]`
    struct EchoLLM {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LLM for EchoLLM {
        async fn chat(&self, messages: Vec<ChatMessage>) -> Result<LLMResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let prompt = &messages[1].content;
            let content = prompt
                .lines()
                .filter(|l| l.chars().next().map_or(false, |c| c.is_ascii_digit()))
                .map(|l| format!("{} [es]", l))
                .collect::<Vec<_>>()
                .join("\n");
            Ok(LLMResponse { content, tokens_used: None })
        }

        fn provider_type(&self) -> LLMProvider {
            LLMProvider::OpenAI
        }
    }

    struct FailingLLM;

    #[async_trait]
    impl LLM for FailingLLM {
        async fn chat(&self, _messages: Vec<ChatMessage>) -> Result<LLMResponse> {
            Err(anyhow!("OpenAI rate limit exceeded"))
        }

        fn provider_type(&self) -> LLMProvider {
            LLMProvider::OpenAI
        }
    }

    fn texts(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("line {}", i)).collect()
    }

    fn echo_engine() -> (Arc<EchoLLM>, TranslationEngine) {
        let llm = Arc::new(EchoLLM { calls: AtomicUsize::new(0) });
        let engine = TranslationEngine::new(Some(llm.clone()), &TranslationConfig::default());
        (llm, engine)
    }

    #[tokio::test]
    async fn test_noop_without_llm() {
        let engine = TranslationEngine::from_config(&TranslationConfig::default());
        assert!(!engine.is_enabled());

        let pairs = engine.translate(&texts(7), "es").await;
        assert_eq!(pairs.len(), 7);
        assert!(pairs.iter().all(|p| p.translated_text == p.source_text));
    }

    #[tokio::test]
    async fn test_batches_of_five() {
        let (llm, engine) = echo_engine();
        let pairs = engine.translate(&texts(12), "es").await;

        assert_eq!(llm.calls.load(Ordering::SeqCst), 3);
        assert_eq!(pairs.len(), 12);
        for (i, pair) in pairs.iter().enumerate() {
            assert_eq!(pair.source_text, format!("line {}", i + 1));
            assert_eq!(pair.translated_text, format!("line {} [es]", i + 1));
        }
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_calls() {
        let (llm, engine) = echo_engine();
        assert!(engine.translate(&[], "es").await.is_empty());
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_same_language_skips_llm() {
        let (llm, engine) = echo_engine();
        let pairs = engine.translate(&texts(3), "en-US").await;
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
        assert!(pairs.iter().all(|p| p.translated_text == p.source_text));
    }

    #[tokio::test]
    async fn test_transport_failure_degrades_batch() {
        let engine = TranslationEngine::new(Some(Arc::new(FailingLLM)), &TranslationConfig::default());
        let pairs = engine.translate(&texts(6), "es").await;
        assert_eq!(pairs.len(), 6);
        assert!(pairs.iter().all(|p| p.translated_text == p.source_text));
    }

    #[test]
    fn test_base_code() {
        assert_eq!(base_code("en-US"), "en");
        assert_eq!(base_code("pt_BR"), "pt");
        assert_eq!(base_code("ES"), "es");
    }
}
