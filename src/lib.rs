/// YouTube dual-subtitle transcript pipeline
///
/// Given a video identifier, produces a time-aligned bilingual transcript:
/// cached copies first, then platform captions, then a placeholder, with
/// batched machine translation and a tiered cache keeping translation costs
/// to one pass per video.

pub mod cache;
pub mod captions;
pub mod config;
pub mod error;
pub mod llm;
pub mod metadata;
pub mod orchestrator;
pub mod transcript;
pub mod translation;

#[cfg(feature = "api")]
pub mod api;

// Re-export main types for easy access
pub use crate::cache::{DurableStore, TranscriptCache};
pub use crate::captions::{CaptionFetcher, SourceOutcome, TranscriptSource};
pub use crate::config::Config;
pub use crate::error::{PipelineError, Result};
pub use crate::llm::{LLMConfig, LLMProvider};
pub use crate::metadata::{VideoMetadata, YouTubeMetadataClient};
pub use crate::orchestrator::TranscriptOrchestrator;
pub use crate::transcript::{SourceLabel, Transcript, TranscriptSegment, VideoId};
pub use crate::translation::TranslationEngine;
