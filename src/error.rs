//! Error types surfaced by the transcript pipeline

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can reach a caller of the pipeline.
///
/// Most upstream failures never get this far: unavailable captions, degraded
/// translations and an unreachable durable cache are all recovered inside the
/// pipeline and only logged. The variants carry strings so that a result can
/// be shared between concurrent waiters on the same computation.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("No transcript source produced data for {0}")]
    SourceUnavailable(String),

    #[error("Cache write failed: {0}")]
    CacheWriteFailed(String),

    #[error("Metadata lookup failed: {0}")]
    Metadata(String),

    #[error("Video not found: {0}")]
    VideoNotFound(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Transcript task failed: {0}")]
    TaskFailed(String),
}

impl PipelineError {
    /// Whether the error was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(self, PipelineError::InvalidRequest(_) | PipelineError::VideoNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(PipelineError::InvalidRequest("empty".to_string()).is_client_error());
        assert!(!PipelineError::SourceUnavailable("abc".to_string()).is_client_error());
        assert!(!PipelineError::TaskFailed("panicked".to_string()).is_client_error());
    }

    #[test]
    fn test_error_display() {
        let err = PipelineError::InvalidRequest("Video ID is required".to_string());
        assert_eq!(err.to_string(), "Invalid request: Video ID is required");
    }
}
