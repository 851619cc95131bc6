//! Provider abstraction for text completion APIs.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("rate limit exceeded")]
    RateLimit,
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("provider error: {0}")]
    Provider(String),
}

/// A text-completion backend. Implementations are thin HTTP wrappers; all
/// retry/fallback policy lives in [`crate::ai::AiService`].
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Provider name (e.g. "openai", "gemini")
    fn name(&self) -> &str;

    /// Run a single completion and return the raw response text
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ProviderError>;
}
