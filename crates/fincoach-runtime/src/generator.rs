//! Text-generation collaborator trait.
//!
//! The judge needs a language model; this crate does not ship one. Callers
//! inject whatever backend they run — an HTTP provider, a local model, a
//! test double — behind this trait.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors from an injected generator.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    RequestFailed(String),

    #[error("rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("timeout after {0:?}")]
    Timeout(Duration),

    #[error("generator not configured: {0}")]
    NotConfigured(String),
}

/// A language-model text generator.
///
/// This is the ONLY seam through which the judge reaches a model. The
/// Guardian never calls this; it consumes parsed reports only.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for the given prompts.
    async fn generate(&self, system_prompt: &str, user_prompt: &str)
        -> Result<String, GenerationError>;

    /// Backend name for logging and metrics.
    fn name(&self) -> &str;
}
