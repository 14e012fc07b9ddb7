//! Text generation port.
//!
//! The workflow treats generation as an opaque function: a prompt goes in,
//! text comes out, and token usage rides along when the provider reports it.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::TokenUsage;

/// Result of a single generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

impl Generation {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }

    pub const fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Errors a generation call can raise.
///
/// Callers decide whether to retry; implementations never retry internally.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Generator not configured: {0}")]
    NotConfigured(String),

    #[error("Generator unavailable: {0}")]
    Unavailable(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Generation timed out after {0} seconds")]
    Timeout(u64),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Generation failed: {0}")]
    ExecutionFailed(String),
}

/// Opaque text-generation function.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Provider name (e.g., "openai", "anthropic", "mock").
    fn name(&self) -> &'static str;

    /// Model identifier sent to the provider.
    fn model(&self) -> &str;

    /// Run one prompt to completion.
    async fn invoke(&self, prompt: &str) -> Result<Generation, GenerationError>;
}
