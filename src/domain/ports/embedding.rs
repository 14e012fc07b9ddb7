//! Embedding provider port.
//!
//! Turns example texts and retrieval queries into dense vectors for the
//! in-process example backend.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider name (e.g., "openai", "null").
    fn name(&self) -> &'static str;

    /// Embed a retrieval query.
    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>>;

    /// Embed example texts, one vector per text in input order.
    async fn embed_batch(&self, texts: &[String]) -> DomainResult<Vec<Vec<f32>>>;
}
