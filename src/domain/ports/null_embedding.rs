//! Null embedding provider implementation.
//!
//! Every text maps to the empty vector, so all distances tie and search
//! results come back in insertion order. Used offline and in tests.

use async_trait::async_trait;

use super::embedding::EmbeddingProvider;
use crate::domain::errors::DomainResult;

/// A no-op embedding provider that returns empty vectors.
#[derive(Debug, Clone, Default)]
pub struct NullEmbeddingProvider;

impl NullEmbeddingProvider {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmbeddingProvider for NullEmbeddingProvider {
    fn name(&self) -> &'static str {
        "null"
    }

    async fn embed(&self, _text: &str) -> DomainResult<Vec<f32>> {
        Ok(Vec::new())
    }

    async fn embed_batch(&self, texts: &[String]) -> DomainResult<Vec<Vec<f32>>> {
        Ok(vec![Vec::new(); texts.len()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_provider_one_empty_vector_per_text() {
        let provider = NullEmbeddingProvider::new();
        let texts = ["가".to_string(), "나".to_string()];
        let vectors = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(vectors.len(), 2);
        assert!(vectors.iter().all(Vec::is_empty));
        assert!(provider.embed("다").await.unwrap().is_empty());
    }
}
