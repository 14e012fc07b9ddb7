//! In-process vector backend.
//!
//! Embeds every example on insert and ranks by cosine distance at query
//! time. Ties keep insertion order, so with the null embedding provider the
//! backend degrades to a filtered list in load order.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ExampleFilter, ReferenceExample};
use crate::domain::ports::{EmbeddingProvider, VectorBackend};

/// Cosine distance between two vectors (0.0 = identical direction).
///
/// Mismatched lengths and zero vectors are maximally distant.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::MAX;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return f32::MAX;
    }

    1.0 - (dot / (mag_a * mag_b))
}

struct IndexedExample {
    example: ReferenceExample,
    vector: Vec<f32>,
}

/// Vector backend holding every example in memory.
pub struct InMemoryVectorBackend {
    embedder: Arc<dyn EmbeddingProvider>,
    entries: RwLock<Vec<IndexedExample>>,
}

impl InMemoryVectorBackend {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            entries: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl VectorBackend for InMemoryVectorBackend {
    fn name(&self) -> &'static str {
        "in_memory"
    }

    async fn search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&ExampleFilter>,
    ) -> DomainResult<Vec<ReferenceExample>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed(query).await?;
        let entries = self.entries.read().await;

        let mut scored: Vec<(f32, &IndexedExample)> = entries
            .iter()
            .filter(|entry| filter.is_none_or(|f| f.matches(&entry.example.metadata)))
            .map(|entry| (cosine_distance(&query_vector, &entry.vector), entry))
            .collect();

        // Stable sort: equal distances stay in insertion order
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(_, entry)| entry.example.clone())
            .collect())
    }

    async fn insert(&self, examples: Vec<ReferenceExample>) -> DomainResult<usize> {
        if examples.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = examples.iter().map(|example| example.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != examples.len() {
            return Err(DomainError::EmbeddingFailed(format!(
                "{} embeddings returned for {} examples",
                vectors.len(),
                examples.len()
            )));
        }

        let inserted = examples.len();
        let mut entries = self.entries.write().await;
        entries.extend(
            examples
                .into_iter()
                .zip(vectors)
                .map(|(example, vector)| IndexedExample { example, vector }),
        );

        tracing::debug!(
            inserted,
            total = entries.len(),
            embedder = self.embedder.name(),
            "examples indexed"
        );
        Ok(inserted)
    }

    async fn count(&self) -> DomainResult<usize> {
        Ok(self.entries.read().await.len())
    }
}
