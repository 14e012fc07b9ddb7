//! Example store: the shared, read-mostly pool of reference snippets.

use std::sync::Arc;
use tracing::warn;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ExampleFilter, ReferenceExample};
use crate::domain::ports::VectorBackend;

/// Reference examples shared by every run in the process.
///
/// Search never fails: an unreachable backend yields an empty result so
/// generation can fall back to its generic guideline.
pub struct ExampleStore {
    backend: Arc<dyn VectorBackend>,
}

impl ExampleStore {
    pub fn new(backend: Arc<dyn VectorBackend>) -> Self {
        Self { backend }
    }

    /// Up to `k` examples ranked by similarity to `query`.
    pub async fn search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&ExampleFilter>,
    ) -> Vec<ReferenceExample> {
        if k == 0 {
            return Vec::new();
        }
        let filter = filter.filter(|f| !f.is_empty());

        match self.backend.search(query, k, filter).await {
            Ok(mut results) => {
                results.truncate(k);
                results
            }
            Err(e) => {
                warn!(
                    backend = self.backend.name(),
                    error = %e,
                    "example search failed, continuing without examples"
                );
                Vec::new()
            }
        }
    }

    /// Append examples. No deduplication is performed.
    pub async fn insert(&self, examples: Vec<ReferenceExample>) -> DomainResult<usize> {
        self.backend.insert(examples).await
    }

    pub async fn len(&self) -> usize {
        self.backend.count().await.unwrap_or(0)
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
