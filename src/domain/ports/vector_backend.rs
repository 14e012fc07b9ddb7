//! Nearest-neighbour search port for reference examples.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ExampleFilter, ReferenceExample};

/// Backend that ranks stored examples by similarity to a free-text query.
#[async_trait]
pub trait VectorBackend: Send + Sync {
    /// Backend name used in logs.
    fn name(&self) -> &'static str;

    /// Return at most `k` examples, most similar first.
    ///
    /// A filter that matches nothing yields fewer results, not an error.
    /// Errors mean the backend itself could not be reached.
    async fn search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&ExampleFilter>,
    ) -> DomainResult<Vec<ReferenceExample>>;

    /// Append examples; they are searchable as soon as this returns.
    async fn insert(&self, examples: Vec<ReferenceExample>) -> DomainResult<usize>;

    /// Number of stored examples.
    async fn count(&self) -> DomainResult<usize>;
}
