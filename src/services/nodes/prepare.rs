use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::WorkflowNode;
use crate::domain::errors::DomainResult;
use crate::domain::models::{GenerationStatus, WorkflowState, WorkflowStep};
use crate::services::example_retriever::{ExampleQuery, ExampleRetriever};

/// Retrieves reference examples for the first draft.
pub struct PrepareNode {
    retriever: Arc<ExampleRetriever>,
    k: usize,
}

impl PrepareNode {
    pub fn new(retriever: Arc<ExampleRetriever>, k: usize) -> Self {
        Self { retriever, k }
    }
}

#[async_trait]
impl WorkflowNode for PrepareNode {
    fn step(&self) -> WorkflowStep {
        WorkflowStep::Prepare
    }

    async fn run(&self, mut state: WorkflowState) -> DomainResult<WorkflowState> {
        let query = ExampleQuery::from(&state.teacher_input);
        let retrieved = self.retriever.search_examples(&query, self.k).await;

        info!(
            run_id = %state.run_id,
            query = %retrieved.query,
            found = retrieved.texts.len(),
            "reference examples prepared"
        );

        state.search_query = Some(retrieved.query);
        state.retrieved_examples = retrieved.texts;
        state.generation_status = GenerationStatus::InProgress;
        Ok(state)
    }
}
