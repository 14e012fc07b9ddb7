//! Workflow steps.
//!
//! Each node takes the run state by value and returns the updated state.
//! Only missing required input escapes as an error; every other failure is
//! written into the state so the run can still reach its end.

pub mod fix;
pub mod generate;
pub mod prepare;
pub mod validate;

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{TokenUsage, WorkflowState, WorkflowStep};

pub use fix::FixNode;
pub use generate::GenerateNode;
pub use prepare::PrepareNode;
pub use validate::ValidateNode;

#[async_trait]
pub trait WorkflowNode: Send + Sync {
    /// The machine state this node implements.
    fn step(&self) -> WorkflowStep;

    async fn run(&self, state: WorkflowState) -> DomainResult<WorkflowState>;
}

pub(crate) fn log_usage(state: &WorkflowState, step: WorkflowStep, usage: Option<&TokenUsage>) {
    if let Some(usage) = usage {
        tracing::debug!(
            run_id = %state.run_id,
            step = %step,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            total_tokens = state.token_usage.total(),
            "generation token usage"
        );
    }
}
