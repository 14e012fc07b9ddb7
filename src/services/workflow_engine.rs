//! Drives one student through prepare, generate, validate and fix.
//!
//! The engine owns the step machine. Nodes only transform state; the engine
//! decides what runs next and guarantees the run ends within a bounded
//! number of steps.

use std::sync::Arc;

use tracing::{info, instrument, warn, Span};

use crate::domain::errors::DomainResult;
use crate::domain::models::{Config, TeacherInput, ValidationVerdict, WorkflowState, WorkflowStep};
use crate::domain::ports::TextGenerator;
use crate::services::example_retriever::ExampleRetriever;
use crate::services::nodes::{FixNode, GenerateNode, PrepareNode, ValidateNode, WorkflowNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowEngineConfig {
    /// Examples retrieved for the first draft
    pub k: usize,
    /// Examples retrieved for each repair
    pub fix_k: usize,
    pub max_fix_attempts: u32,
}

impl Default for WorkflowEngineConfig {
    fn default() -> Self {
        Self {
            k: 3,
            fix_k: 2,
            max_fix_attempts: 1,
        }
    }
}

impl From<&Config> for WorkflowEngineConfig {
    fn from(config: &Config) -> Self {
        Self {
            k: config.retrieval.k,
            fix_k: config.retrieval.fix_k,
            max_fix_attempts: config.workflow.max_fix_attempts,
        }
    }
}

impl WorkflowEngineConfig {
    /// Upper bound on executed steps: prepare, generate, validate, then one
    /// fix and one validate per allowed repair.
    pub const fn max_steps(&self) -> usize {
        3 + 2 * self.max_fix_attempts as usize
    }
}

pub struct WorkflowEngine {
    prepare: PrepareNode,
    generate: GenerateNode,
    validate: ValidateNode,
    fix: FixNode,
    config: WorkflowEngineConfig,
}

impl WorkflowEngine {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        retriever: Arc<ExampleRetriever>,
        config: WorkflowEngineConfig,
    ) -> Self {
        Self {
            prepare: PrepareNode::new(retriever.clone(), config.k),
            generate: GenerateNode::new(generator.clone()),
            validate: ValidateNode::new(generator.clone(), config.max_fix_attempts),
            fix: FixNode::new(generator, retriever, config.fix_k, config.max_fix_attempts),
            config,
        }
    }

    pub const fn config(&self) -> &WorkflowEngineConfig {
        &self.config
    }

    fn node(&self, step: WorkflowStep) -> Option<&dyn WorkflowNode> {
        match step {
            WorkflowStep::Prepare => Some(&self.prepare),
            WorkflowStep::Generate => Some(&self.generate),
            WorkflowStep::Validate => Some(&self.validate),
            WorkflowStep::Fix => Some(&self.fix),
            WorkflowStep::End => None,
        }
    }

    /// Run the full workflow for one student.
    ///
    /// Returns `Err` only for missing required input. Generation, validation
    /// and repair failures are reported in the returned state.
    #[instrument(
        name = "workflow_run",
        skip(self, input),
        fields(subject = %input.subject, run_id = tracing::field::Empty)
    )]
    pub async fn run(&self, input: TeacherInput) -> DomainResult<WorkflowState> {
        input.validate()?;

        let mut state = WorkflowState::new(input);
        Span::current().record("run_id", tracing::field::display(state.run_id));

        let max_steps = self.config.max_steps();
        let mut step = WorkflowStep::Prepare;

        while let Some(node) = self.node(step) {
            if state.trace.len() >= max_steps {
                warn!(
                    run_id = %state.run_id,
                    steps = state.trace.len(),
                    pending = %step,
                    "step limit reached, approving current draft"
                );
                state.final_approval = true;
                if state.verdict.as_ref().is_none_or(|v| !v.is_valid) {
                    state.verdict = Some(ValidationVerdict::forced());
                }
                break;
            }

            state.trace.push(step);
            state = node.run(state).await?;
            step = step.next(&state, self.config.max_fix_attempts);
        }

        info!(
            run_id = %state.run_id,
            status = state.generation_status.as_str(),
            version = ?state.narrative_version(),
            fix_attempts = state.fix_attempts,
            forced = state.is_forced_approval(),
            total_tokens = state.token_usage.total(),
            "workflow finished"
        );

        Ok(state)
    }
}
