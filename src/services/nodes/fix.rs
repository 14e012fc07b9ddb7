use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{log_usage, WorkflowNode};
use crate::domain::errors::DomainResult;
use crate::domain::models::{
    ErrorCode, GenerationStatus, ValidationVerdict, WorkflowState, WorkflowStep,
};
use crate::domain::ports::TextGenerator;
use crate::services::example_retriever::ExampleRetriever;
use crate::services::prompts::{build_fix_prompt, format_improvements};

/// Rewrites a rejected draft using the validator's issues.
pub struct FixNode {
    generator: Arc<dyn TextGenerator>,
    retriever: Arc<ExampleRetriever>,
    fix_k: usize,
    max_fix_attempts: u32,
}

impl FixNode {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        retriever: Arc<ExampleRetriever>,
        fix_k: usize,
        max_fix_attempts: u32,
    ) -> Self {
        Self {
            generator,
            retriever,
            fix_k,
            max_fix_attempts,
        }
    }

    fn fail(state: &mut WorkflowState, message: impl Into<String>) {
        let message = message.into();
        state.fix_attempts += 1;
        state.final_approval = true;
        state.record_error(ErrorCode::FixError, message.clone());
        state.verdict = Some(ValidationVerdict {
            error: Some(message),
            ..ValidationVerdict::forced()
        });
    }
}

#[async_trait]
impl WorkflowNode for FixNode {
    fn step(&self) -> WorkflowStep {
        WorkflowStep::Fix
    }

    async fn run(&self, mut state: WorkflowState) -> DomainResult<WorkflowState> {
        let issues = match state.verdict.as_ref() {
            Some(verdict) if !verdict.is_valid => verdict.issues.clone(),
            _ => {
                debug!(run_id = %state.run_id, "nothing to repair");
                return Ok(state);
            }
        };

        if state.fix_attempts >= self.max_fix_attempts {
            state.verdict = Some(ValidationVerdict::forced());
            state.final_approval = true;
            return Ok(state);
        }

        let Some(current) = state.narrative.clone() else {
            warn!(run_id = %state.run_id, "rejected verdict without a draft");
            Self::fail(&mut state, "no narrative to repair");
            return Ok(state);
        };

        let examples = self
            .retriever
            .get_diverse_examples(&state.teacher_input.subject, self.fix_k)
            .await;
        let improvements = format_improvements(&issues);
        let prompt = build_fix_prompt(
            &state.teacher_input,
            &current.content,
            &improvements,
            &examples,
        );

        match self.generator.invoke(&prompt).await {
            Ok(generation) => {
                state.add_usage(generation.usage.as_ref());
                log_usage(&state, self.step(), generation.usage.as_ref());

                let revised = current.revise(generation.text);
                state.fix_attempts += 1;
                state.generation_status = GenerationStatus::Fixed;
                info!(
                    run_id = %state.run_id,
                    version = revised.version,
                    fix_attempts = state.fix_attempts,
                    examples = examples.len(),
                    "draft repaired"
                );
                state.narrative = Some(revised);

                if state.fix_attempts >= self.max_fix_attempts {
                    state.final_approval = true;
                    state.verdict = Some(ValidationVerdict::repair_committed());
                } else {
                    state.final_approval = false;
                    state.verdict = None;
                }
            }
            Err(e) => {
                warn!(run_id = %state.run_id, error = %e, "repair call failed, keeping current draft");
                Self::fail(&mut state, e.to_string());
            }
        }

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::generators::{MockGenerator, MockResponse};
    use crate::adapters::vector::InMemoryVectorBackend;
    use crate::domain::models::{NarrativeRecord, TeacherInput};
    use crate::domain::ports::NullEmbeddingProvider;
    use crate::services::example_store::ExampleStore;

    fn retriever() -> Arc<ExampleRetriever> {
        let backend = InMemoryVectorBackend::new(Arc::new(NullEmbeddingProvider::new()));
        Arc::new(ExampleRetriever::new(Arc::new(ExampleStore::new(Arc::new(backend)))))
    }

    fn rejected_state() -> WorkflowState {
        let mut state = WorkflowState::new(TeacherInput::new("수학", 85, 90));
        state.narrative = Some(NarrativeRecord::first(&state.teacher_input, "초안"));
        state.verdict = Some(ValidationVerdict::invalid(
            vec!["점수 누락".to_string()],
            "보완 필요",
        ));
        state
    }

    #[tokio::test]
    async fn test_repair_bumps_version_and_commits_at_cap() {
        let generator = Arc::new(MockGenerator::scripted([MockResponse::success("수정본")]));
        let node = FixNode::new(generator.clone(), retriever(), 2, 1);

        let state = node.run(rejected_state()).await.unwrap();

        let narrative = state.narrative.as_ref().unwrap();
        assert_eq!(narrative.version, 2);
        assert_eq!(narrative.content, "수정본");
        assert_eq!(state.fix_attempts, 1);
        assert_eq!(state.generation_status, GenerationStatus::Fixed);
        assert!(state.final_approval);
        assert!(state.verdict.unwrap().is_valid);
        assert!(generator.prompts()[0].contains("점수 누락"));
    }

    #[tokio::test]
    async fn test_repair_below_cap_requests_revalidation() {
        let generator = Arc::new(MockGenerator::scripted([MockResponse::success("수정본")]));
        let node = FixNode::new(generator, retriever(), 2, 3);

        let state = node.run(rejected_state()).await.unwrap();
        assert_eq!(state.fix_attempts, 1);
        assert!(!state.final_approval);
        assert!(state.verdict.is_none());
    }

    #[tokio::test]
    async fn test_valid_verdict_is_a_no_op() {
        let generator = Arc::new(MockGenerator::new());
        let node = FixNode::new(generator.clone(), retriever(), 2, 1);

        let mut state = rejected_state();
        state.verdict = Some(ValidationVerdict::valid("좋음"));
        let before = state.clone();
        let after = node.run(state).await.unwrap();

        assert_eq!(before, after);
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_repair_keeps_draft_and_forces() {
        let generator = Arc::new(MockGenerator::scripted([MockResponse::failure("timeout")]));
        let node = FixNode::new(generator, retriever(), 2, 1);

        let state = node.run(rejected_state()).await.unwrap();

        assert_eq!(state.narrative.as_ref().unwrap().version, 1);
        assert_eq!(state.fix_attempts, 1);
        assert!(state.final_approval);
        assert_eq!(state.error.as_ref().unwrap().code, ErrorCode::FixError);
        let verdict = state.verdict.unwrap();
        assert!(verdict.forced_approval);
        assert!(verdict.error.is_some());
    }

    #[tokio::test]
    async fn test_spent_budget_forces_without_call() {
        let generator = Arc::new(MockGenerator::new());
        let node = FixNode::new(generator.clone(), retriever(), 2, 1);

        let mut state = rejected_state();
        state.fix_attempts = 1;
        let state = node.run(state).await.unwrap();

        assert_eq!(generator.call_count(), 0);
        assert!(state.is_forced_approval());
        assert_eq!(state.narrative_version(), Some(1));
    }
}
