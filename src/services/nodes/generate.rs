use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use super::{log_usage, WorkflowNode};
use crate::domain::errors::DomainResult;
use crate::domain::models::{
    ErrorCode, GenerationStatus, NarrativeRecord, WorkflowState, WorkflowStep,
};
use crate::domain::ports::TextGenerator;
use crate::services::prompts::build_generation_prompt;

/// Writes the first draft from the input and the retrieved examples.
pub struct GenerateNode {
    generator: Arc<dyn TextGenerator>,
}

impl GenerateNode {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl WorkflowNode for GenerateNode {
    fn step(&self) -> WorkflowStep {
        WorkflowStep::Generate
    }

    async fn run(&self, mut state: WorkflowState) -> DomainResult<WorkflowState> {
        state.teacher_input.validate()?;

        let prompt = build_generation_prompt(&state.teacher_input, &state.retrieved_examples);

        match self.generator.invoke(&prompt).await {
            Ok(generation) => {
                state.add_usage(generation.usage.as_ref());
                log_usage(&state, self.step(), generation.usage.as_ref());

                let record = NarrativeRecord::first(&state.teacher_input, generation.text);
                info!(
                    run_id = %state.run_id,
                    version = record.version,
                    chars = record.char_count(),
                    "narrative generated"
                );
                state.narrative = Some(record);
                state.generation_status = GenerationStatus::Completed;
                state.error = None;
            }
            Err(e) => {
                warn!(run_id = %state.run_id, error = %e, "narrative generation failed");
                state.record_error(ErrorCode::GenerationError, e.to_string());
                state.generation_status = GenerationStatus::Failed;
            }
        }

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::generators::{MockGenerator, MockResponse};
    use crate::domain::errors::DomainError;
    use crate::domain::models::{TeacherInput, TokenUsage};

    #[tokio::test]
    async fn test_generate_writes_version_one() {
        let generator = Arc::new(MockGenerator::scripted([MockResponse::success("수학 세특 본문")]));
        let node = GenerateNode::new(generator.clone());

        let state = WorkflowState::new(TeacherInput::new("수학", 85, 90));
        let state = node.run(state).await.unwrap();

        let narrative = state.narrative.as_ref().unwrap();
        assert_eq!(narrative.version, 1);
        assert_eq!(narrative.content, "수학 세특 본문");
        assert_eq!(state.generation_status, GenerationStatus::Completed);
        assert!(state.error.is_none());
        assert_eq!(state.token_usage, TokenUsage::new(100, 50));
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test]
    async fn test_generate_failure_fills_error_slot() {
        let generator = Arc::new(MockGenerator::scripted([MockResponse::failure("connection reset")]));
        let node = GenerateNode::new(generator);

        let state = node
            .run(WorkflowState::new(TeacherInput::new("수학", 85, 90)))
            .await
            .unwrap();

        assert!(state.narrative.is_none());
        assert_eq!(state.generation_status, GenerationStatus::Failed);
        let error = state.error.unwrap();
        assert_eq!(error.code, ErrorCode::GenerationError);
        assert!(error.message.contains("connection reset"));
    }

    #[tokio::test]
    async fn test_generate_rejects_missing_subject() {
        let generator = Arc::new(MockGenerator::new());
        let node = GenerateNode::new(generator.clone());

        let result = node.run(WorkflowState::new(TeacherInput::new("", 85, 90))).await;
        assert!(matches!(result, Err(DomainError::MissingInput(_))));
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generate_replaces_previous_draft() {
        let generator = Arc::new(MockGenerator::scripted([MockResponse::success("새 초안")]));
        let node = GenerateNode::new(generator);

        let mut state = WorkflowState::new(TeacherInput::new("수학", 85, 90));
        state.narrative = Some(NarrativeRecord::first(&state.teacher_input, "이전 초안"));
        let state = node.run(state).await.unwrap();

        let narrative = state.narrative.unwrap();
        assert_eq!(narrative.content, "새 초안");
        assert_eq!(narrative.version, 1);
    }
}
