use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{log_usage, WorkflowNode};
use crate::domain::errors::DomainResult;
use crate::domain::models::{ValidationVerdict, WorkflowState, WorkflowStep};
use crate::domain::ports::TextGenerator;
use crate::services::prompts::build_validation_prompt;
use crate::services::verdict_parser::parse_verdict;

/// Reviews the current draft and decides whether it needs a repair.
///
/// Never fails the run: an unreachable or unreadable validator approves the
/// draft with a marked verdict instead.
pub struct ValidateNode {
    generator: Arc<dyn TextGenerator>,
    max_fix_attempts: u32,
}

impl ValidateNode {
    pub fn new(generator: Arc<dyn TextGenerator>, max_fix_attempts: u32) -> Self {
        Self {
            generator,
            max_fix_attempts,
        }
    }
}

#[async_trait]
impl WorkflowNode for ValidateNode {
    fn step(&self) -> WorkflowStep {
        WorkflowStep::Validate
    }

    async fn run(&self, mut state: WorkflowState) -> DomainResult<WorkflowState> {
        if state.fix_attempts >= self.max_fix_attempts {
            info!(
                run_id = %state.run_id,
                fix_attempts = state.fix_attempts,
                "repair budget spent, approving current draft"
            );
            state.verdict = Some(ValidationVerdict::forced());
            state.final_approval = true;
            return Ok(state);
        }

        if state.final_approval {
            debug!(run_id = %state.run_id, "draft already approved");
            return Ok(state);
        }

        let Some(draft) = state.narrative.as_ref().map(|n| n.content.clone()) else {
            state.verdict = Some(ValidationVerdict::pass_through("no narrative to validate"));
            state.final_approval = true;
            return Ok(state);
        };

        let prompt = build_validation_prompt(&state.teacher_input, &draft);

        match self.generator.invoke(&prompt).await {
            Ok(generation) => {
                state.add_usage(generation.usage.as_ref());
                log_usage(&state, self.step(), generation.usage.as_ref());

                let verdict = parse_verdict(&generation.text);
                if verdict.parse_fallback {
                    warn!(
                        run_id = %state.run_id,
                        reason = verdict.error.as_deref().unwrap_or_default(),
                        "validator reply unreadable, passing draft"
                    );
                } else if !verdict.is_valid {
                    let input = &state.teacher_input;
                    warn!(
                        run_id = %state.run_id,
                        student = input.display_name(),
                        subject = %input.subject,
                        midterm = input.midterm_score,
                        final_score = input.final_score,
                        notes = input.notes_or_none(),
                        draft = %draft,
                        summary = %verdict.summary,
                        issues = ?verdict.issues,
                        "validation rejected draft"
                    );
                } else {
                    info!(run_id = %state.run_id, summary = %verdict.summary, "validation passed");
                }

                state.final_approval = verdict.is_valid;
                state.verdict = Some(verdict);
            }
            Err(e) => {
                warn!(run_id = %state.run_id, error = %e, "validation call failed, passing draft");
                state.verdict = Some(ValidationVerdict::pass_through(e.to_string()));
                state.final_approval = true;
            }
        }

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::generators::{MockGenerator, MockResponse};
    use crate::domain::models::{NarrativeRecord, TeacherInput};

    fn drafted_state() -> WorkflowState {
        let mut state = WorkflowState::new(TeacherInput::new("수학", 85, 90));
        state.narrative = Some(NarrativeRecord::first(&state.teacher_input, "초안"));
        state
    }

    #[tokio::test]
    async fn test_valid_reply_approves() {
        let generator = Arc::new(MockGenerator::scripted([MockResponse::success(
            r#"{"is_valid": true, "issues": [], "summary": "좋음"}"#,
        )]));
        let node = ValidateNode::new(generator, 1);

        let state = node.run(drafted_state()).await.unwrap();
        assert!(state.final_approval);
        let verdict = state.verdict.unwrap();
        assert!(verdict.is_valid);
        assert_eq!(verdict.summary, "좋음");
    }

    #[tokio::test]
    async fn test_invalid_reply_leaves_approval_off() {
        let generator = Arc::new(MockGenerator::scripted([MockResponse::success(
            r#"{"is_valid": false, "issues": ["점수 누락"], "summary": "보완 필요"}"#,
        )]));
        let node = ValidateNode::new(generator, 1);

        let state = node.run(drafted_state()).await.unwrap();
        assert!(!state.final_approval);
        assert_eq!(state.verdict.unwrap().issues, vec!["점수 누락"]);
    }

    #[tokio::test]
    async fn test_spent_budget_forces_without_call() {
        let generator = Arc::new(MockGenerator::new());
        let node = ValidateNode::new(generator.clone(), 1);

        let mut state = drafted_state();
        state.fix_attempts = 1;
        let state = node.run(state).await.unwrap();

        assert_eq!(generator.call_count(), 0);
        assert!(state.final_approval);
        assert!(state.is_forced_approval());
    }

    #[tokio::test]
    async fn test_already_approved_is_untouched() {
        let generator = Arc::new(MockGenerator::new());
        let node = ValidateNode::new(generator.clone(), 2);

        let mut state = drafted_state();
        state.final_approval = true;
        state.verdict = Some(ValidationVerdict::valid("이전 판정"));
        let state = node.run(state).await.unwrap();

        assert_eq!(generator.call_count(), 0);
        assert_eq!(state.verdict.unwrap().summary, "이전 판정");
    }

    #[tokio::test]
    async fn test_call_failure_passes_through() {
        let generator = Arc::new(MockGenerator::scripted([MockResponse::failure("503")]));
        let node = ValidateNode::new(generator, 1);

        let state = node.run(drafted_state()).await.unwrap();
        assert!(state.final_approval);
        let verdict = state.verdict.unwrap();
        assert!(verdict.is_valid);
        assert!(verdict.error.unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_missing_narrative_skips_call() {
        let generator = Arc::new(MockGenerator::new());
        let node = ValidateNode::new(generator.clone(), 1);

        let state = node
            .run(WorkflowState::new(TeacherInput::new("수학", 85, 90)))
            .await
            .unwrap();

        assert_eq!(generator.call_count(), 0);
        assert!(state.final_approval);
        assert!(state.verdict.unwrap().is_valid);
    }

    #[tokio::test]
    async fn test_garbage_reply_falls_back_to_pass() {
        let generator = Arc::new(MockGenerator::scripted([MockResponse::success("검토 완료!")]));
        let node = ValidateNode::new(generator, 1);

        let state = node.run(drafted_state()).await.unwrap();
        assert!(state.final_approval);
        assert!(state.verdict.unwrap().parse_fallback);
    }
}
