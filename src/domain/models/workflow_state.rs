//! Run state threaded through every workflow step, and the step machine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::narrative::NarrativeRecord;
use super::teacher_input::TeacherInput;
use super::usage::TokenUsage;
use super::verdict::ValidationVerdict;

/// Progress of the narrative artifact within a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Fixed,
    Failed,
}

impl GenerationStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Fixed => "fixed",
            Self::Failed => "failed",
        }
    }
}

/// Machine-readable failure category surfaced through the error slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InputError,
    GenerationError,
    FixError,
    Timeout,
    InternalError,
}

impl ErrorCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InputError => "INPUT_ERROR",
            Self::GenerationError => "GENERATION_ERROR",
            Self::FixError => "FIX_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// States of the workflow machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    Prepare,
    Generate,
    Validate,
    Fix,
    End,
}

impl WorkflowStep {
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::End)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Prepare => "prepare",
            Self::Generate => "generate",
            Self::Validate => "validate",
            Self::Fix => "fix",
            Self::End => "end",
        }
    }

    /// Transition taken after this step has run against `state`.
    ///
    /// The only branch point is after validation. The repair counter is
    /// checked before verdict validity so a verdict read after the cap can
    /// never send the run back into repair.
    pub fn next(self, state: &WorkflowState, max_fix_attempts: u32) -> Self {
        match self {
            Self::Prepare => Self::Generate,
            Self::Generate | Self::Fix => Self::Validate,
            Self::Validate => {
                if state.final_approval || state.fix_attempts >= max_fix_attempts {
                    return Self::End;
                }
                match &state.verdict {
                    Some(verdict) if !verdict.is_valid => Self::Fix,
                    _ => Self::End,
                }
            }
            Self::End => Self::End,
        }
    }
}

impl std::fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared record threaded through every step of one run.
///
/// Owned by exactly one run. Each step takes it by value and hands back the
/// updated record. `fix_attempts` only ever grows and is the sole bound on the
/// generate/validate cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub run_id: Uuid,
    pub teacher_input: TeacherInput,
    pub narrative: Option<NarrativeRecord>,
    pub verdict: Option<ValidationVerdict>,
    pub fix_attempts: u32,
    /// True once the run has committed to its result
    pub final_approval: bool,
    pub retrieved_examples: Vec<String>,
    pub search_query: Option<String>,
    pub generation_status: GenerationStatus,
    pub error: Option<ErrorInfo>,
    pub token_usage: TokenUsage,
    /// Steps executed so far, in order
    pub trace: Vec<WorkflowStep>,
}

impl WorkflowState {
    pub fn new(teacher_input: TeacherInput) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            teacher_input,
            narrative: None,
            verdict: None,
            fix_attempts: 0,
            final_approval: false,
            retrieved_examples: Vec::new(),
            search_query: None,
            generation_status: GenerationStatus::Pending,
            error: None,
            token_usage: TokenUsage::default(),
            trace: Vec::new(),
        }
    }

    pub fn record_error(&mut self, code: ErrorCode, message: impl Into<String>) {
        self.error = Some(ErrorInfo::new(code, message));
    }

    pub fn add_usage(&mut self, usage: Option<&TokenUsage>) {
        if let Some(usage) = usage {
            self.token_usage.accumulate(usage);
        }
    }

    pub fn is_forced_approval(&self) -> bool {
        self.verdict.as_ref().is_some_and(|v| v.forced_approval)
    }

    pub fn narrative_version(&self) -> Option<u32> {
        self.narrative.as_ref().map(|n| n.version)
    }

    /// Number of repairs that actually rewrote the narrative.
    pub fn repairs_applied(&self) -> u32 {
        self.narrative_version().map_or(0, |v| v.saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> WorkflowState {
        WorkflowState::new(TeacherInput::new("수학", 85, 90))
    }

    #[test]
    fn test_new_state_defaults() {
        let s = state();
        assert_eq!(s.fix_attempts, 0);
        assert!(!s.final_approval);
        assert!(s.narrative.is_none());
        assert!(s.verdict.is_none());
        assert!(s.error.is_none());
        assert_eq!(s.generation_status, GenerationStatus::Pending);
    }

    #[test]
    fn test_unconditional_transitions() {
        let s = state();
        assert_eq!(WorkflowStep::Prepare.next(&s, 1), WorkflowStep::Generate);
        assert_eq!(WorkflowStep::Generate.next(&s, 1), WorkflowStep::Validate);
        assert_eq!(WorkflowStep::Fix.next(&s, 1), WorkflowStep::Validate);
        assert_eq!(WorkflowStep::End.next(&s, 1), WorkflowStep::End);
        assert!(WorkflowStep::End.is_terminal());
        assert!(!WorkflowStep::Validate.is_terminal());
    }

    #[test]
    fn test_validate_routes_invalid_to_fix() {
        let mut s = state();
        s.verdict = Some(ValidationVerdict::invalid(vec!["학생 이름 누락".into()], ""));
        assert_eq!(WorkflowStep::Validate.next(&s, 1), WorkflowStep::Fix);
    }

    #[test]
    fn test_validate_routes_valid_to_end() {
        let mut s = state();
        s.verdict = Some(ValidationVerdict::valid("ok"));
        s.final_approval = true;
        assert_eq!(WorkflowStep::Validate.next(&s, 1), WorkflowStep::End);
    }

    #[test]
    fn test_counter_checked_before_validity() {
        let mut s = state();
        s.verdict = Some(ValidationVerdict::invalid(vec!["x".into()], ""));
        s.fix_attempts = 1;
        assert_eq!(WorkflowStep::Validate.next(&s, 1), WorkflowStep::End);
        // A larger budget leaves room for another repair.
        assert_eq!(WorkflowStep::Validate.next(&s, 2), WorkflowStep::Fix);
    }

    #[test]
    fn test_approval_ends_even_with_invalid_verdict() {
        let mut s = state();
        s.verdict = Some(ValidationVerdict::invalid(vec!["x".into()], ""));
        s.final_approval = true;
        assert_eq!(WorkflowStep::Validate.next(&s, 1), WorkflowStep::End);
    }

    #[test]
    fn test_missing_verdict_ends() {
        assert_eq!(WorkflowStep::Validate.next(&state(), 1), WorkflowStep::End);
    }

    #[test]
    fn test_error_code_serialization() {
        let info = ErrorInfo::new(ErrorCode::GenerationError, "boom");
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["code"], "GENERATION_ERROR");
        assert_eq!(ErrorCode::FixError.as_str(), "FIX_ERROR");
    }

    #[test]
    fn test_repairs_applied() {
        let mut s = state();
        assert_eq!(s.repairs_applied(), 0);
        let first = NarrativeRecord::first(&s.teacher_input, "a");
        s.narrative = Some(first.revise("b"));
        assert_eq!(s.repairs_applied(), 1);
    }
}
