//! Runs the workflow for many students with bounded concurrency.
//!
//! Each student gets an isolated run with its own timeout. A failing or
//! timed-out student never affects the others, and outcomes come back in
//! input order.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    ErrorCode, ErrorInfo, NarrativeRecord, TeacherInput, TokenUsage, ValidationVerdict,
    WorkflowState,
};
use crate::services::workflow_engine::WorkflowEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Failed,
}

/// Per-student result of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct StudentOutcome {
    /// Position in the submitted batch
    pub index: usize,
    pub student_id: Option<i64>,
    pub name: String,
    pub subject: String,
    pub status: OutcomeStatus,
    pub record: Option<NarrativeRecord>,
    pub verdict: Option<ValidationVerdict>,
    pub error: Option<ErrorInfo>,
    pub forced_approval: bool,
    pub fix_attempts: u32,
    pub token_usage: TokenUsage,
}

impl StudentOutcome {
    fn base(index: usize, input: &TeacherInput) -> Self {
        Self {
            index,
            student_id: input.student_id,
            name: input.name.clone(),
            subject: input.subject.clone(),
            status: OutcomeStatus::Failed,
            record: None,
            verdict: None,
            error: None,
            forced_approval: false,
            fix_attempts: 0,
            token_usage: TokenUsage::default(),
        }
    }

    /// Outcome of a finished run. Success means a narrative exists.
    pub fn from_state(index: usize, state: WorkflowState) -> Self {
        let mut outcome = Self::base(index, &state.teacher_input);
        outcome.forced_approval = state.is_forced_approval();
        outcome.fix_attempts = state.fix_attempts;
        outcome.token_usage = state.token_usage;
        outcome.verdict = state.verdict;
        outcome.error = state.error;

        if state.narrative.is_some() {
            outcome.status = OutcomeStatus::Success;
            outcome.record = state.narrative;
        } else if outcome.error.is_none() {
            outcome.error = Some(ErrorInfo::new(
                ErrorCode::GenerationError,
                "run ended without a narrative",
            ));
        }
        outcome
    }

    pub fn failed(index: usize, input: &TeacherInput, error: ErrorInfo) -> Self {
        Self {
            error: Some(error),
            ..Self::base(index, input)
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

/// Classify an error that stopped a run before it produced a state.
fn error_info(err: &DomainError) -> ErrorInfo {
    let code = match err {
        DomainError::MissingInput(_) | DomainError::InvalidInput(_) => ErrorCode::InputError,
        _ => ErrorCode::InternalError,
    };
    ErrorInfo::new(code, err.to_string())
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<StudentOutcome>,
    pub succeeded: usize,
    pub failed: usize,
    pub token_usage: TokenUsage,
}

impl BatchReport {
    pub fn from_outcomes(outcomes: Vec<StudentOutcome>) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        let mut token_usage = TokenUsage::default();
        for outcome in &outcomes {
            token_usage.accumulate(&outcome.token_usage);
        }
        Self {
            failed: outcomes.len() - succeeded,
            succeeded,
            outcomes,
            token_usage,
        }
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

/// Called once per finished student, in completion order.
pub type OutcomeObserver = Arc<dyn Fn(&StudentOutcome) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    pub max_concurrent_runs: usize,
    pub run_timeout: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_runs: 8,
            run_timeout: Duration::from_secs(300),
        }
    }
}

pub struct BatchService {
    engine: Arc<WorkflowEngine>,
    config: BatchConfig,
    observer: Option<OutcomeObserver>,
}

impl BatchService {
    pub fn new(engine: Arc<WorkflowEngine>, config: BatchConfig) -> Self {
        Self {
            engine,
            config,
            observer: None,
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: OutcomeObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn engine(&self) -> &Arc<WorkflowEngine> {
        &self.engine
    }

    /// Run every input and collect outcomes in input order.
    pub async fn run_batch(&self, inputs: Vec<TeacherInput>) -> DomainResult<BatchReport> {
        info!(
            students = inputs.len(),
            max_concurrent = self.config.max_concurrent_runs,
            "starting batch"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_runs.max(1)));
        let mut handles = Vec::with_capacity(inputs.len());

        for (index, input) in inputs.into_iter().enumerate() {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| DomainError::ExecutionFailed("batch semaphore closed".to_string()))?;

            let engine = self.engine.clone();
            let observer = self.observer.clone();
            let run_timeout = self.config.run_timeout;
            let fallback = input.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                let outcome = run_one(&engine, index, input, run_timeout).await;
                if let Some(observer) = observer {
                    observer(&outcome);
                }
                outcome
            });

            handles.push((index, fallback, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (index, input, handle) in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    warn!(index, error = %e, "student run aborted");
                    let outcome = StudentOutcome::failed(
                        index,
                        &input,
                        ErrorInfo::new(ErrorCode::InternalError, e.to_string()),
                    );
                    if let Some(observer) = &self.observer {
                        observer(&outcome);
                    }
                    outcomes.push(outcome);
                }
            }
        }

        let report = BatchReport::from_outcomes(outcomes);
        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            total_tokens = report.token_usage.total(),
            "batch finished"
        );
        Ok(report)
    }
}

async fn run_one(
    engine: &WorkflowEngine,
    index: usize,
    input: TeacherInput,
    run_timeout: Duration,
) -> StudentOutcome {
    let fallback = input.clone();
    match tokio::time::timeout(run_timeout, engine.run(input)).await {
        Ok(Ok(state)) => StudentOutcome::from_state(index, state),
        Ok(Err(e)) => {
            warn!(index, subject = %fallback.subject, error = %e, "student run rejected");
            StudentOutcome::failed(index, &fallback, error_info(&e))
        }
        Err(_) => {
            warn!(index, subject = %fallback.subject, "student run timed out");
            StudentOutcome::failed(
                index,
                &fallback,
                ErrorInfo::new(
                    ErrorCode::Timeout,
                    format!("run exceeded {} seconds", run_timeout.as_secs()),
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::NarrativeRecord;

    #[test]
    fn test_outcome_success_requires_narrative() {
        let input = TeacherInput::new("수학", 80, 90);
        let mut state = WorkflowState::new(input.clone());
        state.record_error(ErrorCode::GenerationError, "boom");
        let outcome = StudentOutcome::from_state(0, state);
        assert!(!outcome.is_success());
        assert_eq!(outcome.error.unwrap().code, ErrorCode::GenerationError);

        let mut state = WorkflowState::new(input);
        state.narrative = Some(NarrativeRecord::first(&state.teacher_input, "본문"));
        let outcome = StudentOutcome::from_state(1, state);
        assert!(outcome.is_success());
        assert_eq!(outcome.index, 1);
    }

    #[test]
    fn test_missing_input_maps_to_input_error() {
        let info = error_info(&DomainError::MissingInput("subject".to_string()));
        assert_eq!(info.code, ErrorCode::InputError);
        let info = error_info(&DomainError::ExecutionFailed("x".to_string()));
        assert_eq!(info.code, ErrorCode::InternalError);
    }

    #[test]
    fn test_report_counts() {
        let input = TeacherInput::new("수학", 80, 90);
        let ok = StudentOutcome {
            status: OutcomeStatus::Success,
            token_usage: TokenUsage::new(10, 5),
            ..StudentOutcome::base(0, &input)
        };
        let bad = StudentOutcome::failed(1, &input, ErrorInfo::new(ErrorCode::Timeout, "t"));
        let report = BatchReport::from_outcomes(vec![ok, bad]);
        assert_eq!((report.succeeded, report.failed, report.total()), (1, 1, 2));
        assert_eq!(report.token_usage.total(), 15);
    }
}
