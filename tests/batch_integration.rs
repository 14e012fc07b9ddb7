//! Batch runs: ordering, isolation of failures, and per-run timeouts.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{engine_with, SubjectRoutedGenerator};
use setk::services::{BatchConfig, BatchService, OutcomeStatus};
use setk::{ErrorCode, TeacherInput};

async fn service(max_concurrent_runs: usize, run_timeout: Duration) -> BatchService {
    let engine = engine_with(Arc::new(SubjectRoutedGenerator::default()), 1).await;
    BatchService::new(
        Arc::new(engine),
        BatchConfig {
            max_concurrent_runs,
            run_timeout,
        },
    )
}

#[tokio::test]
async fn test_outcomes_follow_input_order() {
    let subjects = ["수학", "영어", "과학", "국어", "사회", "음악"];
    let inputs: Vec<TeacherInput> = subjects
        .iter()
        .enumerate()
        .map(|(i, subject)| {
            TeacherInput::new(*subject, 80, 90)
                .with_student_id(i as i64 + 1)
                .with_name(format!("학생{i}"))
        })
        .collect();

    let report = service(2, Duration::from_secs(10))
        .await
        .run_batch(inputs)
        .await
        .unwrap();

    assert_eq!(report.total(), subjects.len());
    assert_eq!(report.succeeded, subjects.len());
    for (i, outcome) in report.outcomes.iter().enumerate() {
        assert_eq!(outcome.index, i);
        assert_eq!(outcome.subject, subjects[i]);
        assert_eq!(outcome.student_id, Some(i as i64 + 1));
        let record = outcome.record.as_ref().unwrap();
        assert!(record.content.starts_with(subjects[i]));
        assert_eq!(record.version, 1);
    }
}

#[tokio::test]
async fn test_failures_do_not_affect_siblings() {
    let inputs = vec![
        TeacherInput::new("수학", 80, 90),
        TeacherInput::new("오류", 80, 90),
        TeacherInput::new("", 80, 90),
        TeacherInput::new("영어", 70, 85),
    ];

    let report = service(4, Duration::from_secs(10))
        .await
        .run_batch(inputs)
        .await
        .unwrap();

    assert_eq!((report.succeeded, report.failed), (2, 2));

    let statuses: Vec<OutcomeStatus> = report.outcomes.iter().map(|o| o.status).collect();
    assert_eq!(
        statuses,
        vec![
            OutcomeStatus::Success,
            OutcomeStatus::Failed,
            OutcomeStatus::Failed,
            OutcomeStatus::Success,
        ]
    );
    assert_eq!(
        report.outcomes[1].error.as_ref().unwrap().code,
        ErrorCode::GenerationError
    );
    assert_eq!(
        report.outcomes[2].error.as_ref().unwrap().code,
        ErrorCode::InputError
    );
}

#[tokio::test]
async fn test_row_without_score_is_an_input_error() {
    let rows = r#"[
        {"name": "김민수", "subject": "수학", "midterm_score": 85, "final_score": 90},
        {"name": "이서연", "subject": "물리"},
        {"name": "박지훈", "subject": "영어", "midterm_score": 72, "final_score": 0}
    ]"#;
    let inputs: Vec<TeacherInput> = serde_json::from_str(rows).unwrap();

    let report = service(3, Duration::from_secs(10))
        .await
        .run_batch(inputs)
        .await
        .unwrap();

    assert_eq!((report.succeeded, report.failed), (2, 1));
    let missing = &report.outcomes[1];
    assert_eq!(missing.status, OutcomeStatus::Failed);
    assert!(missing.record.is_none());
    let error = missing.error.as_ref().unwrap();
    assert_eq!(error.code, ErrorCode::InputError);
    assert!(error.message.contains("midterm_score"));

    let zero_final = report.outcomes[2].record.as_ref().unwrap();
    assert_eq!(zero_final.version, 1);
}

#[tokio::test]
async fn test_slow_run_times_out_alone() {
    let inputs = vec![
        TeacherInput::new("수학", 80, 90),
        TeacherInput::new("지연", 80, 90),
        TeacherInput::new("과학", 80, 90),
    ];

    let report = service(3, Duration::from_millis(300))
        .await
        .run_batch(inputs)
        .await
        .unwrap();

    assert!(report.outcomes[0].is_success());
    assert!(report.outcomes[2].is_success());

    let slow = &report.outcomes[1];
    assert_eq!(slow.status, OutcomeStatus::Failed);
    assert!(slow.record.is_none());
    assert_eq!(slow.error.as_ref().unwrap().code, ErrorCode::Timeout);
}

#[tokio::test]
async fn test_observer_sees_every_outcome() {
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();
    let service = service(2, Duration::from_secs(10))
        .await
        .with_observer(Arc::new(move |_outcome: &setk::services::StudentOutcome| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

    let inputs = vec![
        TeacherInput::new("수학", 80, 90),
        TeacherInput::new("", 80, 90),
        TeacherInput::new("영어", 80, 90),
    ];
    let report = service.run_batch(inputs).await.unwrap();

    assert_eq!(report.total(), 3);
    assert_eq!(seen.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_empty_batch() {
    let report = service(2, Duration::from_secs(1))
        .await
        .run_batch(Vec::new())
        .await
        .unwrap();
    assert_eq!(report.total(), 0);
    assert_eq!(report.failed, 0);
}
