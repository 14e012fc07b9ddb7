//! Property tests: every run terminates within its step bound, versions only
//! move forward, and no validator reply can break verdict parsing.

mod common;

use proptest::prelude::*;
use std::sync::Arc;

use common::{mock_engine, INVALID_VERDICT, VALID_VERDICT};
use setk::adapters::generators::{MockGenerator, MockResponse};
use setk::services::parse_verdict;
use setk::{NarrativeRecord, TeacherInput, WorkflowStep};

fn reply() -> impl Strategy<Value = MockResponse> {
    prop_oneof![
        Just(MockResponse::success(VALID_VERDICT)),
        Just(MockResponse::success(INVALID_VERDICT)),
        Just(MockResponse::failure("network down")),
        "[가-힣 .]{0,40}".prop_map(MockResponse::success),
        "\\PC{0,60}".prop_map(MockResponse::success),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: any mix of replies ends in approval within 3 + 2 * cap steps
    #[test]
    fn prop_run_terminates_within_bound(
        script in prop::collection::vec(reply(), 0..12),
        cap in 1u32..=3,
    ) {
        let generator = Arc::new(MockGenerator::scripted(script));
        let state = runtime().block_on(async {
            let engine = mock_engine(&generator, cap).await;
            engine.run(TeacherInput::new("수학", 80, 95)).await
        }).unwrap();

        prop_assert!(state.trace.len() <= 3 + 2 * cap as usize);
        prop_assert_eq!(state.trace.first().copied(), Some(WorkflowStep::Prepare));
        prop_assert!(!state.trace.contains(&WorkflowStep::End));
        prop_assert!(state.final_approval);
        prop_assert!(state.fix_attempts <= cap);
        prop_assert!(generator.call_count() <= 1 + 2 * cap as usize);

        if let Some(version) = state.narrative_version() {
            prop_assert!(version >= 1);
            prop_assert!(version <= 1 + state.fix_attempts);
        }
    }

    /// Property: revisions increase the version by exactly one each time
    #[test]
    fn prop_versions_are_monotonic(revisions in 0usize..10) {
        let input = TeacherInput::new("국어", 70, 75);
        let mut record = NarrativeRecord::first(&input, "초안");
        prop_assert_eq!(record.version, 1);

        for i in 0..revisions {
            let next = record.revise(format!("수정 {i}"));
            prop_assert_eq!(next.version, record.version + 1);
            prop_assert_eq!(&next.subject, &record.subject);
            record = next;
        }
        prop_assert_eq!(record.version as usize, revisions + 1);
    }

    /// Property: parsing never panics and unreadable replies fall back to a pass
    #[test]
    fn prop_parse_verdict_total(text in "\\PC{0,200}") {
        let verdict = parse_verdict(&text);
        if verdict.parse_fallback {
            prop_assert!(verdict.is_valid);
            prop_assert!(verdict.error.is_some());
        }
    }

    /// Property: an explicit verdict survives surrounding prose
    #[test]
    fn prop_wrapped_verdict_is_found(
        prefix in "[가-힣 ]{0,20}",
        suffix in "[가-힣 ]{0,20}",
        is_valid in any::<bool>(),
    ) {
        let text = format!(
            "{prefix}\n{{\"is_valid\": {is_valid}, \"issues\": [], \"summary\": \"요약\"}}\n{suffix}"
        );
        let verdict = parse_verdict(&text);
        prop_assert!(!verdict.parse_fallback);
        prop_assert_eq!(verdict.is_valid, is_valid);
        prop_assert_eq!(verdict.summary, "요약");
    }
}
