//! Common test utilities for integration tests
//!
//! Shared fixtures: a seeded in-memory example store, engines wired to
//! scripted generators, and backends that fail on purpose.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use setk::adapters::generators::MockGenerator;
use setk::adapters::vector::InMemoryVectorBackend;
use setk::domain::models::{ExampleFilter, ExampleMetadata, ReferenceExample};
use setk::domain::ports::{
    Generation, GenerationError, NullEmbeddingProvider, TextGenerator, VectorBackend,
};
use setk::services::{ExampleRetriever, ExampleStore, WorkflowEngine, WorkflowEngineConfig};
use setk::{DomainError, DomainResult};

pub const VALID_VERDICT: &str = r#"{"is_valid": true, "issues": [], "summary": "입력 반영 및 문장 품질 양호"}"#;
pub const INVALID_VERDICT: &str =
    r#"{"is_valid": false, "issues": [{"type": "누락", "description": "기말 점수 누락"}], "summary": "점수 보완 필요"}"#;

/// Opening line of every validation prompt.
pub const VALIDATION_PROMPT_PREFIX: &str = "생성된 세부능력 특기사항";

pub fn math_examples() -> Vec<ReferenceExample> {
    [
        "함수의 극한 개념을 실생활 사례에 적용하여 탐구 보고서를 작성함.",
        "피보나치 수열의 일반항을 구하고 프로그램으로 구현함.",
        "무한등비급수를 활용해 승수 효과를 계산하고 발표함.",
    ]
    .into_iter()
    .map(|text| ReferenceExample::new(text, ExampleMetadata::for_subject("수학")))
    .collect()
}

/// Store backed by null embeddings, so results come back in insertion order.
pub async fn seeded_store(examples: Vec<ReferenceExample>) -> Arc<ExampleStore> {
    let backend = InMemoryVectorBackend::new(Arc::new(NullEmbeddingProvider::new()));
    let store = Arc::new(ExampleStore::new(Arc::new(backend)));
    store.insert(examples).await.expect("seed examples");
    store
}

pub async fn math_retriever() -> Arc<ExampleRetriever> {
    Arc::new(ExampleRetriever::new(seeded_store(math_examples()).await))
}

pub fn engine_config(max_fix_attempts: u32) -> WorkflowEngineConfig {
    WorkflowEngineConfig {
        k: 3,
        fix_k: 2,
        max_fix_attempts,
    }
}

pub async fn engine_with(generator: Arc<dyn TextGenerator>, max_fix_attempts: u32) -> WorkflowEngine {
    WorkflowEngine::new(generator, math_retriever().await, engine_config(max_fix_attempts))
}

pub async fn mock_engine(generator: &Arc<MockGenerator>, max_fix_attempts: u32) -> WorkflowEngine {
    engine_with(generator.clone(), max_fix_attempts).await
}

/// Backend that is never reachable.
pub struct FailingBackend;

#[async_trait]
impl VectorBackend for FailingBackend {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn search(
        &self,
        _query: &str,
        _k: usize,
        _filter: Option<&ExampleFilter>,
    ) -> DomainResult<Vec<ReferenceExample>> {
        Err(DomainError::RetrievalFailed("connection refused".to_string()))
    }

    async fn insert(&self, _examples: Vec<ReferenceExample>) -> DomainResult<usize> {
        Err(DomainError::RetrievalFailed("connection refused".to_string()))
    }

    async fn count(&self) -> DomainResult<usize> {
        Err(DomainError::RetrievalFailed("connection refused".to_string()))
    }
}

/// Generator whose behaviour depends on the subject in the prompt, so
/// concurrent runs get deterministic answers regardless of call order.
///
/// - validation prompts are approved
/// - subject `지연` sleeps past any reasonable test timeout
/// - subject `오류` fails every call
/// - anything else gets a short narrative naming the subject
pub struct SubjectRoutedGenerator {
    pub delay: Duration,
}

impl Default for SubjectRoutedGenerator {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(30),
        }
    }
}

fn subject_of(prompt: &str) -> &str {
    prompt
        .lines()
        .find_map(|line| {
            line.strip_prefix("- 과목: ")
                .or_else(|| line.strip_prefix("- 과목명: "))
        })
        .unwrap_or_default()
}

#[async_trait]
impl TextGenerator for SubjectRoutedGenerator {
    fn name(&self) -> &'static str {
        "routed"
    }

    fn model(&self) -> &str {
        "routed"
    }

    async fn invoke(&self, prompt: &str) -> Result<Generation, GenerationError> {
        let subject = subject_of(prompt).to_string();
        if subject == "지연" {
            tokio::time::sleep(self.delay).await;
        }
        if subject == "오류" {
            return Err(GenerationError::Unavailable("upstream 503".to_string()));
        }
        if prompt.starts_with(VALIDATION_PROMPT_PREFIX) {
            return Ok(Generation::new(VALID_VERDICT));
        }
        Ok(Generation::new(format!(
            "{subject} 수업에서 성실하게 탐구 활동에 참여함."
        )))
    }
}
