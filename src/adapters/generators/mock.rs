//! Mock generator for tests and offline runs.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use crate::domain::models::TokenUsage;
use crate::domain::ports::{Generation, GenerationError, TextGenerator};

/// Mock response configuration.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// Output text
    pub output: String,
    /// Whether to simulate failure
    pub fail: bool,
    /// Error message if failing
    pub error_message: Option<String>,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Default for MockResponse {
    fn default() -> Self {
        Self {
            output: "수업 시간에 적극적으로 참여하며 성실한 학습 태도를 보임.".to_string(),
            fail: false,
            error_message: None,
            input_tokens: 100,
            output_tokens: 50,
        }
    }
}

impl MockResponse {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            ..Default::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            fail: true,
            error_message: Some(error.into()),
            ..Default::default()
        }
    }
}

/// Generator that replays scripted responses in order.
///
/// Once the script is exhausted every call gets the default response.
/// Prompts are recorded so tests can inspect what each step sent.
pub struct MockGenerator {
    script: Mutex<VecDeque<MockResponse>>,
    default_response: MockResponse,
    prompts: Mutex<Vec<String>>,
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::with_default_response(MockResponse::default())
    }

    pub fn with_default_response(response: MockResponse) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default_response: response,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn scripted(responses: impl IntoIterator<Item = MockResponse>) -> Self {
        let generator = Self::new();
        generator
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(responses);
        generator
    }

    pub fn push_response(&self, response: MockResponse) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock"
    }

    async fn invoke(&self, prompt: &str) -> Result<Generation, GenerationError> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.to_string());

        let response = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| self.default_response.clone());

        if response.fail {
            return Err(GenerationError::NetworkError(
                response
                    .error_message
                    .unwrap_or_else(|| "mock failure".to_string()),
            ));
        }

        Ok(Generation::new(response.output)
            .with_usage(TokenUsage::new(response.input_tokens, response.output_tokens)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_then_default() {
        let generator = MockGenerator::scripted([
            MockResponse::success("하나"),
            MockResponse::failure("연결 끊김"),
        ]);

        assert_eq!(generator.invoke("p1").await.unwrap().text, "하나");
        assert!(matches!(
            generator.invoke("p2").await,
            Err(GenerationError::NetworkError(msg)) if msg == "연결 끊김"
        ));
        let fallback = generator.invoke("p3").await.unwrap();
        assert_eq!(fallback.text, MockResponse::default().output);
        assert_eq!(generator.call_count(), 3);
        assert_eq!(generator.prompts(), vec!["p1", "p2", "p3"]);
    }
}
