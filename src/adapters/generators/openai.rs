//! OpenAI chat-completions generator.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::http::{build_client, check_status, map_transport_error, RequestLimiter};
use crate::domain::models::{GenerationConfig, TokenUsage};
use crate::domain::ports::{Generation, GenerationError, TextGenerator};

/// Configuration for the OpenAI generator.
#[derive(Debug, Clone)]
pub struct OpenAiGeneratorConfig {
    /// API key (read from OPENAI_API_KEY if not set).
    pub api_key: Option<String>,
    /// API base URL including the version segment.
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OpenAiGeneratorConfig {
    fn default() -> Self {
        Self::from(&GenerationConfig::default())
    }
}

impl From<&GenerationConfig> for OpenAiGeneratorConfig {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            api_key: config.openai.api_key.clone(),
            base_url: config.openai.base_url.clone(),
            model: config.openai.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_secs: config.timeout_secs,
        }
    }
}

impl OpenAiGeneratorConfig {
    pub fn get_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

/// Generator backed by the OpenAI chat-completions API.
pub struct OpenAiGenerator {
    config: OpenAiGeneratorConfig,
    client: Client,
    limiter: Arc<RequestLimiter>,
}

impl OpenAiGenerator {
    pub fn new(
        config: OpenAiGeneratorConfig,
        limiter: Arc<RequestLimiter>,
    ) -> Result<Self, GenerationError> {
        let client = build_client(config.timeout_secs)?;
        Ok(Self {
            config,
            client,
            limiter,
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn invoke(&self, prompt: &str) -> Result<Generation, GenerationError> {
        let api_key = self
            .config
            .get_api_key()
            .ok_or_else(|| GenerationError::NotConfigured("OPENAI_API_KEY not set".to_string()))?;

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        self.limiter.acquire().await;
        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_transport_error(&e, self.config.timeout_secs))?;

        let result: ChatResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        let text = result
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GenerationError::InvalidResponse("No choices in response".to_string()))?;

        let mut generation = Generation::new(text);
        if let Some(usage) = result.usage {
            generation = generation
                .with_usage(TokenUsage::new(usage.prompt_tokens, usage.completion_tokens));
        }
        Ok(generation)
    }
}
