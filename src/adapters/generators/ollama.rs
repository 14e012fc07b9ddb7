//! Ollama generator using the non-streaming `/api/generate` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::http::{build_client, check_status, map_transport_error, RequestLimiter};
use crate::domain::models::{GenerationConfig, TokenUsage};
use crate::domain::ports::{Generation, GenerationError, TextGenerator};

#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self::from(&GenerationConfig::default())
    }
}

impl From<&GenerationConfig> for OllamaConfig {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            base_url: config.ollama.base_url.clone(),
            model: config.ollama.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_secs: config.timeout_secs,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
}

/// Generator backed by a local Ollama server.
pub struct OllamaGenerator {
    config: OllamaConfig,
    client: Client,
    limiter: Arc<RequestLimiter>,
}

impl OllamaGenerator {
    pub fn new(config: OllamaConfig, limiter: Arc<RequestLimiter>) -> Result<Self, GenerationError> {
        let client = build_client(config.timeout_secs)?;
        Ok(Self {
            config,
            client,
            limiter,
        })
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn invoke(&self, prompt: &str) -> Result<Generation, GenerationError> {
        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
            },
        };

        self.limiter.acquire().await;
        let response = self
            .client
            .post(format!("{}/api/generate", self.config.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| map_transport_error(&e, self.config.timeout_secs))?;

        let result: GenerateResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        let usage = match (result.prompt_eval_count, result.eval_count) {
            (None, None) => None,
            (input, output) => Some(TokenUsage::new(input.unwrap_or(0), output.unwrap_or(0))),
        };
        Ok(Generation {
            text: result.response,
            usage,
        })
    }
}
