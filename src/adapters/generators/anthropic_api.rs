//! Anthropic Messages API generator.
//!
//! Sends a single user message per call and joins the text blocks of the
//! reply. Streaming is not used.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::http::{build_client, check_status, map_transport_error, RequestLimiter};
use crate::domain::models::{GenerationConfig, TokenUsage};
use crate::domain::ports::{Generation, GenerationError, TextGenerator};

/// Configuration for the Anthropic API generator.
#[derive(Debug, Clone)]
pub struct AnthropicApiConfig {
    /// API key (will be read from ANTHROPIC_API_KEY env if not set).
    pub api_key: Option<String>,
    /// API base URL.
    pub base_url: String,
    /// Model to use.
    pub model: String,
    /// API version header.
    pub api_version: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Max tokens to generate.
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for AnthropicApiConfig {
    fn default() -> Self {
        Self::from(&GenerationConfig::default())
    }
}

impl From<&GenerationConfig> for AnthropicApiConfig {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            api_key: config.anthropic.api_key.clone(),
            base_url: config.anthropic.base_url.clone(),
            model: config.anthropic.model.clone(),
            api_version: "2023-06-01".to_string(),
            timeout_secs: config.timeout_secs,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

impl AnthropicApiConfig {
    /// Get API key from config or environment.
    pub fn get_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

/// Content block in a reply. Only text blocks matter here.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

/// Generator backed by the Anthropic Messages API.
pub struct AnthropicApiGenerator {
    config: AnthropicApiConfig,
    client: Client,
    limiter: Arc<RequestLimiter>,
}

impl AnthropicApiGenerator {
    pub fn new(
        config: AnthropicApiConfig,
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
impl TextGenerator for AnthropicApiGenerator {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn invoke(&self, prompt: &str) -> Result<Generation, GenerationError> {
        let api_key = self.config.get_api_key().ok_or_else(|| {
            GenerationError::NotConfigured("ANTHROPIC_API_KEY not set".to_string())
        })?;

        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
        };

        self.limiter.acquire().await;
        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.base_url))
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-api-key", &api_key)
            .header("anthropic-version", &self.config.api_version)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_transport_error(&e, self.config.timeout_secs))?;

        let result: MessagesResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        let text = result
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        let mut generation = Generation::new(text);
        if let Some(usage) = result.usage {
            generation = generation.with_usage(TokenUsage::new(usage.input_tokens, usage.output_tokens));
        }
        Ok(generation)
    }
}
