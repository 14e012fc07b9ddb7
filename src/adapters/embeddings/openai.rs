//! OpenAI embedding provider adapter.
//!
//! Calls the `/v1/embeddings` endpoint of OpenAI or any compatible server.
//! Rate limits and server errors are retried with exponential backoff;
//! client errors fail immediately.

use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::EmbeddingSettings;
use crate::domain::ports::embedding::EmbeddingProvider;

/// Configuration for the OpenAI embedding provider.
#[derive(Debug, Clone)]
pub struct OpenAiEmbeddingConfig {
    /// API key. Falls back to `OPENAI_API_KEY` env var.
    pub api_key: Option<String>,
    /// Base URL for the API. Default: `https://api.openai.com/v1`.
    pub base_url: String,
    /// Embedding model. Default: `text-embedding-3-small`.
    pub model: String,
    /// Vector length every response must have. Default: 1536.
    pub dimension: usize,
    /// Request timeout in seconds. Default: 30.
    pub timeout_secs: u64,
    /// Maximum texts per single API request. Default: 2048.
    pub max_batch_size: usize,
    /// Total time spent retrying transient failures. Default: 30s.
    pub max_retry_elapsed: Duration,
}

impl Default for OpenAiEmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
            timeout_secs: 30,
            max_batch_size: 2048,
            max_retry_elapsed: Duration::from_secs(30),
        }
    }
}

impl From<&EmbeddingSettings> for OpenAiEmbeddingConfig {
    fn from(settings: &EmbeddingSettings) -> Self {
        Self {
            base_url: settings.base_url.clone(),
            model: settings.model.clone(),
            dimension: settings.dimension,
            ..Default::default()
        }
    }
}

impl OpenAiEmbeddingConfig {
    fn get_api_key(&self) -> DomainResult<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                DomainError::EmbeddingFailed(
                    "OpenAI API key not set. Set OPENAI_API_KEY env var or configure api_key."
                        .to_string(),
                )
            })
    }
}

/// OpenAI embedding provider.
pub struct OpenAiEmbeddingProvider {
    config: OpenAiEmbeddingConfig,
    client: Arc<reqwest::Client>,
}

impl OpenAiEmbeddingProvider {
    pub fn new(config: OpenAiEmbeddingConfig) -> DomainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                DomainError::ConfigurationError(format!("Failed to build HTTP client: {e}"))
            })?;
        Ok(Self {
            config,
            client: Arc::new(client),
        })
    }

    /// Vectors of another length would make every cosine distance meaningless.
    fn check_dimensions(&self, vectors: &[Vec<f32>]) -> DomainResult<()> {
        match vectors.iter().find(|v| v.len() != self.config.dimension) {
            Some(vector) => Err(DomainError::EmbeddingFailed(format!(
                "expected {}-dimensional embeddings from {}, got {}",
                self.config.dimension,
                self.config.model,
                vector.len()
            ))),
            None => Ok(()),
        }
    }

    async fn call_embeddings_api(&self, texts: &[String]) -> DomainResult<Vec<Vec<f32>>> {
        let api_key = self.config.get_api_key()?;
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(500))
            .with_max_elapsed_time(Some(self.config.max_retry_elapsed))
            .build();

        let this = self;
        let key = api_key.as_str();
        backoff::future::retry(policy, move || async move {
            this.request_once(key, texts).await
        })
        .await
    }

    async fn request_once(
        &self,
        api_key: &str,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, backoff::Error<DomainError>> {
        let url = format!("{}/embeddings", self.config.base_url);
        let request_body = EmbeddingsRequest {
            model: &self.config.model,
            input: texts,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                backoff::Error::transient(DomainError::EmbeddingFailed(format!(
                    "Embedding API request failed: {e}"
                )))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".to_string());
            let err = DomainError::EmbeddingFailed(format!("Embedding API returned {status}: {body}"));
            if status.as_u16() == 429 || status.is_server_error() {
                tracing::warn!(%status, "embedding request failed, retrying");
                return Err(backoff::Error::transient(err));
            }
            return Err(backoff::Error::permanent(err));
        }

        let result: EmbeddingsResponse = response.json().await.map_err(|e| {
            backoff::Error::permanent(DomainError::SerializationError(format!(
                "Failed to parse embedding response: {e}"
            )))
        })?;

        // Sort by index to maintain input order
        let mut data = result.data;
        data.sort_by_key(|d| d.index);

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        let results = self.call_embeddings_api(&[text.to_string()]).await?;
        self.check_dimensions(&results)?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::EmbeddingFailed("Empty embedding response".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> DomainResult<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(self.config.max_batch_size.max(1)) {
            let batch = self.call_embeddings_api(chunk).await?;
            if batch.len() != chunk.len() {
                return Err(DomainError::EmbeddingFailed(format!(
                    "Embedding API returned {} vectors for {} inputs",
                    batch.len(),
                    chunk.len()
                )));
            }
            self.check_dimensions(&batch)?;
            vectors.extend(batch);
        }

        Ok(vectors)
    }
}

// -- OpenAI API request/response types --

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
