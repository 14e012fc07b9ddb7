//! Generator registry: maps a model-selection string to a generator.

use std::sync::Arc;

use super::anthropic_api::{AnthropicApiConfig, AnthropicApiGenerator};
use super::http::RequestLimiter;
use super::mock::MockGenerator;
use super::ollama::{OllamaConfig, OllamaGenerator};
use super::openai::{OpenAiGenerator, OpenAiGeneratorConfig};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::GenerationConfig;
use crate::domain::ports::{GenerationError, TextGenerator};

/// Supported generator providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorKind {
    OpenAi,
    Anthropic,
    Ollama,
    Mock,
}

impl GeneratorKind {
    pub const ALL: [Self; 4] = [Self::OpenAi, Self::Anthropic, Self::Ollama, Self::Mock];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Ollama => "ollama",
            Self::Mock => "mock",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "anthropic" | "claude" => Some(Self::Anthropic),
            "ollama" => Some(Self::Ollama),
            "mock" => Some(Self::Mock),
            _ => None,
        }
    }
}

/// Split `provider[:model]` into its parts.
///
/// Only the first colon separates, so Ollama tags like `gpt-oss:20b`
/// survive as `ollama:gpt-oss:20b`.
pub fn parse_selection(selection: &str) -> DomainResult<(GeneratorKind, Option<&str>)> {
    let (provider, model) = match selection.split_once(':') {
        Some((provider, model)) if !model.trim().is_empty() => (provider, Some(model.trim())),
        Some((provider, _)) => (provider, None),
        None => (selection, None),
    };
    let kind = GeneratorKind::parse(provider).ok_or_else(|| {
        let supported: Vec<&str> = GeneratorKind::ALL.iter().map(GeneratorKind::as_str).collect();
        DomainError::ConfigurationError(format!(
            "Unknown model '{selection}'. Supported: {}",
            supported.join(", ")
        ))
    })?;
    Ok((kind, model))
}

/// Builds generators from configuration.
pub struct GeneratorRegistry {
    config: GenerationConfig,
}

impl GeneratorRegistry {
    pub const fn new(config: GenerationConfig) -> Self {
        Self { config }
    }

    /// Create the generator named by `selection` (e.g. `openai`, `ollama:llama3`).
    pub fn create(&self, selection: &str) -> DomainResult<Arc<dyn TextGenerator>> {
        let (kind, model_override) = parse_selection(selection)?;
        let limiter = Arc::new(RequestLimiter::per_second(self.config.requests_per_second));
        let to_domain = |e: GenerationError| DomainError::ConfigurationError(format!("{e}"));

        let generator: Arc<dyn TextGenerator> = match kind {
            GeneratorKind::OpenAi => {
                let mut config = OpenAiGeneratorConfig::from(&self.config);
                if let Some(model) = model_override {
                    config.model = model.to_string();
                }
                Arc::new(OpenAiGenerator::new(config, limiter).map_err(to_domain)?)
            }
            GeneratorKind::Anthropic => {
                let mut config = AnthropicApiConfig::from(&self.config);
                if let Some(model) = model_override {
                    config.model = model.to_string();
                }
                Arc::new(AnthropicApiGenerator::new(config, limiter).map_err(to_domain)?)
            }
            GeneratorKind::Ollama => {
                let mut config = OllamaConfig::from(&self.config);
                if let Some(model) = model_override {
                    config.model = model.to_string();
                }
                Arc::new(OllamaGenerator::new(config, limiter).map_err(to_domain)?)
            }
            GeneratorKind::Mock => Arc::new(MockGenerator::new()),
        };

        tracing::info!(
            provider = generator.name(),
            model = generator.model(),
            "text generator selected"
        );
        Ok(generator)
    }
}
