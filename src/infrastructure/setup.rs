//! Project setup and application wiring
//!
//! - `.setk/` directory and default config creation for `setk init`
//! - Assembling a ready-to-run engine from a loaded `Config`

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::config::CONFIG_DIR;
use super::corpus::ExampleLoader;
use crate::adapters::embeddings::{OpenAiEmbeddingConfig, OpenAiEmbeddingProvider};
use crate::adapters::generators::GeneratorRegistry;
use crate::adapters::vector::InMemoryVectorBackend;
use crate::domain::models::{Config, EmbeddingSettings};
use crate::domain::ports::{EmbeddingProvider, NullEmbeddingProvider, TextGenerator};
use crate::services::{
    BatchConfig, BatchService, ExampleRetriever, ExampleStore, WorkflowEngine,
    WorkflowEngineConfig,
};

/// Default configuration template content
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# setk configuration
# Override settings by editing this file, adding .setk/local.yaml, or
# setting environment variables with the SETK_ prefix
#
# Example environment variables:
#   export SETK_MODEL=ollama:gpt-oss:20b
#   export SETK_LOGGING__LEVEL=debug
#   export SETK_WORKFLOW__MAX_FIX_ATTEMPTS=2

# Text generator: openai, anthropic, ollama or mock.
# Append :<model> to override the provider's model, e.g. openai:gpt-4o
model: "openai"

logging:
  # Log level: trace, debug, info, warn, error
  level: "info"
  # Log format: json, pretty
  format: "pretty"
  # Rolling JSON log files are written here when set
  # log_dir: ".setk/logs"
  # Rotation: daily, hourly, never
  rotation: "daily"

generation:
  temperature: 0.5
  max_tokens: 1024
  timeout_secs: 120
  # Shared by every run in a batch
  requests_per_second: 5
  openai:
    base_url: "https://api.openai.com/v1"
    model: "gpt-4o-mini"
  anthropic:
    base_url: "https://api.anthropic.com"
    model: "claude-3-5-sonnet-20241022"
  ollama:
    base_url: "http://localhost:11434"
    model: "gpt-oss:20b"

retrieval:
  # Examples for the first draft
  k: 3
  # Diverse examples for each repair
  fix_k: 2
  # JSON corpus; the built-in examples are used when unset
  # examples_path: ".setk/examples.json"
  embedding:
    # openai or null (null keeps insertion order, no network)
    provider: "openai"
    model: "text-embedding-3-small"
    base_url: "https://api.openai.com/v1"
    dimension: 1536

workflow:
  # Repairs allowed per run (1-3)
  max_fix_attempts: 1
  run_timeout_secs: 300
  max_concurrent_runs: 8
"#;

/// Setup paths and directories
pub struct SetupPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
}

impl SetupPaths {
    /// Paths under the current directory
    pub fn new() -> Result<Self> {
        let current_dir = std::env::current_dir().context("Failed to get current directory")?;
        Ok(Self::at(&current_dir))
    }

    pub fn at(root: &Path) -> Self {
        let config_dir = root.join(CONFIG_DIR);
        Self {
            config_file: config_dir.join("config.yaml"),
            config_dir,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.config_file.exists()
    }
}

/// Create the configuration directory
pub fn create_config_dir(paths: &SetupPaths) -> Result<()> {
    fs::create_dir_all(&paths.config_dir).with_context(|| {
        format!("Failed to create config directory {}", paths.config_dir.display())
    })
}

/// Write the default config file. Returns false when an existing file was kept.
pub fn create_config_file(paths: &SetupPaths, force: bool) -> Result<bool> {
    if paths.config_file.exists() && !force {
        return Ok(false);
    }

    fs::write(&paths.config_file, DEFAULT_CONFIG_TEMPLATE)
        .context("Failed to write config file")?;
    Ok(true)
}

/// Pick the embedding provider named in the config.
///
/// `openai` without an API key degrades to the null provider so offline
/// runs still work, with retrieval falling back to insertion order.
pub fn build_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn EmbeddingProvider>> {
    match settings.provider.as_str() {
        "openai" if std::env::var("OPENAI_API_KEY").is_ok() => {
            let provider = OpenAiEmbeddingProvider::new(OpenAiEmbeddingConfig::from(settings))
                .context("Failed to build OpenAI embedding provider")?;
            Ok(Arc::new(provider))
        }
        "openai" => {
            warn!("OPENAI_API_KEY not set, using null embeddings for example search");
            Ok(Arc::new(NullEmbeddingProvider::new()))
        }
        "null" => Ok(Arc::new(NullEmbeddingProvider::new())),
        other => anyhow::bail!("Unknown embedding provider: {other}"),
    }
}

/// Everything a command needs to run the workflow.
pub struct AppContext {
    pub config: Config,
    pub generator: Arc<dyn TextGenerator>,
    pub store: Arc<ExampleStore>,
    pub retriever: Arc<ExampleRetriever>,
    pub engine: Arc<WorkflowEngine>,
}

impl AppContext {
    /// Build from config, creating the generator named by `config.model`.
    pub async fn build(config: Config) -> Result<Self> {
        let generator = GeneratorRegistry::new(config.generation.clone())
            .create(&config.model)
            .context("Failed to create text generator")?;
        let embedder = build_embedder(&config.retrieval.embedding)?;
        Self::with_parts(config, generator, embedder).await
    }

    /// Build with explicit generator and embedder, loading the configured corpus.
    pub async fn with_parts(
        config: Config,
        generator: Arc<dyn TextGenerator>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let backend = Arc::new(InMemoryVectorBackend::new(embedder));
        let store = Arc::new(ExampleStore::new(backend));

        let examples = ExampleLoader::from_config(&config.retrieval).load_all();
        match store.insert(examples).await {
            Ok(count) => info!(count, "example store ready"),
            Err(e) => warn!(error = %e, "failed to index examples, retrieval will be empty"),
        }

        let retriever = Arc::new(ExampleRetriever::new(store.clone()));
        let engine = Arc::new(WorkflowEngine::new(
            generator.clone(),
            retriever.clone(),
            WorkflowEngineConfig::from(&config),
        ));

        Ok(Self {
            config,
            generator,
            store,
            retriever,
            engine,
        })
    }

    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            max_concurrent_runs: self.config.workflow.max_concurrent_runs,
            run_timeout: Duration::from_secs(self.config.workflow.run_timeout_secs),
        }
    }

    pub fn batch_service(&self) -> BatchService {
        BatchService::new(self.engine.clone(), self.batch_config())
    }
}
