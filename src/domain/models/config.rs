use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Text generator selection: openai, anthropic, ollama or mock
    #[serde(default = "default_model")]
    pub model: String,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Text generation settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Example retrieval settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Workflow and batch settings
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

fn default_model() -> String {
    "openai".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            logging: LoggingConfig::default(),
            generation: GenerationConfig::default(),
            retrieval: RetrievalConfig::default(),
            workflow: WorkflowConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files (stderr only when unset)
    #[serde(default)]
    pub log_dir: Option<String>,

    /// File rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}

/// Text generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GenerationConfig {
    /// Sampling temperature (0.0 - 2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// HTTP timeout per generation call in seconds
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,

    /// Generation calls allowed per second, shared by all runs
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    #[serde(default = "ProviderConfig::openai")]
    pub openai: ProviderConfig,

    #[serde(default = "ProviderConfig::anthropic")]
    pub anthropic: ProviderConfig,

    #[serde(default = "ProviderConfig::ollama")]
    pub ollama: ProviderConfig,
}

const fn default_temperature() -> f32 {
    0.5
}

const fn default_max_tokens() -> u32 {
    1024
}

const fn default_generation_timeout_secs() -> u64 {
    120
}

const fn default_requests_per_second() -> u32 {
    5
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_generation_timeout_secs(),
            requests_per_second: default_requests_per_second(),
            openai: ProviderConfig::openai(),
            anthropic: ProviderConfig::anthropic(),
            ollama: ProviderConfig::ollama(),
        }
    }
}

/// Endpoint settings for one generation provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProviderConfig {
    pub base_url: String,
    pub model: String,
    /// Falls back to the provider's environment variable when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl ProviderConfig {
    pub fn openai() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
        }
    }

    pub fn anthropic() -> Self {
        Self {
            base_url: "https://api.anthropic.com".to_string(),
            model: "claude-3-5-sonnet-20241022".to_string(),
            api_key: None,
        }
    }

    pub fn ollama() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "gpt-oss:20b".to_string(),
            api_key: None,
        }
    }
}

/// Example retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetrievalConfig {
    /// Examples fetched for the first draft
    #[serde(default = "default_k")]
    pub k: usize,

    /// Diverse examples fetched for a repair
    #[serde(default = "default_fix_k")]
    pub fix_k: usize,

    /// JSON corpus of reference examples (built-in corpus when unset)
    #[serde(default)]
    pub examples_path: Option<String>,

    #[serde(default)]
    pub embedding: EmbeddingSettings,
}

const fn default_k() -> usize {
    3
}

const fn default_fix_k() -> usize {
    2
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            fix_k: default_fix_k(),
            examples_path: None,
            embedding: EmbeddingSettings::default(),
        }
    }
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EmbeddingSettings {
    /// Provider: openai or null
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,

    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,
}

fn default_embedding_provider() -> String {
    "openai".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

const fn default_embedding_dimension() -> usize {
    1536
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            base_url: default_embedding_base_url(),
            dimension: default_embedding_dimension(),
        }
    }
}

/// Workflow and batch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkflowConfig {
    /// Repairs allowed per run (1 - 3)
    #[serde(default = "default_max_fix_attempts")]
    pub max_fix_attempts: u32,

    /// Wall-clock limit for a single run in seconds
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,

    /// Runs executed concurrently in a batch
    #[serde(default = "default_max_concurrent_runs")]
    pub max_concurrent_runs: usize,
}

const fn default_max_fix_attempts() -> u32 {
    1
}

const fn default_run_timeout_secs() -> u64 {
    300
}

const fn default_max_concurrent_runs() -> usize {
    8
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_fix_attempts: default_max_fix_attempts(),
            run_timeout_secs: default_run_timeout_secs(),
            max_concurrent_runs: default_max_concurrent_runs(),
        }
    }
}
