use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::adapters::generators::parse_selection;
use crate::domain::models::config::Config;

/// Project-local configuration directory.
pub const CONFIG_DIR: &str = ".setk";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Invalid temperature: {0}. Must be between 0.0 and 2.0")]
    InvalidTemperature(f32),

    #[error("Invalid requests_per_second: {0}. Must be at least 1")]
    InvalidRateLimit(u32),

    #[error("Invalid k: {0}. Must be at least 1")]
    InvalidK(usize),

    #[error("Invalid embedding provider: {0}. Must be one of: openai, null")]
    InvalidEmbeddingProvider(String),

    #[error("Invalid max_fix_attempts: {0}. Must be between 1 and 3")]
    InvalidMaxFixAttempts(u32),

    #[error("Invalid max_concurrent_runs: {0}. Must be at least 1")]
    InvalidConcurrency(usize),

    #[error("Invalid run_timeout_secs: {0}. Must be at least 1")]
    InvalidRunTimeout(u64),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .setk/config.yaml (project config, created by init)
    /// 3. .setk/local.yaml (local overrides, optional)
    /// 4. Environment variables (SETK_* prefix, `__` separates sections)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(format!("{CONFIG_DIR}/config.yaml")))
            .merge(Yaml::file(format!("{CONFIG_DIR}/local.yaml")))
            .merge(Env::prefixed("SETK_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honoring `SETK_*` overrides
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("SETK_").split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if parse_selection(&config.model).is_err() {
            return Err(ConfigError::InvalidModel(config.model.clone()));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        let generation = &config.generation;
        if !(0.0..=2.0).contains(&generation.temperature) {
            return Err(ConfigError::InvalidTemperature(generation.temperature));
        }
        if generation.requests_per_second == 0 {
            return Err(ConfigError::InvalidRateLimit(generation.requests_per_second));
        }

        if config.retrieval.k == 0 {
            return Err(ConfigError::InvalidK(config.retrieval.k));
        }
        let valid_embedders = ["openai", "null"];
        if !valid_embedders.contains(&config.retrieval.embedding.provider.as_str()) {
            return Err(ConfigError::InvalidEmbeddingProvider(
                config.retrieval.embedding.provider.clone(),
            ));
        }

        let workflow = &config.workflow;
        if !(1..=3).contains(&workflow.max_fix_attempts) {
            return Err(ConfigError::InvalidMaxFixAttempts(workflow.max_fix_attempts));
        }
        if workflow.max_concurrent_runs == 0 {
            return Err(ConfigError::InvalidConcurrency(workflow.max_concurrent_runs));
        }
        if workflow.run_timeout_secs == 0 {
            return Err(ConfigError::InvalidRunTimeout(workflow.run_timeout_secs));
        }

        Ok(())
    }
}
