//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment:
//! - Programmatic defaults
//! - YAML project files under `.setk/`
//! - `SETK_*` environment overrides
//! - Validation after extraction

pub mod loader;

pub use loader::{ConfigError, ConfigLoader, CONFIG_DIR};
