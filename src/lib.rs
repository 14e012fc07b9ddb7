//! setk - student evaluation narrative generator
//!
//! Writes the Korean 세부능력 및 특기사항 (subject-specific remarks) for a
//! student from a teacher's scores and notes. Each run retrieves reference
//! examples, drafts a narrative with a language model, has the model review
//! the draft, and applies a bounded number of repairs before approving it.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and port traits
//! - **Adapter Layer** (`adapters`): generation, embedding and vector backends
//! - **Service Layer** (`services`): retrieval, prompts, workflow engine, batch runner
//! - **Infrastructure Layer** (`infrastructure`): config, logging, corpus loading, wiring
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use setk::infrastructure::setup::AppContext;
//! use setk::{Config, TeacherInput};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let context = AppContext::build(Config::default()).await?;
//!     let state = context.engine.run(TeacherInput::new("수학", 85, 92)).await?;
//!     println!("{}", state.narrative.map(|n| n.content).unwrap_or_default());
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Config, ErrorCode, ErrorInfo, GenerationStatus, NarrativeRecord, ReferenceExample,
    TeacherInput, ValidationVerdict, WorkflowState, WorkflowStep,
};
pub use domain::ports::{EmbeddingProvider, TextGenerator, VectorBackend};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{BatchService, ExampleRetriever, ExampleStore, WorkflowEngine};
