//! Domain errors for the narrative generator.

use thiserror::Error;

/// Domain-level errors that can escape a workflow run or a service call.
///
/// Generation-call failures inside a run are not represented here: those are
/// recorded on the run state's error slot and never propagate.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Missing required input field: {0}")]
    MissingInput(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Retrieval failed: {0}")]
    RetrievalFailed(String),

    #[error("Embedding failed: {0}")]
    EmbeddingFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
