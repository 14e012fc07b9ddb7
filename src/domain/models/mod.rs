pub mod config;
pub mod example;
pub mod narrative;
pub mod teacher_input;
pub mod usage;
pub mod verdict;
pub mod workflow_state;

pub use config::{
    Config, EmbeddingSettings, GenerationConfig, LoggingConfig, ProviderConfig, RetrievalConfig,
    WorkflowConfig,
};
pub use example::{ExampleFilter, ExampleMetadata, ReferenceExample};
pub use narrative::{now_kst, NarrativeRecord};
pub use teacher_input::{is_empty_sentinel, TeacherInput, NOTES_NONE};
pub use usage::TokenUsage;
pub use verdict::ValidationVerdict;
pub use workflow_state::{ErrorCode, ErrorInfo, GenerationStatus, WorkflowState, WorkflowStep};
