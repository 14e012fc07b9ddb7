pub mod batch_service;
pub mod example_retriever;
pub mod example_store;
pub mod nodes;
pub mod prompts;
pub mod verdict_parser;
pub mod workflow_engine;

pub use batch_service::{
    BatchConfig, BatchReport, BatchService, OutcomeObserver, OutcomeStatus, StudentOutcome,
};
pub use example_retriever::{ExampleQuery, ExampleRetriever, RetrievedExamples};
pub use example_store::ExampleStore;
pub use verdict_parser::{extract_json, parse_verdict};
pub use workflow_engine::{WorkflowEngine, WorkflowEngineConfig};
