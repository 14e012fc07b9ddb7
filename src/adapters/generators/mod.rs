//! Text generator adapters.

pub mod anthropic_api;
pub mod http;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod registry;

pub use anthropic_api::{AnthropicApiConfig, AnthropicApiGenerator};
pub use http::RequestLimiter;
pub use mock::{MockGenerator, MockResponse};
pub use ollama::{OllamaConfig, OllamaGenerator};
pub use openai::{OpenAiGenerator, OpenAiGeneratorConfig};
pub use registry::{parse_selection, GeneratorKind, GeneratorRegistry};
