//! Port trait definitions (Hexagonal Architecture)
//!
//! The workflow only talks to the outside world through these traits:
//! - TextGenerator: prompt in, text out, with token usage on the side
//! - VectorBackend: nearest-neighbour search over reference examples
//! - EmbeddingProvider: text to dense vectors for the in-process backend

pub mod embedding;
pub mod null_embedding;
pub mod text_generator;
pub mod vector_backend;

pub use embedding::EmbeddingProvider;
pub use null_embedding::NullEmbeddingProvider;
pub use text_generator::{Generation, GenerationError, TextGenerator};
pub use vector_backend::VectorBackend;
