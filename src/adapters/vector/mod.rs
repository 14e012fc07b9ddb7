//! Vector search backends.

pub mod in_memory;

pub use in_memory::{cosine_distance, InMemoryVectorBackend};
