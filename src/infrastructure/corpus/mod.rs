//! Reference example corpus loading.

pub mod loader;

pub use loader::{chunk_text, ExampleLoader};
