//! CLI command implementations.

pub mod batch;
pub mod examples;
pub mod generate;
pub mod init;
