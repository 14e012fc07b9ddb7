//! Infrastructure layer module
//!
//! - Configuration management (figment)
//! - Logging (tracing-subscriber, tracing-appender)
//! - Reference corpus loading
//! - Project setup and application wiring

pub mod config;
pub mod corpus;
pub mod logging;
pub mod setup;
