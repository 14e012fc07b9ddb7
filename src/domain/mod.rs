//! Domain layer for the narrative generator
//!
//! This module contains the run state, the records it carries, and the port
//! traits the workflow talks to.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
