//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::commands::batch::BatchArgs;
use super::commands::examples::ExamplesArgs;
use super::commands::generate::GenerateArgs;
use super::commands::init::InitArgs;

#[derive(Parser)]
#[command(name = "setk")]
#[command(about = "Generate and review student evaluation narratives (세부능력 및 특기사항)", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Load configuration from this file instead of .setk/
    #[arg(short, long, global = true, env = "SETK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Text generator, e.g. openai, anthropic, ollama:llama3, mock
    #[arg(short, long, global = true)]
    pub model: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default .setk/config.yaml
    Init(InitArgs),

    /// Generate a narrative for one student
    Generate(GenerateArgs),

    /// Generate narratives for every student in a file
    Batch(BatchArgs),

    /// Inspect reference example retrieval
    Examples(ExamplesArgs),
}
