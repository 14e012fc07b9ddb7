//! Implementation of the `setk examples` commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::style;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::infrastructure::setup::AppContext;
use crate::services::ExampleQuery;

#[derive(Args, Debug)]
pub struct ExamplesArgs {
    #[command(subcommand)]
    pub command: ExamplesCommands,
}

#[derive(Subcommand, Debug)]
pub enum ExamplesCommands {
    /// Show the examples a run would retrieve
    Search(SearchArgs),
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    #[arg(long)]
    pub subject: String,

    #[arg(long)]
    pub notes: Option<String>,

    #[arg(long)]
    pub standards: Option<String>,

    #[arg(long)]
    pub level: Option<String>,

    /// Number of examples (defaults to retrieval.k, or retrieval.fix_k with --diverse)
    #[arg(short)]
    pub k: Option<usize>,

    /// Use the repair-time diverse selection instead of the first-draft query
    #[arg(long)]
    pub diverse: bool,
}

#[derive(Debug, Serialize)]
pub struct SearchOutput {
    pub query: String,
    pub diverse: bool,
    pub store_size: usize,
    pub examples: Vec<String>,
}

impl CommandOutput for SearchOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!(
            "{} {}  ({} of {} stored)",
            style("query:").bold(),
            self.query,
            self.examples.len(),
            self.store_size
        )];
        if self.examples.is_empty() {
            lines.push("No examples found.".to_string());
        }
        for (i, example) in self.examples.iter().enumerate() {
            lines.push(format!("\n{} {example}", style(format!("[{}]", i + 1)).cyan()));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: ExamplesArgs, config: Config, json_mode: bool) -> Result<()> {
    match args.command {
        ExamplesCommands::Search(args) => search(args, config, json_mode).await,
    }
}

async fn search(args: SearchArgs, config: Config, json_mode: bool) -> Result<()> {
    let default_k = if args.diverse {
        config.retrieval.fix_k
    } else {
        config.retrieval.k
    };
    let k = args.k.unwrap_or(default_k);
    let context = AppContext::build(config).await?;

    let (query, examples) = if args.diverse {
        let examples = context.retriever.get_diverse_examples(&args.subject, k).await;
        (format!("과목: {}", args.subject), examples)
    } else {
        let query = ExampleQuery {
            subject: args.subject,
            notes: args.notes,
            achievement_standards: args.standards,
            school_level: args.level,
        };
        let found = context.retriever.search_examples(&query, k).await;
        (found.query, found.texts)
    };

    output(
        &SearchOutput {
            query,
            diverse: args.diverse,
            store_size: context.store.len().await,
            examples,
        },
        json_mode,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result_message() {
        let out = SearchOutput {
            query: "과목: 수학".to_string(),
            diverse: false,
            store_size: 0,
            examples: Vec::new(),
        };
        assert!(out.to_human().contains("No examples found."));
        assert_eq!(out.to_json()["store_size"], 0);
    }
}
