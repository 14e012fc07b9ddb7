//! Implementation of the `setk batch` command.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use super::generate::read_document;
use crate::cli::output::progress::{create_progress_bar, hidden};
use crate::cli::output::table::{list_table, render_list};
use crate::cli::output::{output, truncate, CommandOutput};
use crate::domain::models::{Config, TeacherInput};
use crate::infrastructure::setup::AppContext;
use crate::services::{BatchReport, OutcomeStatus, StudentOutcome};

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// JSON or YAML file holding an array of student inputs
    pub file: PathBuf,

    /// Override workflow.max_concurrent_runs
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Also write the full JSON report to this path
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct BatchOutput {
    #[serde(flatten)]
    pub report: BatchReport,
}

impl BatchOutput {
    fn row(outcome: &StudentOutcome) -> Vec<String> {
        let status = match outcome.status {
            OutcomeStatus::Success => style("success").green().to_string(),
            OutcomeStatus::Failed => style("failed").red().to_string(),
        };
        let version = outcome
            .record
            .as_ref()
            .map_or_else(|| "-".to_string(), |r| format!("v{}", r.version));
        let detail = match (&outcome.error, &outcome.record) {
            (Some(error), _) => truncate(&error.to_string(), 48),
            (None, Some(record)) => truncate(&record.content, 48),
            (None, None) => String::new(),
        };
        vec![
            (outcome.index + 1).to_string(),
            if outcome.name.is_empty() { "-".to_string() } else { outcome.name.clone() },
            outcome.subject.clone(),
            status,
            version,
            if outcome.forced_approval { "yes" } else { "" }.to_string(),
            detail,
        ]
    }
}

impl CommandOutput for BatchOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["#", "name", "subject", "status", "version", "forced", "detail"]);
        for outcome in &self.report.outcomes {
            table.add_row(Self::row(outcome));
        }
        format!(
            "{}\n\n{} succeeded, {} failed, {} tokens",
            render_list("student", &table, self.report.total()),
            style(self.report.succeeded).green().bold(),
            style(self.report.failed).red().bold(),
            self.report.token_usage.total()
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: BatchArgs, mut config: Config, json_mode: bool) -> Result<()> {
    let inputs: Vec<TeacherInput> = read_document(&args.file)?;
    if let Some(concurrency) = args.concurrency {
        anyhow::ensure!(concurrency > 0, "--concurrency must be at least 1");
        config.workflow.max_concurrent_runs = concurrency;
    }

    let context = AppContext::build(config).await?;

    let progress = if json_mode {
        hidden()
    } else {
        create_progress_bar(inputs.len() as u64)
    };
    let bar = progress.clone();
    let service = context.batch_service().with_observer(Arc::new(move |outcome: &StudentOutcome| {
        bar.inc(1);
        let who = if outcome.name.is_empty() { outcome.subject.as_str() } else { outcome.name.as_str() };
        bar.set_message(format!("{who} {}", if outcome.is_success() { "done" } else { "failed" }));
    }));

    let report = service.run_batch(inputs).await?;
    progress.finish_and_clear();

    if let Some(path) = &args.output {
        let body = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        std::fs::write(path, body)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }

    let failed = report.failed;
    let total = report.total();
    output(&BatchOutput { report }, json_mode);

    if failed > 0 {
        anyhow::bail!("{failed} of {total} runs failed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ErrorCode, ErrorInfo};

    #[test]
    fn test_human_summary_lists_every_student() {
        let input = TeacherInput::new("수학", 80, 90).with_name("김민수");
        let failed = StudentOutcome::failed(
            0,
            &input,
            ErrorInfo::new(ErrorCode::Timeout, "run exceeded 300 seconds"),
        );
        let report = BatchReport::from_outcomes(vec![failed]);
        let rendered = BatchOutput { report }.to_human();

        assert!(rendered.contains("김민수"));
        assert!(rendered.contains("TIMEOUT"));
        assert!(rendered.contains("succeeded"));
    }

    #[test]
    fn test_json_is_flattened_report() {
        let report = BatchReport::from_outcomes(Vec::new());
        let json = BatchOutput { report }.to_json();
        assert_eq!(json["succeeded"], 0);
        assert!(json["outcomes"].as_array().unwrap().is_empty());
    }
}
