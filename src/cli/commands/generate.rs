//! Implementation of the `setk generate` command.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::cli::output::progress::{create_spinner, hidden};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{
    Config, ErrorInfo, GenerationStatus, TeacherInput, TokenUsage, ValidationVerdict,
    WorkflowState, WorkflowStep,
};
use crate::infrastructure::setup::AppContext;

#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    /// Read the student input from a JSON or YAML file
    #[arg(long, conflicts_with_all = ["subject", "midterm", "final_score"])]
    pub input: Option<PathBuf>,

    /// Subject name, e.g. 수학
    #[arg(long)]
    pub subject: Option<String>,

    /// Mid-term performance assessment score
    #[arg(long)]
    pub midterm: Option<u32>,

    /// Final performance assessment score
    #[arg(long = "final")]
    pub final_score: Option<u32>,

    /// Teacher's observations
    #[arg(long)]
    pub notes: Option<String>,

    /// Achievement standards covered by the course
    #[arg(long)]
    pub standards: Option<String>,

    /// School level, e.g. 고등학교
    #[arg(long)]
    pub level: Option<String>,

    /// Student name
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub student_id: Option<i64>,
}

impl GenerateArgs {
    pub fn to_input(&self) -> Result<TeacherInput> {
        if let Some(path) = &self.input {
            return read_input_file(path);
        }

        // Missing scores stay unset so the run reports MissingInput.
        let mut input = TeacherInput::new(self.subject.clone().unwrap_or_default(), 0, 0);
        input.midterm_score = self.midterm;
        input.final_score = self.final_score;
        input.additional_notes.clone_from(&self.notes);
        input.achievement_standards.clone_from(&self.standards);
        input.school_level.clone_from(&self.level);
        input.student_id = self.student_id;
        if let Some(name) = &self.name {
            input.name.clone_from(name);
        }
        Ok(input)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Parse a JSON or YAML document, picking the parser by extension.
pub fn read_document<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if is_json(path) {
        serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
    } else {
        serde_yaml::from_str(&raw).with_context(|| format!("Invalid YAML in {}", path.display()))
    }
}

fn read_input_file(path: &Path) -> Result<TeacherInput> {
    read_document(path)
}

#[derive(Debug, Serialize)]
pub struct GenerateOutput {
    pub run_id: Uuid,
    pub name: String,
    pub subject: String,
    pub status: GenerationStatus,
    pub narrative: Option<String>,
    pub version: Option<u32>,
    pub char_count: Option<usize>,
    pub verdict: Option<ValidationVerdict>,
    pub forced_approval: bool,
    pub fix_attempts: u32,
    pub error: Option<ErrorInfo>,
    pub search_query: Option<String>,
    pub examples_used: usize,
    pub token_usage: TokenUsage,
    pub trace: Vec<WorkflowStep>,
}

impl From<WorkflowState> for GenerateOutput {
    fn from(state: WorkflowState) -> Self {
        let forced_approval = state.is_forced_approval();
        Self {
            run_id: state.run_id,
            name: state.teacher_input.name,
            subject: state.teacher_input.subject,
            status: state.generation_status,
            version: state.narrative.as_ref().map(|n| n.version),
            char_count: state.narrative.as_ref().map(|n| n.char_count()),
            narrative: state.narrative.map(|n| n.content),
            verdict: state.verdict,
            forced_approval,
            fix_attempts: state.fix_attempts,
            error: state.error,
            search_query: state.search_query,
            examples_used: state.retrieved_examples.len(),
            token_usage: state.token_usage,
            trace: state.trace,
        }
    }
}

impl CommandOutput for GenerateOutput {
    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        let who = if self.name.is_empty() { "학생" } else { self.name.as_str() };
        lines.push(format!(
            "{} {} / {}",
            style("세특").bold(),
            who,
            self.subject
        ));

        if let Some(narrative) = &self.narrative {
            lines.push(String::new());
            lines.push(narrative.clone());
            lines.push(String::new());
        }

        let version = self.version.map_or_else(|| "-".to_string(), |v| format!("v{v}"));
        let chars = self.char_count.map_or_else(|| "-".to_string(), |c| c.to_string());
        lines.push(format!(
            "status: {}  version: {version}  chars: {chars}  repairs: {}",
            self.status.as_str(),
            self.fix_attempts
        ));

        if let Some(verdict) = &self.verdict {
            let mut flags = Vec::new();
            if verdict.forced_approval {
                flags.push(style("forced approval").yellow().to_string());
            }
            if verdict.parse_fallback {
                flags.push(style("unparsed verdict").yellow().to_string());
            }
            if verdict.error.is_some() && !verdict.forced_approval && !verdict.parse_fallback {
                flags.push(style("validation skipped").yellow().to_string());
            }
            let flags = if flags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", flags.join(", "))
            };
            lines.push(format!("verdict: {}{flags}", verdict.summary));
            for issue in &verdict.issues {
                lines.push(format!("  - {issue}"));
            }
        }

        if let Some(error) = &self.error {
            lines.push(format!(
                "{} {}: {}",
                style("error").red().bold(),
                error.code,
                error.message
            ));
        }

        lines.push(format!(
            "examples: {}  tokens: {} in / {} out",
            self.examples_used, self.token_usage.input_tokens, self.token_usage.output_tokens
        ));
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: GenerateArgs, config: Config, json_mode: bool) -> Result<()> {
    let input = args.to_input()?;
    let context = AppContext::build(config).await?;

    let spinner = if json_mode {
        hidden()
    } else {
        create_spinner(format!("{} 세특 생성 중", input.subject))
    };
    let result = context.engine.run(input).await;
    spinner.finish_and_clear();

    let state = result?;
    let produced = state.narrative.is_some();
    let out = GenerateOutput::from(state);
    output(&out, json_mode);

    if !produced {
        let reason = out
            .error
            .as_ref()
            .map_or_else(|| "no narrative produced".to_string(), |e| e.to_string());
        anyhow::bail!("generation failed: {reason}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ErrorCode, NarrativeRecord};
    use std::io::Write;

    #[test]
    fn test_flags_build_input() {
        let args = GenerateArgs {
            subject: Some("수학".to_string()),
            midterm: Some(85),
            final_score: Some(92),
            notes: Some("적극적".to_string()),
            name: Some("김민수".to_string()),
            ..Default::default()
        };
        let input = args.to_input().unwrap();
        assert_eq!(input.subject, "수학");
        assert_eq!((input.midterm_score, input.final_score), (Some(85), Some(92)));
        assert_eq!(input.additional_notes.as_deref(), Some("적극적"));
        assert_eq!(input.name, "김민수");
    }

    #[test]
    fn test_missing_score_flag_left_unset() {
        let args = GenerateArgs {
            subject: Some("수학".to_string()),
            midterm: Some(85),
            ..Default::default()
        };
        let input = args.to_input().unwrap();
        assert_eq!(input.final_score, None);
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_yaml_input_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "subject: 물리\nmidterm_score: 70\nfinal_score: 88\nschool_level: 고등학교").unwrap();
        file.flush().unwrap();

        let args = GenerateArgs {
            input: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let input = args.to_input().unwrap();
        assert_eq!(input.subject, "물리");
        assert_eq!(input.school_level.as_deref(), Some("고등학교"));
    }

    #[test]
    fn test_human_output_shows_error_slot() {
        let mut state = WorkflowState::new(TeacherInput::new("수학", 80, 90));
        state.record_error(ErrorCode::GenerationError, "upstream 503");
        let rendered = GenerateOutput::from(state).to_human();
        assert!(rendered.contains("GENERATION_ERROR"));
        assert!(rendered.contains("upstream 503"));
    }

    #[test]
    fn test_output_carries_narrative_and_flags() {
        let mut state = WorkflowState::new(TeacherInput::new("수학", 80, 90));
        state.narrative = Some(NarrativeRecord::first(&state.teacher_input, "본문").revise("수정본"));
        state.verdict = Some(ValidationVerdict::forced());
        let out = GenerateOutput::from(state);

        assert_eq!(out.narrative.as_deref(), Some("수정본"));
        assert_eq!(out.version, Some(2));
        assert!(out.forced_approval);
        assert!(out.to_human().contains("forced approval"));
        assert_eq!(out.to_json()["version"], 2);
    }
}
