//! Verdict parsing for validator responses.
//!
//! Validators answer in free text that should contain a JSON object. The
//! object is located by trying, in order: the whole response, a fenced
//! ```json block, and the span from the first `{` to the last `}`.
//! Anything unreadable resolves to a passing verdict so that a parse problem
//! never blocks an otherwise finished narrative.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::models::ValidationVerdict;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JsonExtractError {
    #[error("response is empty")]
    Empty,

    #[error("no JSON object found in response")]
    NotFound,

    #[error("malformed JSON object: {0}")]
    Malformed(String),
}

fn parse_object(candidate: &str) -> Result<Value, String> {
    match serde_json::from_str::<Value>(candidate.trim()) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err("top-level value is not an object".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```json").map(|i| i + "```json".len()).or_else(|| {
        text.find("```").map(|i| i + 3)
    })?;
    let rest = &text[start..];
    let end = rest.find("```")?;
    Some(&rest[..end])
}

fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Locate and parse the JSON object inside a free-text response.
pub fn extract_json(text: &str) -> Result<Value, JsonExtractError> {
    if text.trim().is_empty() {
        return Err(JsonExtractError::Empty);
    }

    let mut last_error = None;
    for candidate in [Some(text), fenced_block(text), brace_span(text)]
        .into_iter()
        .flatten()
    {
        match parse_object(candidate) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = Some(e),
        }
    }

    if brace_span(text).is_none() {
        return Err(JsonExtractError::NotFound);
    }
    Err(JsonExtractError::Malformed(last_error.unwrap_or_default()))
}

const fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    #[serde(default = "default_true")]
    is_valid: bool,
    #[serde(default)]
    issues: Vec<RawIssue>,
    #[serde(default)]
    summary: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawIssue {
    Text(String),
    Structured {
        #[serde(rename = "type", default)]
        kind: String,
        #[serde(default)]
        description: String,
        #[serde(default)]
        text: String,
    },
    Other(Value),
}

impl RawIssue {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Structured {
                kind,
                description,
                text,
            } => {
                let detail = if description.is_empty() { text } else { description };
                match (kind.is_empty(), detail.is_empty()) {
                    (true, _) => detail,
                    (false, true) => kind,
                    (false, false) => format!("{kind}: {detail}"),
                }
            }
            Self::Other(value) => value.to_string(),
        }
    }
}

/// Build a verdict from a validator response. Never fails.
pub fn parse_verdict(text: &str) -> ValidationVerdict {
    let value = match extract_json(text) {
        Ok(value) => value,
        Err(e) => return ValidationVerdict::parse_fallback(e.to_string()),
    };

    match serde_json::from_value::<RawVerdict>(value) {
        Ok(raw) => ValidationVerdict {
            is_valid: raw.is_valid,
            issues: raw
                .issues
                .into_iter()
                .map(RawIssue::into_text)
                .filter(|issue| !issue.trim().is_empty())
                .collect(),
            summary: raw.summary,
            forced_approval: false,
            parse_fallback: false,
            error: None,
        },
        Err(e) => ValidationVerdict::parse_fallback(format!("unexpected verdict shape: {e}")),
    }
}
