//! Teacher-supplied input for one student/subject narrative.

use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};

/// Placeholder written into prompts when the teacher left no notes.
pub const NOTES_NONE: &str = "없음";

/// Values teachers type to mean "nothing here".
const EMPTY_SENTINELS: [&str; 4] = ["없음", ".", "-", ""];

/// Returns true when a free-text field carries no information.
pub fn is_empty_sentinel(value: &str) -> bool {
    EMPTY_SENTINELS.contains(&value.trim())
}

/// Structured input for a single workflow run.
///
/// Supplied once at run start and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherInput {
    /// Roster number of the student, if known
    #[serde(default)]
    pub student_id: Option<i64>,

    /// Student name
    #[serde(default)]
    pub name: String,

    /// Subject name, e.g. "수학". Checked by `validate`, not by the parser.
    #[serde(default)]
    pub subject: String,

    /// Mid-term performance assessment score. Required; `validate` rejects `None`.
    #[serde(default)]
    pub midterm_score: Option<u32>,

    /// Final performance assessment score. Required; `validate` rejects `None`.
    #[serde(default)]
    pub final_score: Option<u32>,

    /// Free-text observations from the teacher
    #[serde(default)]
    pub additional_notes: Option<String>,

    /// Achievement standards covered by the course
    #[serde(default)]
    pub achievement_standards: Option<String>,

    /// School level, e.g. "고등학교"
    #[serde(default)]
    pub school_level: Option<String>,
}

impl TeacherInput {
    pub fn new(subject: impl Into<String>, midterm_score: u32, final_score: u32) -> Self {
        Self {
            student_id: None,
            name: String::new(),
            subject: subject.into(),
            midterm_score: Some(midterm_score),
            final_score: Some(final_score),
            additional_notes: None,
            achievement_standards: None,
            school_level: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub const fn with_student_id(mut self, student_id: i64) -> Self {
        self.student_id = Some(student_id);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.additional_notes = Some(notes.into());
        self
    }

    pub fn with_achievement_standards(mut self, standards: impl Into<String>) -> Self {
        self.achievement_standards = Some(standards.into());
        self
    }

    pub fn with_school_level(mut self, level: impl Into<String>) -> Self {
        self.school_level = Some(level.into());
        self
    }

    /// Check that every required field is present.
    pub fn validate(&self) -> DomainResult<()> {
        if self.subject.trim().is_empty() {
            return Err(DomainError::MissingInput("subject".to_string()));
        }
        if self.midterm_score.is_none() {
            return Err(DomainError::MissingInput("midterm_score".to_string()));
        }
        if self.final_score.is_none() {
            return Err(DomainError::MissingInput("final_score".to_string()));
        }
        Ok(())
    }

    /// Notes as they should appear in a prompt.
    pub fn notes_or_none(&self) -> &str {
        match self.additional_notes.as_deref() {
            Some(notes) if !notes.trim().is_empty() => notes,
            _ => NOTES_NONE,
        }
    }

    /// Notes that carry real information, skipping sentinel values.
    pub fn meaningful_notes(&self) -> Option<&str> {
        self.additional_notes
            .as_deref()
            .map(str::trim)
            .filter(|notes| !is_empty_sentinel(notes))
    }

    pub fn standards_or_empty(&self) -> &str {
        self.achievement_standards.as_deref().unwrap_or("")
    }

    /// School level that carries real information.
    pub fn meaningful_level(&self) -> Option<&str> {
        self.school_level
            .as_deref()
            .map(str::trim)
            .filter(|level| !is_empty_sentinel(level))
    }

    /// Name used in prompts and logs.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "학생"
        } else {
            &self.name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels() {
        for value in ["없음", ".", "-", "", "  ", " 없음 "] {
            assert!(is_empty_sentinel(value), "{value:?} should be a sentinel");
        }
        assert!(!is_empty_sentinel("수학 동아리 활동"));
    }

    #[test]
    fn test_validate_requires_subject() {
        let input = TeacherInput::new("  ", 80, 90);
        match input.validate() {
            Err(DomainError::MissingInput(field)) => assert_eq!(field, "subject"),
            other => panic!("expected MissingInput, got {other:?}"),
        }
        assert!(TeacherInput::new("수학", 80, 90).validate().is_ok());
    }

    #[test]
    fn test_notes_defaults() {
        let input = TeacherInput::new("수학", 85, 90);
        assert_eq!(input.notes_or_none(), NOTES_NONE);
        assert_eq!(input.meaningful_notes(), None);

        let input = input.with_notes("없음");
        assert_eq!(input.notes_or_none(), "없음");
        assert_eq!(input.meaningful_notes(), None);

        let input = TeacherInput::new("수학", 85, 90).with_notes("수학 탐구 보고서 작성");
        assert_eq!(input.meaningful_notes(), Some("수학 탐구 보고서 작성"));
    }

    #[test]
    fn test_deserialize_minimal() {
        let json = r#"{"subject": "물리", "midterm_score": 70, "final_score": 88}"#;
        let input: TeacherInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.subject, "물리");
        assert_eq!(input.name, "");
        assert_eq!(input.display_name(), "학생");
        assert!(input.additional_notes.is_none());
    }

    #[test]
    fn test_missing_score_rejected_by_validate() {
        let json = r#"{"subject": "물리", "midterm_score": 70}"#;
        let input: TeacherInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.final_score, None);
        match input.validate() {
            Err(DomainError::MissingInput(field)) => assert_eq!(field, "final_score"),
            other => panic!("expected MissingInput, got {other:?}"),
        }

        let json = r#"{"subject": "물리", "name": "김민수"}"#;
        let input: TeacherInput = serde_json::from_str(json).unwrap();
        match input.validate() {
            Err(DomainError::MissingInput(field)) => assert_eq!(field, "midterm_score"),
            other => panic!("expected MissingInput, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_score_is_a_real_score() {
        let json = r#"{"subject": "물리", "midterm_score": 0, "final_score": 0}"#;
        let input: TeacherInput = serde_json::from_str(json).unwrap();
        assert_eq!((input.midterm_score, input.final_score), (Some(0), Some(0)));
        assert!(input.validate().is_ok());
    }
}
