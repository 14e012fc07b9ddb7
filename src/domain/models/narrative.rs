//! Versioned narrative record.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use super::teacher_input::TeacherInput;

const KST_OFFSET_SECS: i32 = 9 * 3600;

/// Current time in Korea Standard Time.
pub fn now_kst() -> DateTime<FixedOffset> {
    let kst = FixedOffset::east_opt(KST_OFFSET_SECS).unwrap_or_else(|| Utc.fix());
    Utc::now().with_timezone(&kst)
}

/// Generated evaluation text for one student/subject pair.
///
/// Replaced wholesale on every generation or repair; the version starts at 1
/// and grows by exactly one per write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeRecord {
    pub student_id: Option<i64>,
    pub subject: String,
    pub content: String,
    pub version: u32,
    pub created_at: DateTime<FixedOffset>,
}

impl NarrativeRecord {
    /// First draft for a run.
    pub fn first(input: &TeacherInput, content: impl Into<String>) -> Self {
        Self {
            student_id: input.student_id,
            subject: input.subject.clone(),
            content: content.into(),
            version: 1,
            created_at: now_kst(),
        }
    }

    /// A replacement draft one version above this one.
    pub fn revise(&self, content: impl Into<String>) -> Self {
        Self {
            student_id: self.student_id,
            subject: self.subject.clone(),
            content: content.into(),
            version: self.version + 1,
            created_at: now_kst(),
        }
    }

    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}
