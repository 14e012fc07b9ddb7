//! Reference examples held by the example store.

use serde::{Deserialize, Serialize};

/// Tags attached to a reference example.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleMetadata {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub school_level: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub activity_type: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
    /// Position of this snippet within its source text
    #[serde(default)]
    pub chunk_index: usize,
}

impl ExampleMetadata {
    pub fn for_subject(subject: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.into()),
            ..Default::default()
        }
    }

    pub fn with_school_level(mut self, level: impl Into<String>) -> Self {
        self.school_level = Some(level.into());
        self
    }
}

/// A reference narrative snippet. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceExample {
    pub text: String,
    #[serde(default)]
    pub metadata: ExampleMetadata,
}

impl ReferenceExample {
    pub fn new(text: impl Into<String>, metadata: ExampleMetadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }
}

/// Exact-match metadata filter for example search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleFilter {
    pub subject: Option<String>,
    pub school_level: Option<String>,
}

impl ExampleFilter {
    pub const fn is_empty(&self) -> bool {
        self.subject.is_none() && self.school_level.is_none()
    }

    /// Every constrained field must be present on the metadata and equal.
    pub fn matches(&self, metadata: &ExampleMetadata) -> bool {
        let field_matches = |wanted: &Option<String>, actual: &Option<String>| match wanted {
            Some(wanted) => actual.as_deref() == Some(wanted.as_str()),
            None => true,
        };
        field_matches(&self.subject, &metadata.subject)
            && field_matches(&self.school_level, &metadata.school_level)
    }
}
