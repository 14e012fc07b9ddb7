//! Example retriever: turns teacher input into example searches.
//!
//! Two modes are offered. `search_examples` builds a composite query from the
//! input, filters by subject and level where that is meaningful, and backfills
//! from an unfiltered search. `get_diverse_examples` over-fetches by subject
//! and drops candidates whose opening characters mirror an already chosen one.
//! That check is positional character equality on a short prefix; it catches
//! near-verbatim repeats only and is no substitute for semantic dedup.

use std::sync::Arc;
use tracing::debug;

use super::example_store::ExampleStore;
use crate::domain::models::{is_empty_sentinel, ExampleFilter, TeacherInput};

/// Subjects for which a subject filter is applied. Matched by substring.
pub const COMMON_SUBJECTS: [&str; 27] = [
    "수학", "영어", "국어", "과학", "물리", "화학", "생물", "지구과학", "역사", "한국사",
    "세계사", "지리", "한국지리", "세계지리", "정치", "경제", "사회", "윤리", "도덕", "철학",
    "음악", "미술", "체육", "기술", "가정", "정보", "컴퓨터",
];

/// Query used when nothing else could be assembled.
pub const GENERIC_QUERY: &str = "학생 세부능력 특기사항";

const STANDARDS_EXCERPT_CHARS: usize = 50;
const PREFIX_CHARS: usize = 50;
const SIMILARITY_THRESHOLD: f64 = 0.8;

/// True when `subject` contains one of the common subject names.
pub fn is_common_subject(subject: &str) -> bool {
    COMMON_SUBJECTS.iter().any(|common| subject.contains(common))
}

/// Fields that steer an example search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExampleQuery {
    pub subject: String,
    pub notes: Option<String>,
    pub achievement_standards: Option<String>,
    pub school_level: Option<String>,
}

impl ExampleQuery {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Default::default()
        }
    }

    fn level(&self) -> Option<&str> {
        self.school_level
            .as_deref()
            .map(str::trim)
            .filter(|level| !is_empty_sentinel(level))
    }

    fn notes(&self) -> Option<&str> {
        self.notes
            .as_deref()
            .map(str::trim)
            .filter(|notes| !is_empty_sentinel(notes))
    }

    /// First non-empty line of the standards, cut to a short excerpt.
    fn standards_excerpt(&self) -> Option<String> {
        self.achievement_standards
            .as_deref()?
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(|line| line.chars().take(STANDARDS_EXCERPT_CHARS).collect())
    }

    /// Composite free-text query for the example store.
    pub fn to_query_string(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        let level = self.level();

        if let Some(level) = level {
            parts.push(format!("학교급: {level}"));
        }
        if is_common_subject(&self.subject) {
            parts.push(format!("과목: {}", self.subject));
        }
        if let Some(notes) = self.notes() {
            let at = usize::from(level.is_some());
            parts.insert(at, format!("추가사항: {notes}"));
        }
        if let Some(excerpt) = self.standards_excerpt() {
            parts.push(format!("학습내용: {excerpt}"));
        }

        if !parts.is_empty() {
            return parts.join(" ");
        }
        if !self.subject.trim().is_empty() {
            return self.subject.trim().to_string();
        }
        GENERIC_QUERY.to_string()
    }

    /// Metadata filter for the first search, if any field qualifies.
    pub fn to_filter(&self) -> Option<ExampleFilter> {
        let filter = ExampleFilter {
            subject: is_common_subject(&self.subject).then(|| self.subject.clone()),
            school_level: self.level().map(str::to_string),
        };
        (!filter.is_empty()).then_some(filter)
    }
}

impl From<&TeacherInput> for ExampleQuery {
    fn from(input: &TeacherInput) -> Self {
        Self {
            subject: input.subject.clone(),
            notes: input.additional_notes.clone(),
            achievement_standards: input.achievement_standards.clone(),
            school_level: input.school_level.clone(),
        }
    }
}

/// Texts returned by a search, plus the query that produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrievedExamples {
    pub query: String,
    pub texts: Vec<String>,
}

/// Share of equal characters at equal positions over the first 50 chars.
///
/// Normalised by the shorter prefix. Two empty prefixes are identical; an
/// empty prefix against a non-empty one shares nothing.
pub fn prefix_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().take(PREFIX_CHARS).collect();
    let b: Vec<char> = b.chars().take(PREFIX_CHARS).collect();
    let shorter = a.len().min(b.len());
    if shorter == 0 {
        return if a.is_empty() && b.is_empty() { 1.0 } else { 0.0 };
    }

    let same = a.iter().zip(b.iter()).filter(|(x, y)| x == y).count();
    same as f64 / shorter as f64
}

pub struct ExampleRetriever {
    store: Arc<ExampleStore>,
}

impl ExampleRetriever {
    pub fn new(store: Arc<ExampleStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<ExampleStore> {
        &self.store
    }

    /// Up to `k` example texts for a first draft.
    ///
    /// Filtered hits come first; any shortfall is topped up from an
    /// unfiltered search, skipping texts already selected.
    pub async fn search_examples(&self, query: &ExampleQuery, k: usize) -> RetrievedExamples {
        let query_string = query.to_query_string();
        if k == 0 {
            return RetrievedExamples {
                query: query_string,
                texts: Vec::new(),
            };
        }

        let filter = query.to_filter();
        let mut texts: Vec<String> = self
            .store
            .search(&query_string, k, filter.as_ref())
            .await
            .into_iter()
            .map(|example| example.text)
            .collect();

        if filter.is_some() && texts.len() < k {
            let shortfall = k - texts.len();
            // Ask for k so already-selected hits cannot crowd out the shortfall.
            let backfill: Vec<String> = self
                .store
                .search(&query_string, k, None)
                .await
                .into_iter()
                .map(|example| example.text)
                .filter(|text| !texts.contains(text))
                .take(shortfall)
                .collect();
            debug!(
                filtered = texts.len(),
                backfilled = backfill.len(),
                "example search backfilled"
            );
            texts.extend(backfill);
        }

        texts.truncate(k);
        RetrievedExamples {
            query: query_string,
            texts,
        }
    }

    /// Up to `k` mutually dissimilar example texts for `subject`.
    pub async fn get_diverse_examples(&self, subject: &str, k: usize) -> Vec<String> {
        if k == 0 {
            return Vec::new();
        }

        let candidates = self
            .store
            .search(&format!("과목: {subject}"), k * 2, None)
            .await;

        let mut selected: Vec<String> = Vec::with_capacity(k);
        for candidate in candidates {
            if selected.len() >= k {
                break;
            }
            let too_similar = selected
                .iter()
                .any(|chosen| prefix_similarity(chosen, &candidate.text) >= SIMILARITY_THRESHOLD);
            if !too_similar {
                selected.push(candidate.text);
            }
        }
        selected
    }
}
