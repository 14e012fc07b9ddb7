//! Outcome of one validation pass.

use serde::{Deserialize, Serialize};

pub const FORCED_APPROVAL_SUMMARY: &str = "최대 수정 횟수 도달로 강제 승인";
pub const PARSE_FALLBACK_SUMMARY: &str = "검증 파싱 실패로 통과";
pub const PASS_THROUGH_SUMMARY: &str = "검증 호출 실패로 통과";
pub const REPAIR_COMMITTED_SUMMARY: &str = "수정 완료 - 추가 검증 없이 승인";

/// Structured result of a validation pass.
///
/// A fresh verdict replaces the previous one; verdicts are never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub is_valid: bool,

    /// Issues in the order the validator reported them
    #[serde(default)]
    pub issues: Vec<String>,

    #[serde(default)]
    pub summary: String,

    /// Set when approval came from exhausting the repair budget
    #[serde(default)]
    pub forced_approval: bool,

    /// Set when the validator response could not be parsed
    #[serde(default)]
    pub parse_fallback: bool,

    /// Failure that was swallowed to produce this verdict
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationVerdict {
    pub fn valid(summary: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            issues: Vec::new(),
            summary: summary.into(),
            forced_approval: false,
            parse_fallback: false,
            error: None,
        }
    }

    pub fn invalid(issues: Vec<String>, summary: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            issues,
            summary: summary.into(),
            forced_approval: false,
            parse_fallback: false,
            error: None,
        }
    }

    /// Approval granted because the repair budget is spent.
    pub fn forced() -> Self {
        Self {
            forced_approval: true,
            ..Self::valid(FORCED_APPROVAL_SUMMARY)
        }
    }

    /// Default pass used when the validator's reply is unreadable.
    pub fn parse_fallback(reason: impl Into<String>) -> Self {
        Self {
            parse_fallback: true,
            error: Some(reason.into()),
            ..Self::valid(PARSE_FALLBACK_SUMMARY)
        }
    }

    /// Default pass used when the validation call itself failed.
    pub fn pass_through(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::valid(PASS_THROUGH_SUMMARY)
        }
    }

    /// Synthetic verdict written when a repair is committed without re-checking.
    pub fn repair_committed() -> Self {
        Self::valid(REPAIR_COMMITTED_SUMMARY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forced_is_distinguishable_from_valid() {
        let forced = ValidationVerdict::forced();
        let genuine = ValidationVerdict::valid("좋음");
        assert!(forced.is_valid && genuine.is_valid);
        assert!(forced.forced_approval);
        assert!(!genuine.forced_approval);
        assert!(forced.issues.is_empty());
    }

    #[test]
    fn test_parse_fallback_flags() {
        let verdict = ValidationVerdict::parse_fallback("no JSON object found");
        assert!(verdict.is_valid);
        assert!(verdict.parse_fallback);
        assert!(!verdict.forced_approval);
        assert!(verdict.issues.is_empty());
        assert_eq!(verdict.summary, PARSE_FALLBACK_SUMMARY);
    }

    #[test]
    fn test_error_skipped_when_absent() {
        let json = serde_json::to_value(ValidationVerdict::valid("ok")).unwrap();
        assert!(json.get("error").is_none());
        let json = serde_json::to_value(ValidationVerdict::pass_through("timeout")).unwrap();
        assert_eq!(json["error"], "timeout");
    }
}
