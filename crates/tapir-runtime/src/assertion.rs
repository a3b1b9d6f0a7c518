//! Recorded assertion outcomes

use crate::error::TestFault;
use crate::value::Value;
use serde::Serialize;
use std::fmt;

/// Which assertion produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AssertionKind {
    Equal,
    NotEqual,
    LooseEqual,
    NotLooseEqual,
    DeepEqual,
    NotDeepEqual,
    DeepLooseEqual,
    NotDeepLooseEqual,
    Ok,
    NotOk,
    Match,
    DoesNotMatch,
    Pass,
    Fail,
    Comment,
    /// Harness fault with no assertion of its own (timeout, double end, ...)
    Fault,
}

impl AssertionKind {
    /// Operator name as it appears in reports
    pub fn operator(&self) -> &'static str {
        match self {
            AssertionKind::Equal => "equal",
            AssertionKind::NotEqual => "notEqual",
            AssertionKind::LooseEqual => "looseEqual",
            AssertionKind::NotLooseEqual => "notLooseEqual",
            AssertionKind::DeepEqual => "deepEqual",
            AssertionKind::NotDeepEqual => "notDeepEqual",
            AssertionKind::DeepLooseEqual => "deepLooseEqual",
            AssertionKind::NotDeepLooseEqual => "notDeepLooseEqual",
            AssertionKind::Ok => "ok",
            AssertionKind::NotOk => "notOk",
            AssertionKind::Match => "match",
            AssertionKind::DoesNotMatch => "doesNotMatch",
            AssertionKind::Pass => "pass",
            AssertionKind::Fail => "fail",
            AssertionKind::Comment => "comment",
            AssertionKind::Fault => "fault",
        }
    }

    /// Message used when the caller gave none
    pub fn default_message(&self) -> &'static str {
        match self {
            AssertionKind::Equal => "should be strictly equal",
            AssertionKind::NotEqual => "should not be strictly equal",
            AssertionKind::LooseEqual => "should be loosely equal",
            AssertionKind::NotLooseEqual => "should not be loosely equal",
            AssertionKind::DeepEqual => "should be deeply equivalent",
            AssertionKind::NotDeepEqual => "should not be deeply equivalent",
            AssertionKind::DeepLooseEqual => "should be loosely deeply equivalent",
            AssertionKind::NotDeepLooseEqual => "should not be loosely deeply equivalent",
            AssertionKind::Ok => "should be truthy",
            AssertionKind::NotOk => "should be falsy",
            AssertionKind::Match => "should match",
            AssertionKind::DoesNotMatch => "should not match",
            AssertionKind::Pass | AssertionKind::Fail => "(unnamed assert)",
            AssertionKind::Comment => "",
            AssertionKind::Fault => "harness fault",
        }
    }
}

impl fmt::Display for AssertionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operator())
    }
}

/// One recorded outcome. Immutable once recorded.
#[derive(Debug, Clone, Serialize)]
pub struct AssertionResult {
    pub kind: AssertionKind,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<TestFault>,
}

impl AssertionResult {
    pub(crate) fn new(
        kind: AssertionKind,
        passed: bool,
        message: Option<String>,
        actual: Option<Value>,
        expected: Option<Value>,
    ) -> Self {
        Self {
            kind,
            passed,
            message,
            actual,
            expected,
            fault: None,
        }
    }

    pub(crate) fn comment(message: String) -> Self {
        Self::new(AssertionKind::Comment, true, Some(message), None, None)
    }

    pub(crate) fn from_fault(fault: TestFault) -> Self {
        Self {
            kind: AssertionKind::Fault,
            passed: false,
            message: Some(fault.to_string()),
            actual: None,
            expected: None,
            fault: Some(fault),
        }
    }

    /// Comments are informational and never count towards totals
    pub fn is_comment(&self) -> bool {
        self.kind == AssertionKind::Comment
    }

    /// Message to display: the caller's message or the kind's default
    pub fn display_message(&self) -> &str {
        self.message
            .as_deref()
            .unwrap_or_else(|| self.kind.default_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_message_fallback() {
        let result = AssertionResult::new(AssertionKind::DeepEqual, true, None, None, None);
        assert_eq!(result.display_message(), "should be deeply equivalent");

        let named = AssertionResult::new(
            AssertionKind::DeepEqual,
            true,
            Some("objects match".to_string()),
            None,
            None,
        );
        assert_eq!(named.display_message(), "objects match");
    }

    #[test]
    fn test_fault_result_fails() {
        let result = AssertionResult::from_fault(TestFault::DoubleCompletion);
        assert!(!result.passed);
        assert_eq!(result.kind, AssertionKind::Fault);
        assert_eq!(result.display_message(), ".end() already called");
    }

    #[test]
    fn test_operator_serialization_matches_operator() {
        let json = serde_json::to_string(&AssertionKind::NotDeepLooseEqual).unwrap();
        assert_eq!(json, format!("\"{}\"", AssertionKind::NotDeepLooseEqual.operator()));
    }
}
