//! Run reports
//!
//! A [`Report`] is the complete outcome of one run: per-test detail in
//! execution order plus totals. It serializes to JSON through serde and
//! renders to TAP through [`tap::render`].

pub mod tap;

use crate::assertion::AssertionResult;
use serde::{Serialize, Serializer};
use std::time::Duration;

/// Final status of one test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
}

/// Outcome of one test case
#[derive(Debug, Clone, Serialize)]
pub struct TestReport {
    pub name: String,
    /// 0 for top-level tests, parent depth + 1 for subtests
    pub depth: usize,
    pub status: TestStatus,
    pub assertions: Vec<AssertionResult>,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl TestReport {
    pub(crate) fn completed(
        name: String,
        depth: usize,
        assertions: Vec<AssertionResult>,
        duration: Duration,
    ) -> Self {
        let failed = assertions.iter().any(|r| !r.is_comment() && !r.passed);
        Self {
            name,
            depth,
            status: if failed {
                TestStatus::Failed
            } else {
                TestStatus::Passed
            },
            assertions,
            duration,
        }
    }

    pub(crate) fn skipped(name: String, depth: usize) -> Self {
        Self {
            name,
            depth,
            status: TestStatus::Skipped,
            assertions: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.status == TestStatus::Skipped
    }

    pub fn is_failed(&self) -> bool {
        self.status == TestStatus::Failed
    }

    /// Recorded results minus comments
    pub fn counted(&self) -> impl Iterator<Item = &AssertionResult> {
        self.assertions.iter().filter(|r| !r.is_comment())
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Totals across the run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Recorded assertions, comments excluded
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Skipped test cases
    pub skipped: usize,
}

/// Complete outcome of a run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub tests: Vec<TestReport>,
    pub summary: Summary,
}

impl Report {
    pub fn new(tests: Vec<TestReport>) -> Self {
        let mut summary = Summary::default();
        for test in &tests {
            if test.is_skipped() {
                summary.skipped += 1;
            }
            for result in test.counted() {
                summary.total += 1;
                if result.passed {
                    summary.passed += 1;
                } else {
                    summary.failed += 1;
                }
            }
        }
        Self { tests, summary }
    }

    /// Names of skipped tests, in order
    pub fn skipped(&self) -> Vec<&str> {
        self.tests
            .iter()
            .filter(|t| t.is_skipped())
            .map(|t| t.name.as_str())
            .collect()
    }

    /// Every failed result paired with its test
    pub fn failures(&self) -> impl Iterator<Item = (&TestReport, &AssertionResult)> {
        self.tests
            .iter()
            .flat_map(|test| test.counted().filter(|r| !r.passed).map(move |r| (test, r)))
    }

    pub fn is_success(&self) -> bool {
        self.summary.failed == 0
    }

    /// Pretty-printed JSON document
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Process exit code: 0 when nothing failed, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertion::AssertionKind;
    use crate::error::TestFault;
    use pretty_assertions::assert_eq;

    fn result(passed: bool) -> AssertionResult {
        AssertionResult::new(AssertionKind::Ok, passed, None, None, None)
    }

    #[test]
    fn test_summary_counts() {
        let report = Report::new(vec![
            TestReport::completed(
                "a".to_string(),
                0,
                vec![result(true), AssertionResult::comment("note".to_string())],
                Duration::ZERO,
            ),
            TestReport::completed(
                "b".to_string(),
                0,
                vec![result(true), result(false)],
                Duration::ZERO,
            ),
            TestReport::skipped("c".to_string(), 0),
        ]);

        assert_eq!(
            report.summary,
            Summary {
                total: 3,
                passed: 2,
                failed: 1,
                skipped: 1,
            }
        );
        assert_eq!(report.skipped(), vec!["c"]);
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_status_from_results() {
        let passed = TestReport::completed("p".to_string(), 0, vec![result(true)], Duration::ZERO);
        let faulted = TestReport::completed(
            "f".to_string(),
            0,
            vec![AssertionResult::from_fault(TestFault::ExitedWithoutEnd)],
            Duration::ZERO,
        );
        assert_eq!(passed.status, TestStatus::Passed);
        assert_eq!(faulted.status, TestStatus::Failed);
    }

    #[test]
    fn test_empty_report_succeeds() {
        let report = Report::new(Vec::new());
        assert!(report.is_success());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_json_shape() {
        let report = Report::new(vec![TestReport::completed(
            "json".to_string(),
            0,
            vec![result(true)],
            Duration::from_millis(12),
        )]);
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(json["summary"]["total"], 1);
        assert_eq!(json["tests"][0]["status"], "passed");
        assert_eq!(json["tests"][0]["duration_ms"], 12);
        assert_eq!(json["tests"][0]["assertions"][0]["kind"], "ok");
    }
}
