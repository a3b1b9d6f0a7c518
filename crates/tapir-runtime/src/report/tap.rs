//! TAP version 13 output

use super::Report;
use crate::assertion::{AssertionKind, AssertionResult};
use std::fmt::Write;

/// Render a report as TAP version 13 text
pub fn render(report: &Report) -> String {
    let mut out = String::from("TAP version 13\n");
    let mut number = 0;

    for test in &report.tests {
        if test.is_skipped() {
            let _ = writeln!(out, "# SKIP {}", test.name);
            continue;
        }
        let _ = writeln!(out, "# {}", test.name);
        for result in &test.assertions {
            if result.is_comment() {
                for line in result.display_message().lines() {
                    let _ = writeln!(out, "# {}", line);
                }
                continue;
            }
            number += 1;
            write_result(&mut out, number, result);
        }
    }

    let summary = &report.summary;
    let _ = writeln!(out, "\n1..{}", summary.total);
    let _ = writeln!(out, "# tests {}", summary.total);
    let _ = writeln!(out, "# pass  {}", summary.passed);
    if summary.skipped > 0 {
        let _ = writeln!(out, "# skip  {}", summary.skipped);
    }
    if summary.failed > 0 {
        let _ = writeln!(out, "# fail  {}", summary.failed);
    } else {
        let _ = writeln!(out, "\n# ok");
    }
    out
}

fn write_result(out: &mut String, number: usize, result: &AssertionResult) {
    let status = if result.passed { "ok" } else { "not ok" };
    let _ = writeln!(out, "{} {} {}", status, number, result.display_message());
    if result.passed {
        return;
    }

    // YAML diagnostic block
    let _ = writeln!(out, "  ---");
    let _ = writeln!(out, "    operator: {}", result.kind.operator());
    if let Some(expected) = &result.expected {
        let _ = writeln!(out, "    expected: {}", expected);
    }
    if let Some(actual) = &result.actual {
        let _ = writeln!(out, "    actual:   {}", actual);
    }
    if let Some(fault) = &result.fault {
        if result.kind != AssertionKind::Fault {
            let _ = writeln!(out, "    fault:    {}", fault);
        }
    }
    let _ = writeln!(out, "  ...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TestFault;
    use crate::report::TestReport;
    use crate::value::Value;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn test_render_passing_run() {
        let report = Report::new(vec![TestReport::completed(
            "math".to_string(),
            0,
            vec![
                AssertionResult::new(
                    AssertionKind::Equal,
                    true,
                    None,
                    Some(Value::from(2)),
                    Some(Value::from(2)),
                ),
                AssertionResult::comment("done".to_string()),
            ],
            Duration::ZERO,
        )]);

        let expected = "\
TAP version 13
# math
ok 1 should be strictly equal
# done

1..1
# tests 1
# pass  1

# ok
";
        assert_eq!(render(&report), expected);
    }

    #[test]
    fn test_render_failure_block() {
        let report = Report::new(vec![
            TestReport::completed(
                "objects".to_string(),
                0,
                vec![
                    AssertionResult::new(
                        AssertionKind::Equal,
                        false,
                        Some("same object".to_string()),
                        Some(Value::object([("id", 1)])),
                        Some(Value::object([("id", 1)])),
                    ),
                    AssertionResult::from_fault(TestFault::DoubleCompletion),
                ],
                Duration::ZERO,
            ),
            TestReport::skipped("later".to_string(), 0),
        ]);

        let expected = "\
TAP version 13
# objects
not ok 1 same object
  ---
    operator: equal
    expected: { id: 1 }
    actual:   { id: 1 }
  ...
not ok 2 .end() already called
  ---
    operator: fault
  ...
# SKIP later

1..2
# tests 2
# pass  0
# skip  1
# fail  2
";
        assert_eq!(render(&report), expected);
    }
}
