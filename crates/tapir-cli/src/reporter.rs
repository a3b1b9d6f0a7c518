//! Pretty reporter - human-readable run output

use colored::*;
use std::io::{self, Write};
use tapir_runtime::{AssertionResult, Report, TestReport, TestStatus};

/// Colored terminal reporter
pub struct TestReporter {
    /// Show every assertion instead of one character per test
    verbose: bool,
}

impl Default for TestReporter {
    fn default() -> Self {
        Self::new(false)
    }
}

impl TestReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Write the whole report: per-test lines, summary, then failure details
    pub fn report(&self, report: &Report, out: &mut impl Write) -> io::Result<()> {
        for test in &report.tests {
            self.write_test(test, out)?;
        }

        // Dots need a newline before the summary
        if !self.verbose && !report.tests.is_empty() {
            writeln!(out)?;
        }

        writeln!(out)?;
        self.write_summary(report, out)?;
        self.write_failures(report, out)?;
        out.flush()
    }

    fn write_test(&self, test: &TestReport, out: &mut impl Write) -> io::Result<()> {
        let indent = "  ".repeat(test.depth);
        if !self.verbose {
            let mark = match test.status {
                TestStatus::Passed => ".".green(),
                TestStatus::Failed => "F".red().bold(),
                TestStatus::Skipped => "s".yellow(),
            };
            return write!(out, "{}", mark);
        }

        match test.status {
            TestStatus::Passed => writeln!(
                out,
                "{}{} {} ({:.2?})",
                indent,
                "PASS".green().bold(),
                test.name,
                test.duration
            )?,
            TestStatus::Failed => writeln!(
                out,
                "{}{} {} ({:.2?})",
                indent,
                "FAIL".red().bold(),
                test.name,
                test.duration
            )?,
            TestStatus::Skipped => {
                return writeln!(out, "{}{} {}", indent, "SKIP".yellow().bold(), test.name);
            }
        }

        for result in &test.assertions {
            if result.is_comment() {
                writeln!(out, "{}    {}", indent, format!("# {}", result.display_message()).dimmed())?;
            } else if result.passed {
                writeln!(out, "{}    {} {}", indent, "✓".green(), result.display_message())?;
            } else {
                writeln!(out, "{}    {} {}", indent, "✗".red(), result.display_message())?;
            }
        }
        Ok(())
    }

    fn write_summary(&self, report: &Report, out: &mut impl Write) -> io::Result<()> {
        let summary = &report.summary;
        writeln!(out, "{}", "─".repeat(50))?;

        let status = if report.is_success() {
            "PASSED".green().bold()
        } else {
            "FAILED".red().bold()
        };

        writeln!(
            out,
            "Test result: {} | {} assertions, {} passed, {} failed, {} skipped",
            status,
            summary.total.to_string().bold(),
            summary.passed.to_string().green().bold(),
            if summary.failed > 0 {
                summary.failed.to_string().red().bold()
            } else {
                summary.failed.to_string().normal()
            },
            summary.skipped.to_string().yellow()
        )?;

        let elapsed: std::time::Duration = report.tests.iter().map(|t| t.duration).sum();
        writeln!(out, "Time: {:.2?}", elapsed)
    }

    fn write_failures(&self, report: &Report, out: &mut impl Write) -> io::Result<()> {
        let mut failures = report.failures().peekable();
        if failures.peek().is_none() {
            return Ok(());
        }

        writeln!(out)?;
        writeln!(out, "{}", "Failures:".red().bold())?;
        writeln!(out)?;

        for (test, result) in failures {
            writeln!(out, "  {} {}", "●".red(), test.name.bold())?;
            write_failure_detail(result, out)?;
            writeln!(out)?;
        }
        Ok(())
    }
}

fn write_failure_detail(result: &AssertionResult, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "    {}", result.display_message())?;
    writeln!(out, "      {} {}", "operator:".dimmed(), result.kind)?;
    if let Some(expected) = &result.expected {
        writeln!(out, "      {} {}", "expected:".dimmed(), expected.to_string().green())?;
    }
    if let Some(actual) = &result.actual {
        writeln!(out, "      {} {}", "actual:  ".dimmed(), actual.to_string().red())?;
    }
    if let Some(fault) = &result.fault {
        writeln!(out, "      {} {}", "fault:   ".dimmed(), fault.to_string().yellow())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tapir_runtime::{Registry, TestRunner};

    fn sample_report() -> Report {
        let mut registry = Registry::new();
        registry
            .test("passes", |t| {
                t.comment("warming up");
                t.equal(1, 1, "one is one");
                t.end();
            })
            .test("fails", |t| {
                t.deep_equal(tapir_runtime::Value::array([1]), tapir_runtime::Value::array([2]), "arrays differ");
                t.end();
            })
            .skip("later", |t| t.end());

        TestRunner::new()
            .with_timeout(Duration::from_millis(200))
            .run_blocking(registry)
            .unwrap()
    }

    fn render(verbose: bool) -> String {
        colored::control::set_override(false);
        let mut out = Vec::new();
        TestReporter::new(verbose)
            .report(&sample_report(), &mut out)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_reporter_verbose() {
        let output = render(true);
        assert!(output.contains("PASS passes"));
        assert!(output.contains("✓ one is one"));
        assert!(output.contains("# warming up"));
        assert!(output.contains("FAIL fails"));
        assert!(output.contains("SKIP later"));
        assert!(output.contains("Test result: FAILED | 2 assertions, 1 passed, 1 failed, 1 skipped"));
    }

    #[test]
    fn test_reporter_quiet_mode() {
        let output = render(false);
        assert!(output.starts_with(".Fs\n"));
    }

    #[test]
    fn test_reporter_failure_details() {
        let output = render(false);
        assert!(output.contains("Failures:"));
        assert!(output.contains("arrays differ"));
        assert!(output.contains("expected: [ 2 ]"));
        assert!(output.contains("actual:   [ 1 ]"));
    }

    #[test]
    fn test_reporter_empty() {
        colored::control::set_override(false);
        let mut out = Vec::new();
        TestReporter::new(true)
            .report(&Report::new(Vec::new()), &mut out)
            .unwrap();
        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("PASSED"));
        assert!(!output.contains("Failures:"));
    }
}
