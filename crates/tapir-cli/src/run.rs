//! Run command - execute the suite and print the report

use crate::reporter::TestReporter;
use crate::tutorial;
use anyhow::{Context, Result};
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use tapir_config::{Config, ConfigLoader, ReportFormat};
use tapir_runtime::report::tap;
use tapir_runtime::TestRunner;
use tracing::debug;

/// Arguments for a run
#[derive(Debug, Default)]
pub struct RunArgs {
    /// Output format; falls back to configuration
    pub format: Option<ReportFormat>,
    /// Per-test timeout override
    pub timeout_ms: Option<u64>,
    /// Keep only tests whose name contains this
    pub filter: Option<String>,
    /// Print every assertion
    pub verbose: bool,
    /// Disable colored output
    pub no_color: bool,
    /// Explicit project config file
    pub config: Option<PathBuf>,
    /// Print test names instead of running
    pub list: bool,
}

/// Run the suite, write the report to stdout and return the exit code
pub fn run(args: RunArgs) -> Result<i32> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_to(args, &mut out)
}

pub fn run_to(args: RunArgs, out: &mut impl Write) -> Result<i32> {
    let config = load_config(&args)?;

    let mut registry = tutorial::registry();
    if let Some(pattern) = &args.filter {
        registry = registry.filter(pattern);
    }

    if args.list {
        for name in registry.names() {
            writeln!(out, "{}", name)?;
        }
        return Ok(0);
    }

    let format = args.format.unwrap_or_else(|| config.format());
    let verbose = args.verbose || config.verbose();
    if args.no_color || !config.color() {
        colored::control::set_override(false);
    }

    let runner = TestRunner::from_config(&config);
    debug!(tests = registry.len(), timeout = ?runner.timeout(), %format, "running suite");
    let report = runner
        .run_blocking(registry)
        .context("Test run aborted")?;

    match format {
        ReportFormat::Pretty => TestReporter::new(verbose).report(&report, out)?,
        ReportFormat::Tap => write!(out, "{}", tap::render(&report))?,
        ReportFormat::Json => writeln!(
            out,
            "{}",
            report.to_json().context("Failed to serialize report")?
        )?,
    }

    Ok(report.exit_code())
}

/// Load configuration and apply command-line overrides on top
fn load_config(args: &RunArgs) -> Result<Config> {
    let mut loader = ConfigLoader::new();
    let mut config = match &args.config {
        Some(path) => loader
            .load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => {
            let cwd = env::current_dir().context("Failed to read current directory")?;
            loader
                .load_from_directory(&cwd)
                .context("Failed to load configuration")?
        }
    };

    if let Some(timeout_ms) = args.timeout_ms {
        config.project.runner_mut().timeout_ms = Some(timeout_ms);
    }
    if let Some(root) = config.project_root() {
        debug!(root = %root.display(), "using project config");
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn run_capture(args: RunArgs) -> (i32, String) {
        let mut out = Vec::new();
        let code = run_to(args, &mut out).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_list_names() {
        let (code, output) = run_capture(RunArgs {
            list: true,
            filter: Some("object".to_string()),
            ..Default::default()
        });
        assert_eq!(code, 0);
        assert_eq!(output, "comparing values inside an object\n");
    }

    #[test]
    fn test_filtered_passing_run() {
        let (code, output) = run_capture(RunArgs {
            format: Some(ReportFormat::Tap),
            filter: Some("not present".to_string()),
            ..Default::default()
        });
        assert_eq!(code, 0);
        assert!(output.starts_with("TAP version 13\n"));
        assert!(output.contains("ok 1 should be strictly equal"));
    }

    #[test]
    fn test_full_run_fails() {
        let (code, output) = run_capture(RunArgs {
            format: Some(ReportFormat::Json),
            ..Default::default()
        });
        assert_eq!(code, 1);
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["summary"]["skipped"], 1);
    }

    #[test]
    fn test_config_file_sets_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tapir.toml");
        fs::write(&path, "[report]\nformat = \"tap\"\n").unwrap();

        let (_, output) = run_capture(RunArgs {
            config: Some(path),
            filter: Some("plan".to_string()),
            ..Default::default()
        });
        assert!(output.starts_with("TAP version 13\n"));
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let dir = tempdir().unwrap();
        let mut out = Vec::new();
        let result = run_to(
            RunArgs {
                config: Some(dir.path().join("missing.toml")),
                ..Default::default()
            },
            &mut out,
        );
        assert!(result.is_err());
    }
}
