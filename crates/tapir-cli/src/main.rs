use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use tapir_config::ReportFormat;
use tracing_subscriber::EnvFilter;

mod reporter;
mod run;
mod tutorial;

/// Tape-style test harness.
///
/// Runs the built-in tutorial suite and prints a report. Settings come from
/// ~/.tapir/config.toml, then the nearest tapir.toml, then TAPIR_*
/// environment variables, then these flags.
///
/// EXAMPLES:
///     tapir                          Run everything, pretty output
///     tapir --format tap             TAP version 13 on stdout
///     tapir --filter object -v       Matching tests, every assertion
///     tapir --timeout-ms 200         Tighter per-test timeout
///
/// ENVIRONMENT VARIABLES:
///     TAPIR_FORMAT      Default output format (pretty, tap, json)
///     TAPIR_TIMEOUT_MS  Default per-test timeout
///     TAPIR_COLOR       Set to 'false' to disable colors
///     TAPIR_LOG         Log filter for stderr diagnostics (default: warn)
///     NO_COLOR          Set to disable colored output
#[derive(Parser)]
#[command(name = "tapir")]
#[command(version)]
struct Cli {
    /// Output format
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Per-test timeout in milliseconds
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    timeout_ms: Option<u64>,

    /// Only run tests whose name contains PATTERN
    #[arg(long, value_name = "PATTERN")]
    filter: Option<String>,

    /// Print every assertion
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Disable colored output (also when NO_COLOR is set and non-empty)
    #[arg(long)]
    no_color: bool,

    /// Project config file to use instead of searching for tapir.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// List test names and exit
    #[arg(long)]
    list: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Pretty,
    Tap,
    Json,
}

impl From<FormatArg> for ReportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Pretty => ReportFormat::Pretty,
            FormatArg::Tap => ReportFormat::Tap,
            FormatArg::Json => ReportFormat::Json,
        }
    }
}

/// NO_COLOR convention: any non-empty value disables color
fn no_color_requested(value: Option<OsString>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

/// Diagnostics go to stderr so stdout stays a clean report
fn init_tracing() {
    let filter = EnvFilter::try_from_env("TAPIR_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let args = run::RunArgs {
        format: cli.format.map(ReportFormat::from),
        timeout_ms: cli.timeout_ms,
        filter: cli.filter,
        verbose: cli.verbose,
        no_color: cli.no_color || no_color_requested(env::var_os("NO_COLOR")),
        config: cli.config,
        list: cli.list,
    };

    let code = run::run(args)?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from([
            "tapir",
            "--format",
            "json",
            "--timeout-ms",
            "250",
            "--filter",
            "object",
            "-v",
        ]);
        assert!(matches!(cli.format, Some(FormatArg::Json)));
        assert_eq!(cli.timeout_ms, Some(250));
        assert_eq!(cli.filter.as_deref(), Some("object"));
        assert!(cli.verbose);
    }

    #[test]
    fn test_no_color_env_values() {
        assert!(no_color_requested(Some(OsString::from("1"))));
        assert!(no_color_requested(Some(OsString::from("yes"))));
        assert!(!no_color_requested(Some(OsString::new())));
        assert!(!no_color_requested(None));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(Cli::try_parse_from(["tapir", "--timeout-ms", "0"]).is_err());
    }
}
