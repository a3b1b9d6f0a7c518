//! Tapir Configuration System
//!
//! Provides configuration management for the Tapir test harness:
//! - Project configuration (tapir.toml)
//! - Global user configuration (~/.tapir/config.toml)
//! - Configuration precedence and merging
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Global config (~/.tapir/config.toml)
//! 2. Project config (./tapir.toml)
//! 3. Environment variables (TAPIR_*)
//! 4. CLI flags
//!
//! # Example
//!
//! ```no_run
//! use tapir_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("timeout: {:?}", config.timeout());
//! ```

pub mod global;
pub mod loader;
pub mod project;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Default per-test completion timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Output format for a finished run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Colored human-readable summary
    #[default]
    Pretty,
    /// TAP version 13 stream
    Tap,
    /// Machine-readable JSON document
    Json,
}

impl FromStr for ReportFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(ReportFormat::Pretty),
            "tap" => Ok(ReportFormat::Tap),
            "json" => Ok(ReportFormat::Json),
            other => Err(ConfigError::InvalidValue {
                field: "report.format".to_string(),
                reason: format!("must be 'pretty', 'tap', or 'json', got '{}'", other),
            }),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Pretty => write!(f, "pretty"),
            ReportFormat::Tap => write!(f, "tap"),
            ReportFormat::Json => write!(f, "json"),
        }
    }
}

/// `[runner]` section, shared by project and global config
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    /// Per-test completion timeout in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// `[report]` section, shared by project and global config
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// Output format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ReportFormat>,

    /// Colored output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,

    /// Print every assertion, not only failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
}

impl RunnerConfig {
    pub(crate) fn validate(&self, section: &str) -> ConfigResult<()> {
        if self.timeout_ms == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: format!("{}.timeout_ms", section),
                reason: "timeout must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Parse a boolean-ish environment value ("true", "1", "yes")
pub(crate) fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

// Re-export main types
pub use global::GlobalConfig;
pub use loader::{Config, ConfigLoader};
pub use project::ProjectConfig;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_format_from_str() {
        assert_eq!("tap".parse::<ReportFormat>().unwrap(), ReportFormat::Tap);
        assert_eq!("JSON".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert!("xml".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn test_report_format_display_roundtrips() {
        for format in [ReportFormat::Pretty, ReportFormat::Tap, ReportFormat::Json] {
            assert_eq!(format.to_string().parse::<ReportFormat>().unwrap(), format);
        }
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let runner = RunnerConfig {
            timeout_ms: Some(0),
        };
        assert!(runner.validate("runner").is_err());
    }
}
