//! Project Configuration (tapir.toml)
//!
//! Handles project-level configuration stored in `tapir.toml` at the project root.

use crate::{ConfigError, ConfigResult, ReportConfig, RunnerConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name searched for when walking up from the start directory
pub const PROJECT_CONFIG_FILE: &str = "tapir.toml";

/// Project configuration from tapir.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Runner settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runner: Option<RunnerConfig>,

    /// Report settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportConfig>,
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(runner) = &self.runner {
            runner.validate("runner")?;
        }
        Ok(())
    }

    /// Configured timeout, if present
    pub fn timeout_ms(&self) -> Option<u64> {
        self.runner.as_ref().and_then(|r| r.timeout_ms)
    }

    /// Mutable access to the runner section, created on demand
    pub fn runner_mut(&mut self) -> &mut RunnerConfig {
        self.runner.get_or_insert_with(Default::default)
    }

    /// Mutable access to the report section, created on demand
    pub fn report_mut(&mut self) -> &mut ReportConfig {
        self.report.get_or_insert_with(Default::default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReportFormat;

    #[test]
    fn test_parse_full_project_config() {
        let toml = r#"
[runner]
timeout_ms = 250

[report]
format = "tap"
color = false
verbose = true
"#;

        let config: ProjectConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout_ms(), Some(250));
        let report = config.report.unwrap();
        assert_eq!(report.format, Some(ReportFormat::Tap));
        assert_eq!(report.color, Some(false));
        assert_eq!(report.verbose, Some(true));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let toml = r#"
[runner]
timeout_ms = 250
retries = 3
"#;
        assert!(toml::from_str::<ProjectConfig>(toml).is_err());
    }

    #[test]
    fn test_unknown_format_rejected() {
        let toml = r#"
[report]
format = "xml"
"#;
        assert!(toml::from_str::<ProjectConfig>(toml).is_err());
    }
}
