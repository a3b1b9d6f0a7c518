//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::global::GlobalConfig;
use crate::project::{ProjectConfig, PROJECT_CONFIG_FILE};
use crate::{parse_flag, ConfigError, ConfigResult, ReportFormat, DEFAULT_TIMEOUT_MS};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.tapir/config.toml) - lowest priority
/// 2. Project config (./tapir.toml) - overrides global
/// 3. Environment variables (TAPIR_*) - overrides project
/// 4. CLI flags - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Project configuration (env overrides already applied)
    pub project: ProjectConfig,

    /// Global configuration
    pub global: GlobalConfig,

    /// Project root directory (where tapir.toml was found)
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use an explicit global config path instead of ~/.tapir/config.toml
    pub fn with_global_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find tapir.toml, then loads and merges
    /// global config if it exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;

        // A missing home directory just means no global defaults
        let global_config = match self.load_global_config() {
            Err(ConfigError::HomeNotFound) => GlobalConfig::default(),
            other => other?,
        };

        let project_config = self.apply_env_overrides(project_config)?;

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
        })
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project_config = ProjectConfig::load_from_file(config_path)?;
        let global_config = match self.load_global_config() {
            Err(ConfigError::HomeNotFound) => GlobalConfig::default(),
            other => other?,
        };
        let project_config = self.apply_env_overrides(project_config)?;

        let project_root = config_path.parent().map(|p| p.to_path_buf());

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
        })
    }

    /// Find project configuration by walking up directory tree
    ///
    /// Returns (project_root, project_config); default config when none is found
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_CONFIG_FILE);

            if config_path.exists() {
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ProjectConfig::default())),
            }
        }
    }

    /// Load global configuration from ~/.tapir/config.toml
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => {
                let path = GlobalConfig::global_config_path()?;
                self.global_config_path = Some(path.clone());
                path
            }
        };

        // Global config is optional - if it doesn't exist, return default
        if !path.exists() {
            return Ok(GlobalConfig::default());
        }

        GlobalConfig::load_from_file(&path)
    }

    /// Apply environment variable overrides to project config
    ///
    /// Recognized: TAPIR_TIMEOUT_MS, TAPIR_FORMAT, TAPIR_COLOR
    fn apply_env_overrides(&self, mut config: ProjectConfig) -> ConfigResult<ProjectConfig> {
        if let Ok(timeout) = env::var("TAPIR_TIMEOUT_MS") {
            let timeout_ms = timeout
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue {
                    field: "TAPIR_TIMEOUT_MS".to_string(),
                    reason: format!("expected milliseconds, got '{}'", timeout),
                })?;
            config.runner_mut().timeout_ms = Some(timeout_ms);
        }

        if let Ok(format) = env::var("TAPIR_FORMAT") {
            config.report_mut().format = Some(format.parse()?);
        }

        if let Ok(color) = env::var("TAPIR_COLOR") {
            config.report_mut().color = Some(parse_flag(&color));
        }

        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Effective per-test timeout (project > global > default)
    pub fn timeout(&self) -> Duration {
        let ms = self
            .project
            .timeout_ms()
            .or_else(|| self.global.timeout_ms())
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        Duration::from_millis(ms)
    }

    /// Effective report format (project > global > default)
    pub fn format(&self) -> ReportFormat {
        self.project
            .report
            .as_ref()
            .and_then(|r| r.format)
            .or_else(|| self.global.report.as_ref().and_then(|r| r.format))
            .unwrap_or_default()
    }

    /// Whether output should be colored
    pub fn color(&self) -> bool {
        self.project
            .report
            .as_ref()
            .and_then(|r| r.color)
            .or_else(|| self.global.report.as_ref().and_then(|r| r.color))
            .unwrap_or(true)
    }

    /// Whether every assertion should be printed
    pub fn verbose(&self) -> bool {
        self.project
            .report
            .as_ref()
            .and_then(|r| r.verbose)
            .or_else(|| self.global.report.as_ref().and_then(|r| r.verbose))
            .unwrap_or(false)
    }

    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Check if this is a project (has tapir.toml)
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn create_config_file(dir: &Path, content: &str) -> PathBuf {
        let config_path = dir.join(PROJECT_CONFIG_FILE);
        fs::write(&config_path, content).unwrap();
        config_path
    }

    fn isolated_loader(dir: &Path) -> ConfigLoader {
        ConfigLoader::new().with_global_config_path(dir.join("no-global.toml"))
    }

    #[test]
    #[serial]
    fn test_load_project_config() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(
            temp_dir.path(),
            r#"
[runner]
timeout_ms = 1200
"#,
        );

        let mut loader = isolated_loader(temp_dir.path());
        let config = loader.load_from_directory(temp_dir.path()).unwrap();

        assert_eq!(config.timeout(), Duration::from_millis(1200));
        assert!(config.is_project());
    }

    #[test]
    #[serial]
    fn test_find_config_in_parent() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(
            temp_dir.path(),
            r#"
[report]
format = "json"
"#,
        );

        let sub_dir = temp_dir.path().join("subdir");
        fs::create_dir(&sub_dir).unwrap();

        let mut loader = isolated_loader(temp_dir.path());
        let config = loader.load_from_directory(&sub_dir).unwrap();

        assert_eq!(config.format(), ReportFormat::Json);
        assert_eq!(config.project_root(), Some(temp_dir.path()));
    }

    #[test]
    #[serial]
    fn test_env_override_timeout() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(
            temp_dir.path(),
            r#"
[runner]
timeout_ms = 1200
"#,
        );

        env::set_var("TAPIR_TIMEOUT_MS", "80");

        let mut loader = isolated_loader(temp_dir.path());
        let config = loader.load_from_directory(temp_dir.path()).unwrap();

        assert_eq!(config.timeout(), Duration::from_millis(80));

        env::remove_var("TAPIR_TIMEOUT_MS");
    }

    #[test]
    #[serial]
    fn test_env_override_invalid_timeout() {
        let temp_dir = TempDir::new().unwrap();

        env::set_var("TAPIR_TIMEOUT_MS", "soon");

        let mut loader = isolated_loader(temp_dir.path());
        let result = loader.load_from_directory(temp_dir.path());

        env::remove_var("TAPIR_TIMEOUT_MS");

        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.timeout(), Duration::from_millis(DEFAULT_TIMEOUT_MS));
        assert_eq!(config.format(), ReportFormat::Pretty);
        assert!(config.color());
        assert!(!config.verbose());
    }

    #[test]
    #[serial]
    fn test_load_from_specific_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config_file(
            temp_dir.path(),
            r#"
[report]
verbose = true
"#,
        );

        let mut loader = isolated_loader(temp_dir.path());
        let config = loader.load_from_file(&config_path).unwrap();

        assert!(config.verbose());
    }
}
