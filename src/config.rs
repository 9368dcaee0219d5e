//! Configuration loading
//!
//! Sources are merged in this order (later sources override earlier):
//! 1. Built-in defaults from [`Config::default`]
//! 2. A TOML file: `--config <FILE>` when given, otherwise `<root>/extest.toml` if present
//! 3. Environment variables prefixed with `EXTEST_`, using `__` for nesting
//!    (e.g. `EXTEST_TESTS_DIR`, `EXTEST_RUNNER__PROGRAM`)

use std::path::{Component, Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, DispatchResult};

/// File name looked up in the course root when no `--config` is given.
pub const DEFAULT_CONFIG_FILENAME: &str = "extest.toml";
/// Environment variable prefix.
pub const CONFIG_ENV_PREFIX: &str = "EXTEST_";

/// Dispatcher configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding `test_ex<N>_<slug>` files, relative to the course root
    pub tests_dir: PathBuf,
    /// Extension of test files considered by the exercise registry
    pub test_extension: String,
    /// Reject exercise numbers that have no test file instead of delegating anyway
    pub strict: bool,
    pub runner: RunnerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tests_dir: PathBuf::from("tests"),
            test_extension: "py".to_string(),
            strict: false,
            runner: RunnerConfig::default(),
        }
    }
}

/// How the delegated test tool is invoked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub program: String,
    /// Arguments placed before the selector
    pub extra_args: Vec<String>,
    pub verbose_flag: String,
    pub no_coverage_flag: String,
    /// Exit codes the tool uses for "no tests collected" (pytest: 5)
    pub no_tests_exit_codes: Vec<i32>,
    /// Stream stdout through the dispatcher to capture a summary line
    pub capture_summary: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            program: "pytest".to_string(),
            extra_args: Vec::new(),
            verbose_flag: "-v".to_string(),
            no_coverage_flag: "--no-cov".to_string(),
            no_tests_exit_codes: vec![5],
            capture_summary: true,
        }
    }
}

impl Config {
    /// Absolute-or-root-relative path of the tests directory.
    pub fn tests_path(&self, root: &Path) -> PathBuf {
        root.join(&self.tests_dir)
    }

    pub fn validate(&self) -> DispatchResult<()> {
        if self.tests_dir.as_os_str().is_empty() {
            return Err(DispatchError::Config("tests_dir must not be empty".to_string()));
        }
        if self.tests_dir.is_absolute() || self.tests_dir.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(DispatchError::Config(format!(
                "tests_dir must be a relative path inside the course root, got '{}'",
                self.tests_dir.display()
            )));
        }
        if self.test_extension.is_empty() || self.test_extension.contains(['.', '/', '\\']) {
            return Err(DispatchError::Config(format!(
                "test_extension must be a bare extension like 'py', got '{}'",
                self.test_extension
            )));
        }
        if self.runner.program.trim().is_empty() {
            return Err(DispatchError::Config("runner.program must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Configuration loader
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    root: PathBuf,
    config_path: Option<PathBuf>,
    env_prefix: String,
}

impl ConfigLoader {
    /// Loader for the course rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            config_path: None,
            env_prefix: CONFIG_ENV_PREFIX.to_string(),
        }
    }

    /// Use an explicit config file; it must exist.
    pub fn with_config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn load(&self) -> DispatchResult<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        match &self.config_path {
            Some(path) => {
                if !path.is_file() {
                    return Err(DispatchError::Config(format!("config file not found: {}", path.display())));
                }
                tracing::debug!(path = %path.display(), "loading config file");
                figment = figment.merge(Toml::file(path));
            }
            None => {
                let default_path = self.root.join(DEFAULT_CONFIG_FILENAME);
                if default_path.is_file() {
                    tracing::debug!(path = %default_path.display(), "loading config file");
                    figment = figment.merge(Toml::file(default_path));
                }
            }
        }

        figment = figment.merge(Env::prefixed(&self.env_prefix).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }
}
