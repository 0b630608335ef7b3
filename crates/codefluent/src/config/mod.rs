use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

pub use crate::config::runner::{RunnerProfile, WORKSPACE_PLACEHOLDER};
use crate::interpret::SUCCESS_SENTINEL;
use crate::types::Submission;

mod loader;
pub mod runner;

/// Example configuration embedded at compile time.
///
/// Library users can access this to generate a starter config file.
pub const EXAMPLE_CONFIG: &str = include_str!("../../codefluent.example.toml");

/// Name of the submission file that selects a runner profile
pub const RUNNER_FILE: &str = "Runner";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("runner '{0}' not found in configuration")]
    RunnerNotFound(String),

    #[error("submission does not name a runner and no default runner is configured")]
    NoRunnerSelected,

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Config for Codefluent
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory under which per-submission workspaces are created.
    #[serde(default = "default_workspace_root")]
    pub workspace_root: PathBuf,

    /// Leave workspaces on disk after each run instead of removing them.
    #[serde(default)]
    pub keep_workspaces: bool,

    /// Marker that signals a passing run when present on runner stdout.
    #[serde(default = "default_sentinel")]
    pub sentinel: String,

    /// Runner used for submissions without a `Runner` file.
    #[serde(default)]
    pub default_runner: Option<String>,

    /// Runner profiles keyed by runner ID
    #[serde(default)]
    pub runners: HashMap<String, RunnerProfile>,
}

impl Config {
    /// Create a new config with the embedded runner profiles
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty config with no runners
    pub fn empty() -> Self {
        Self {
            workspace_root: default_workspace_root(),
            keep_workspaces: false,
            sentinel: default_sentinel(),
            default_runner: None,
            runners: HashMap::new(),
        }
    }

    /// Get a runner profile by ID
    pub fn get_runner(&self, id: &str) -> Result<&RunnerProfile, ConfigError> {
        self.runners
            .get(id)
            .ok_or_else(|| ConfigError::RunnerNotFound(id.to_string()))
    }

    /// Pick the runner profile for a submission
    ///
    /// The submission's `Runner` file wins; otherwise `default_runner` is used.
    pub fn runner_for(&self, submission: &Submission) -> Result<&RunnerProfile, ConfigError> {
        match submission.runner_name() {
            Some(id) => self.get_runner(&id),
            None => {
                let id = self
                    .default_runner
                    .as_deref()
                    .ok_or(ConfigError::NoRunnerSelected)?;
                self.get_runner(id)
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::parse_toml(EXAMPLE_CONFIG).expect("embedded default config should be valid")
    }
}

fn default_workspace_root() -> PathBuf {
    std::env::temp_dir().join("codefluent")
}

fn default_sentinel() -> String {
    SUCCESS_SENTINEL.to_string()
}
