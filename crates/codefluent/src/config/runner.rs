use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Placeholder replaced by the workspace path in a runner command
pub const WORKSPACE_PLACEHOLDER: &str = "{workspace}";

/// Configuration for one external runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerProfile {
    /// Human-readable name for the runner (e.g., "Python 3 (unittest)")
    pub name: String,

    /// Program and arguments used to launch the runner
    pub command: Vec<String>,

    /// Environment variables set for the runner process
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl RunnerProfile {
    /// Create a profile that launches `command`
    pub fn new(name: impl Into<String>, command: Vec<String>) -> Self {
        Self {
            name: name.into(),
            command,
            env: HashMap::new(),
        }
    }

    /// Add an environment variable for the runner process
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Build the full argument list for a run against `workspace`
    ///
    /// If any argument contains `{workspace}` it is expanded in place;
    /// otherwise the workspace path is appended as the final argument.
    pub fn command_for(&self, workspace: &Path) -> Vec<String> {
        let workspace = workspace.to_string_lossy();

        if self
            .command
            .iter()
            .any(|arg| arg.contains(WORKSPACE_PLACEHOLDER))
        {
            return self
                .command
                .iter()
                .map(|arg| arg.replace(WORKSPACE_PLACEHOLDER, &workspace))
                .collect();
        }

        let mut args = self.command.clone();
        args.push(workspace.into_owned());
        args
    }
}
