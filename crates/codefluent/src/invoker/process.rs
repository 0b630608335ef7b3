//! Process-backed runner invocation

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::config::RunnerProfile;
use crate::invoker::{Invoker, LaunchError};
use crate::types::ExecutionResult;
use crate::workspace::Workspace;

/// Launches a runner profile's command as a child process
///
/// The command runs with the workspace as its working directory and receives
/// the workspace path as its final argument. stdin is closed; stdout and
/// stderr are captured in full. If the returned future is dropped before the
/// runner exits, the child is killed.
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    profile: RunnerProfile,
}

impl ProcessInvoker {
    pub fn new(profile: RunnerProfile) -> Self {
        Self { profile }
    }

    /// Get the runner profile
    pub fn profile(&self) -> &RunnerProfile {
        &self.profile
    }
}

#[async_trait]
impl Invoker for ProcessInvoker {
    #[instrument(skip_all, fields(runner = %self.profile.name, workspace = %workspace.id()))]
    async fn invoke(&self, workspace: &Workspace) -> Result<ExecutionResult, LaunchError> {
        if self.profile.command.is_empty() {
            return Err(LaunchError::EmptyCommand);
        }
        let args = self.profile.command_for(workspace.path());
        let program = &args[0];

        debug!(?args, "launching runner");

        let child = Command::new(program)
            .args(&args[1..])
            .envs(&self.profile.env)
            .current_dir(workspace.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| LaunchError::SpawnFailed {
                program: program.clone(),
                source,
            })?;

        let output = child.wait_with_output().await.map_err(LaunchError::Wait)?;

        let result = ExecutionResult {
            exit_status: output.status.into(),
            stdout: output.stdout,
            stderr: output.stderr,
        };

        debug!(
            exit_code = ?result.exit_status.code,
            signal = ?result.exit_status.signal,
            stdout_len = result.stdout.len(),
            stderr_len = result.stderr.len(),
            "runner finished"
        );

        Ok(result)
    }
}
