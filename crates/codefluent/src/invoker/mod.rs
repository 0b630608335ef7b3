//! Launching the external runner
//!
//! The orchestrator only knows the [`Invoker`] capability: given a fully
//! written workspace, produce the runner's raw output. [`ProcessInvoker`]
//! implements it by spawning a configured command; other sandbox backends can
//! be substituted without touching the orchestrator.

use async_trait::async_trait;
use thiserror::Error;

pub use crate::invoker::process::ProcessInvoker;
use crate::types::ExecutionResult;
use crate::workspace::Workspace;

mod process;

/// Errors for a runner that could not be started at all
///
/// A runner that starts and then fails its tests is not an error; its output
/// is returned as a normal [`ExecutionResult`].
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("runner command is empty")]
    EmptyCommand,

    #[error("failed to launch runner '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to collect runner output: {0}")]
    Wait(#[source] std::io::Error),
}

/// Runs a submission's workspace through a runner
///
/// Implementations must launch the runner at most once per call and block
/// until it terminates; they impose no timeout of their own.
#[async_trait]
pub trait Invoker: std::fmt::Debug + Send + Sync {
    async fn invoke(&self, workspace: &Workspace) -> Result<ExecutionResult, LaunchError>;
}
