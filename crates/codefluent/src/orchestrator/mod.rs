//! Submission orchestration
//!
//! Sequences one submission through its stages: allocate a workspace, write
//! every file, invoke the runner once, and interpret its output. A stage only
//! starts after the previous one succeeded; the first error ends the run and
//! is returned as-is. Nothing is retried.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

pub use crate::orchestrator::state::{OrchestrationState, Stage};

use crate::config::{Config, RunnerProfile};
use crate::interpret::Interpreter;
use crate::invoker::{Invoker, LaunchError, ProcessInvoker};
use crate::types::{Submission, SubmissionFile, Verdict};
use crate::workspace::{
    MaterializeError, ValidationError, Workspace, WorkspaceError, WorkspaceManager, materialize,
};

mod state;

/// Errors that end a submission run before a verdict is produced
///
/// Each error is local to one submission. A runner that starts and fails its
/// tests is not an error; it yields a failing [`Verdict`].
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// The submission was rejected before any I/O
    #[error("invalid submission: {0}")]
    Validation(#[from] ValidationError),

    /// No workspace could be allocated
    #[error("failed to allocate workspace: {0}")]
    Resource(#[from] WorkspaceError),

    /// Some files were not written; the runner was not started
    #[error("failed to write {} file(s): {}", .failed.len(), .failed.join(", "))]
    PartialWrite { failed: Vec<String> },

    /// The runner process could not be started
    #[error("failed to launch runner: {0}")]
    Launch(#[from] LaunchError),
}

impl SubmissionError {
    /// The stage the run failed in
    pub fn stage(&self) -> Stage {
        match self {
            SubmissionError::Validation(_) => Stage::Validate,
            SubmissionError::Resource(_) => Stage::CreateWorkspace,
            SubmissionError::PartialWrite { .. } => Stage::WriteFiles,
            SubmissionError::Launch(_) => Stage::Execute,
        }
    }
}

impl From<MaterializeError> for SubmissionError {
    fn from(error: MaterializeError) -> Self {
        match error {
            MaterializeError::Validation(e) => SubmissionError::Validation(e),
            MaterializeError::PartialWrite { failed } => SubmissionError::PartialWrite { failed },
        }
    }
}

/// Serializable form of a [`SubmissionError`], `{"error": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub error: String,
}

impl From<&SubmissionError> for ErrorReport {
    fn from(error: &SubmissionError) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}

/// Runs submissions end to end
///
/// An orchestrator can be shared between tasks; every call to
/// [`run_submission`](Self::run_submission) owns its own workspace and state,
/// so concurrent submissions never observe each other.
///
/// Workspace removal runs in the background. Clones share the set of pending
/// removals, so a caller about to exit should await
/// [`wait_for_cleanup`](Self::wait_for_cleanup) first.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    workspaces: Arc<WorkspaceManager>,
    invoker: Arc<dyn Invoker>,
    interpreter: Interpreter,
    cleanups: Arc<Mutex<JoinSet<()>>>,
}

impl Orchestrator {
    /// Create an orchestrator using the standard `CF_OK` sentinel
    pub fn new(workspaces: WorkspaceManager, invoker: Arc<dyn Invoker>) -> Self {
        Self {
            workspaces: Arc::new(workspaces),
            invoker,
            interpreter: Interpreter::default(),
            cleanups: Arc::default(),
        }
    }

    /// Create an orchestrator that launches `runner` with settings from `config`
    pub fn from_config(config: &Config, runner: &RunnerProfile) -> Self {
        Self::new(
            WorkspaceManager::from_config(config),
            Arc::new(ProcessInvoker::new(runner.clone())),
        )
        .with_interpreter(Interpreter::new(config.sentinel.clone()))
    }

    pub fn with_interpreter(mut self, interpreter: Interpreter) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn workspaces(&self) -> &WorkspaceManager {
        &self.workspaces
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// Wait until every workspace removal scheduled so far has finished
    pub async fn wait_for_cleanup(&self) {
        let mut pending = std::mem::take(&mut *self.lock_cleanups());
        while let Some(joined) = pending.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "workspace cleanup task did not finish");
            }
        }
    }

    /// Remove a finished workspace without holding up the caller
    fn schedule_cleanup(&self, mut workspace: Workspace) {
        let mut cleanups = self.lock_cleanups();
        // Reap finished removals so a long-lived orchestrator does not grow
        while cleanups.try_join_next().is_some() {}
        cleanups.spawn(async move {
            if let Err(e) = workspace.cleanup().await {
                warn!(workspace = %workspace.id(), error = %e, "workspace cleanup failed");
            }
        });
    }

    fn lock_cleanups(&self) -> std::sync::MutexGuard<'_, JoinSet<()>> {
        self.cleanups.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validate raw files and run them as a submission
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError::Validation`] for an empty file list,
    /// duplicate names or names escaping the workspace, before any I/O.
    /// Otherwise behaves like [`run_submission`](Self::run_submission).
    pub async fn run_files(&self, files: Vec<SubmissionFile>) -> Result<Verdict, SubmissionError> {
        let submission = Submission::new(files).map_err(|e| {
            warn!(stage = %Stage::Validate, error = %e, "submission rejected");
            SubmissionError::from(e)
        })?;
        self.run_submission(submission).await
    }

    /// Run one submission and return its verdict
    ///
    /// The runner is invoked at most once, and only after every file has been
    /// written. The workspace is removed in the background once the run ends,
    /// whether it succeeded or not.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError::Resource`] if no workspace can be
    /// allocated, [`SubmissionError::PartialWrite`] if any file could not be
    /// written, or [`SubmissionError::Launch`] if the runner could not start.
    #[instrument(skip_all, fields(files = submission.file_count(), bytes = submission.total_bytes()))]
    pub async fn run_submission(&self, submission: Submission) -> Result<Verdict, SubmissionError> {
        let state = OrchestrationState::Created;

        let workspace = match self.workspaces.create_workspace().await {
            Ok(workspace) => workspace,
            Err(e) => return Err(fail(state, e.into())),
        };
        let state = transition(state);

        if let Err(e) = materialize(&workspace, &submission).await {
            self.schedule_cleanup(workspace);
            return Err(fail(state, e.into()));
        }
        let state = transition(state);

        let result = match self.invoker.invoke(&workspace).await {
            Ok(result) => result,
            Err(e) => {
                self.schedule_cleanup(workspace);
                return Err(fail(state, e.into()));
            }
        };
        let state = transition(state);

        let verdict = self.interpreter.interpret(&result);
        let state = transition(state);

        debug!(
            ?state,
            workspace = %workspace.id(),
            did_pass = verdict.did_pass(),
            "submission finished"
        );
        self.schedule_cleanup(workspace);

        Ok(verdict)
    }
}

fn transition(state: OrchestrationState) -> OrchestrationState {
    let next = state.clone().advance();
    debug!(from = ?state, to = ?next, "state transition");
    next
}

fn fail(state: OrchestrationState, error: SubmissionError) -> SubmissionError {
    let failed = state.fail(&error);
    warn!(state = ?failed, "submission failed");
    error
}
