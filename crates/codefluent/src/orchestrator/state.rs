//! Orchestration state machine

use std::fmt;

/// A step of a submission run that can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Checking the submitted files before any I/O
    Validate,
    /// Allocating the workspace directory
    CreateWorkspace,
    /// Writing the files into the workspace
    WriteFiles,
    /// Running the external runner
    Execute,
    /// Turning runner output into a verdict
    Interpret,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validate => "validate",
            Stage::CreateWorkspace => "create_workspace",
            Stage::WriteFiles => "write_files",
            Stage::Execute => "execute",
            Stage::Interpret => "interpret",
        };
        f.write_str(name)
    }
}

/// Where a single submission run currently is
///
/// Runs move strictly forward through
/// `Created → WorkspaceReady → FilesWritten → Executed → Interpreted`.
/// Any non-terminal state can instead move to `Failed`, recording the stage
/// that was in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestrationState {
    Created,
    WorkspaceReady,
    FilesWritten,
    Executed,
    Interpreted,
    Failed { stage: Stage, cause: String },
}

impl OrchestrationState {
    /// The stage that runs next from this state, `None` once terminal
    pub fn pending_stage(&self) -> Option<Stage> {
        match self {
            OrchestrationState::Created => Some(Stage::CreateWorkspace),
            OrchestrationState::WorkspaceReady => Some(Stage::WriteFiles),
            OrchestrationState::FilesWritten => Some(Stage::Execute),
            OrchestrationState::Executed => Some(Stage::Interpret),
            OrchestrationState::Interpreted | OrchestrationState::Failed { .. } => None,
        }
    }

    /// Move to the next state after the pending stage succeeded
    ///
    /// Terminal states are returned unchanged.
    #[must_use]
    pub fn advance(self) -> Self {
        match self {
            OrchestrationState::Created => OrchestrationState::WorkspaceReady,
            OrchestrationState::WorkspaceReady => OrchestrationState::FilesWritten,
            OrchestrationState::FilesWritten => OrchestrationState::Executed,
            OrchestrationState::Executed => OrchestrationState::Interpreted,
            terminal => terminal,
        }
    }

    /// Record that the pending stage failed
    ///
    /// Terminal states are returned unchanged.
    #[must_use]
    pub fn fail(self, cause: impl fmt::Display) -> Self {
        match self.pending_stage() {
            Some(stage) => OrchestrationState::Failed {
                stage,
                cause: cause.to_string(),
            },
            None => self,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrchestrationState::Interpreted | OrchestrationState::Failed { .. }
        )
    }
}
