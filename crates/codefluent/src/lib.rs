//! A library for staging and running code submissions.
//!
//! Codefluent takes a set of named source files (a program plus its unit
//! tests), materializes them into an isolated workspace, hands the workspace
//! to an external sandboxed runner, and reports whether the tests passed.
//!
//! # Features
//!
//! - **Isolated workspaces** - One uniquely named directory per submission, removed after the run.
//! - **Concurrent staging** - Files are written concurrently behind an all-or-nothing barrier.
//! - **Pluggable runners** - The runner is an [`Invoker`] capability; [`ProcessInvoker`] launches an external process.
//! - **Sentinel verdicts** - A run passes when the runner prints `CF_OK` anywhere on stdout.
//! - **TOML configuration** - Runner profiles, workspace root and sentinel are configurable.

pub use config::{Config, ConfigError, EXAMPLE_CONFIG, RUNNER_FILE, RunnerProfile};
pub use interpret::{Interpreter, SUCCESS_SENTINEL, interpret};
pub use invoker::{Invoker, LaunchError, ProcessInvoker};
pub use orchestrator::{ErrorReport, OrchestrationState, Orchestrator, Stage, SubmissionError};
pub use types::{ExecutionResult, ExitStatus, Submission, SubmissionFile, Verdict};
pub use workspace::{
    Ack, MaterializeError, ValidationError, Workspace, WorkspaceError, WorkspaceManager,
    materialize,
};

pub mod config;
pub mod interpret;
pub mod invoker;
pub mod orchestrator;
pub mod types;
pub mod workspace;
