use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::config::RUNNER_FILE;
use crate::workspace::{ValidationError, normalize_name};

/// A single named file in a submission
///
/// The content is shared, so cloning a file (or handing it to a write task)
/// does not copy the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionFile {
    name: String,
    content: Arc<[u8]>,
}

impl SubmissionFile {
    /// Create a new file. The name is validated when the file joins a [`Submission`].
    pub fn new(name: impl Into<String>, content: impl AsRef<[u8]>) -> Self {
        Self {
            name: name.into(),
            content: Arc::from(content.as_ref()),
        }
    }

    /// Relative path of the file inside the workspace
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub(crate) fn shared_content(&self) -> Arc<[u8]> {
        Arc::clone(&self.content)
    }
}

/// An ordered, validated set of files to run
///
/// A `Submission` always holds at least one file, every name resolves inside
/// a workspace, and no two names refer to the same path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    files: Vec<SubmissionFile>,
}

impl Submission {
    /// Validate and accept a set of files
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptySubmission`] for an empty list,
    /// [`ValidationError::DuplicateName`] when two names resolve to the same
    /// path, or the name error for the first file with an unusable name.
    pub fn new(files: Vec<SubmissionFile>) -> Result<Self, ValidationError> {
        if files.is_empty() {
            return Err(ValidationError::EmptySubmission);
        }

        let mut seen = HashSet::with_capacity(files.len());
        for file in &files {
            let normalized = normalize_name(file.name())?;
            if !seen.insert(normalized) {
                return Err(ValidationError::DuplicateName(file.name().to_string()));
            }
        }

        Ok(Self { files })
    }

    /// Files in the order they were submitted
    pub fn files(&self) -> &[SubmissionFile] {
        &self.files
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Names in submission order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(SubmissionFile::name)
    }

    pub fn get(&self, name: &str) -> Option<&SubmissionFile> {
        self.files.iter().find(|f| f.name() == name)
    }

    /// Total size of all file contents in bytes
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.content().len() as u64).sum()
    }

    /// Runner profile requested by the submission's `Runner` file, if any
    pub fn runner_name(&self) -> Option<String> {
        let file = self.get(RUNNER_FILE)?;
        let name = String::from_utf8_lossy(file.content()).trim().to_string();
        (!name.is_empty()).then_some(name)
    }
}

/// How the runner process terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ExitStatus {
    /// Exit code if the process exited normally
    pub code: Option<i32>,

    /// Signal number if the process was killed by a signal
    pub signal: Option<i32>,
}

impl ExitStatus {
    /// Status of a process that exited with `code`
    pub fn exited(code: i32) -> Self {
        Self {
            code: Some(code),
            signal: None,
        }
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code(),
            signal,
        }
    }
}

/// Raw output of one runner invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_status: ExitStatus,

    /// Captured standard output
    pub stdout: Vec<u8>,

    /// Captured standard error
    pub stderr: Vec<u8>,
}

impl ExecutionResult {
    /// Check if the runner exited with code 0
    ///
    /// This says nothing about whether the tests passed; see [`Verdict`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.exit_status.success()
    }
}

/// Caller-facing result of a submission run
///
/// Only the [`Interpreter`](crate::Interpreter) builds verdicts, so
/// `did_pass` always reflects the runner's stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    did_pass: bool,
    stdout: String,
    stderr: String,
}

impl Verdict {
    pub(crate) fn new(did_pass: bool, stdout: String, stderr: String) -> Self {
        Self {
            did_pass,
            stdout,
            stderr,
        }
    }

    #[must_use]
    pub fn did_pass(&self) -> bool {
        self.did_pass
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }
}
