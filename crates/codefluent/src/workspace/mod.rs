//! Submission workspaces
//!
//! This module creates the isolated directory each submission runs in and
//! writes the submission's files into it. File names come from untrusted
//! input, so every name is checked to resolve strictly inside the workspace
//! before anything touches the filesystem.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

pub use crate::workspace::manager::{Workspace, WorkspaceManager};
pub use crate::workspace::materialize::{Ack, MaterializeError, materialize};

mod manager;
mod materialize;

/// Errors for submissions or file names that are rejected before any I/O
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("submission contains no files")]
    EmptySubmission,

    #[error("file name is empty")]
    EmptyName,

    #[error("absolute paths are not allowed: {0}")]
    AbsolutePath(String),

    #[error("path traversal not allowed: {0}")]
    PathTraversal(String),

    #[error("file name contains invalid characters: {0:?}")]
    InvalidCharacters(String),

    #[error("duplicate file name: {0}")]
    DuplicateName(String),
}

/// Errors that occur while allocating, reading or removing a workspace
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("workspace root {path} is unavailable: {source}")]
    RootUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create workspace {path}: {source}")]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove workspace {path}: {source}")]
    CleanupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid path: {0}")]
    InvalidPath(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Check that `name` is a relative path that stays inside its workspace
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    normalize_name(name).map(|_| ())
}

/// Validate `name` and return it with redundant separators removed
///
/// Two names that normalize to the same string refer to the same file.
pub(crate) fn normalize_name(name: &str) -> Result<String, ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.contains('\0') || name.contains('\\') {
        return Err(ValidationError::InvalidCharacters(name.to_string()));
    }

    let mut parts = Vec::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy()),
            Component::RootDir | Component::Prefix(_) => {
                return Err(ValidationError::AbsolutePath(name.to_string()));
            }
            Component::ParentDir | Component::CurDir => {
                return Err(ValidationError::PathTraversal(name.to_string()));
            }
        }
    }

    if parts.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(parts.join("/"))
}
