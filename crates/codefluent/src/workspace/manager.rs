//! Workspace lifecycle management
//!
//! Allocates one uniquely named directory per submission and removes it again
//! once the submission has been interpreted.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::workspace::{ValidationError, WorkspaceError, normalize_name};

/// An isolated directory holding one submission's files
///
/// A workspace is exclusively owned by the orchestration call that created
/// it. It is never handed to a second submission.
///
/// # Cleanup
///
/// Call [`cleanup()`](Self::cleanup) once the run is finished. Dropping a
/// workspace that was not cleaned up (e.g. a run abandoned on timeout) logs a
/// warning and removes the directory synchronously before the drop returns.
#[derive(Debug)]
pub struct Workspace {
    /// Directory name, unique under the workspace root
    id: String,

    /// Absolute path to the workspace directory
    path: PathBuf,

    /// Leave the directory in place on cleanup
    keep: bool,

    /// Whether the directory still needs to be removed
    active: bool,
}

impl Workspace {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the path to the workspace directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the host path to a file inside the workspace
    ///
    /// Returns an error if the name would resolve outside the workspace.
    pub fn file_path(&self, name: &str) -> Result<PathBuf, ValidationError> {
        let normalized = normalize_name(name)?;
        Ok(self.path.join(normalized))
    }

    /// Read a file from the workspace
    #[instrument(skip(self), fields(workspace = %self.id))]
    pub async fn read_file(&self, name: &str) -> Result<Vec<u8>, WorkspaceError> {
        let path = self.file_path(name)?;
        let content = tokio::fs::read(&path).await?;
        debug!(?path, len = content.len(), "read file from workspace");
        Ok(content)
    }

    /// Check if a file exists in the workspace
    pub async fn file_exists(&self, name: &str) -> Result<bool, WorkspaceError> {
        let path = self.file_path(name)?;
        Ok(tokio::fs::metadata(&path).await.is_ok())
    }

    /// Check if the directory has not been removed yet
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Remove the workspace directory
    ///
    /// Calling this more than once is a no-op. A workspace configured to be
    /// kept is left on disk and marked inactive.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::CleanupFailed`] if the directory could not be removed.
    #[must_use = "cleanup errors should be handled"]
    #[instrument(skip(self), fields(workspace = %self.id))]
    pub async fn cleanup(&mut self) -> Result<(), WorkspaceError> {
        if !self.active {
            return Ok(());
        }

        if self.keep {
            debug!(path = %self.path.display(), "keeping workspace");
            self.active = false;
            return Ok(());
        }

        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                warn!(path = %self.path.display(), error = %source, "cleanup failed");
                return Err(WorkspaceError::CleanupFailed {
                    path: self.path.clone(),
                    source,
                });
            }
        }

        self.active = false;
        debug!("workspace removed");
        Ok(())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if !self.active || self.keep {
            return;
        }

        warn!(
            workspace = %self.id,
            path = %self.path.display(),
            "Workspace dropped without explicit cleanup, removing it now"
        );

        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "best-effort cleanup succeeded"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "best-effort cleanup failed"),
        }
        self.active = false;
    }
}

/// Allocates workspaces under a common root directory
///
/// Names combine the process id, a per-manager sequence number and a random
/// UUID, and the leaf directory is created exclusively. Two live workspaces
/// can therefore never share a path, even across processes using the same
/// root.
#[derive(Debug)]
pub struct WorkspaceManager {
    /// Directory that holds all workspaces
    root: PathBuf,

    /// Leave workspaces on disk after cleanup (for debugging runners)
    keep: bool,

    /// Next sequence number
    next_seq: AtomicU64,
}

impl WorkspaceManager {
    /// Create a manager that allocates workspaces under `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            keep: false,
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.workspace_root).keep_workspaces(config.keep_workspaces)
    }

    /// Keep workspace directories after cleanup
    pub fn keep_workspaces(mut self, keep: bool) -> Self {
        self.keep = keep;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Allocate a fresh, empty workspace
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::RootUnavailable`] if the root cannot be
    /// created, or [`WorkspaceError::CreateFailed`] if the workspace
    /// directory itself cannot be allocated.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn create_workspace(&self) -> Result<Workspace, WorkspaceError> {
        let root_unavailable = |source| WorkspaceError::RootUnavailable {
            path: self.root.clone(),
            source,
        };

        let root = std::path::absolute(&self.root).map_err(root_unavailable)?;
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(root_unavailable)?;

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let id = format!(
            "ws-{}-{seq}-{}",
            std::process::id(),
            Uuid::new_v4().simple()
        );
        let path = root.join(&id);

        // create_dir (not create_dir_all) so an existing entry is an error
        tokio::fs::create_dir(&path)
            .await
            .map_err(|source| WorkspaceError::CreateFailed {
                path: path.clone(),
                source,
            })?;

        debug!(?path, "workspace created");

        Ok(Workspace {
            id,
            path,
            keep: self.keep,
            active: true,
        })
    }
}
