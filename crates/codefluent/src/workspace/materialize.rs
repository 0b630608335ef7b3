//! Writing a submission's files into its workspace

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use crate::types::Submission;
use crate::workspace::{ValidationError, Workspace};

/// Confirmation that every file of a submission is on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    /// Number of files written
    pub files: usize,

    /// Total bytes written
    pub bytes: u64,
}

#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("invalid file name: {0}")]
    Validation(#[from] ValidationError),

    /// One or more writes did not complete. Names are in submission order.
    #[error("failed to write {} file(s): {}", .failed.len(), .failed.join(", "))]
    PartialWrite { failed: Vec<String> },
}

/// Write every file of `submission` into `workspace`
///
/// All target paths are validated before the first write. Writes then run
/// concurrently, one task per file, and this function only returns once
/// every one of them has finished. A successful return means all content has
/// been flushed to disk.
///
/// # Errors
///
/// Returns [`MaterializeError::Validation`] if any name resolves outside the
/// workspace (nothing is written in that case), or
/// [`MaterializeError::PartialWrite`] naming exactly the files whose write
/// did not complete.
#[instrument(skip_all, fields(workspace = %workspace.id(), files = submission.file_count()))]
pub async fn materialize(
    workspace: &Workspace,
    submission: &Submission,
) -> Result<Ack, MaterializeError> {
    let files = submission.files();

    let targets = files
        .iter()
        .map(|file| workspace.file_path(file.name()))
        .collect::<Result<Vec<_>, _>>()?;

    let mut writes = JoinSet::new();
    for (index, (file, path)) in files.iter().zip(targets).enumerate() {
        let content = file.shared_content();
        writes.spawn(async move { (index, write_file(&path, content).await) });
    }

    // A slot stays false unless its write reported success, so a panicked or
    // cancelled task counts as not completed.
    let mut completed = vec![false; files.len()];
    while let Some(joined) = writes.join_next().await {
        match joined {
            Ok((index, Ok(()))) => completed[index] = true,
            Ok((index, Err(e))) => {
                warn!(file = files[index].name(), error = %e, "file write failed");
            }
            Err(e) => warn!(error = %e, "file write task did not finish"),
        }
    }

    let failed: Vec<String> = files
        .iter()
        .zip(&completed)
        .filter(|(_, done)| !**done)
        .map(|(file, _)| file.name().to_string())
        .collect();

    if !failed.is_empty() {
        return Err(MaterializeError::PartialWrite { failed });
    }

    let ack = Ack {
        files: files.len(),
        bytes: submission.total_bytes(),
    };
    debug!(files = ack.files, bytes = ack.bytes, "all files written");
    Ok(ack)
}

async fn write_file(path: &Path, content: Arc<[u8]>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(&content).await?;
    file.sync_all().await?;
    debug!(path = %path.display(), len = content.len(), "wrote file");
    Ok(())
}
