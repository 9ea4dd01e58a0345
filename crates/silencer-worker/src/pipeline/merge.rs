//! Merge step and working-directory cleanup.

use std::path::Path;

use tracing::{info, warn};

use silencer_media::MediaEngine;
use silencer_models::ExtractionResult;

use super::layout::WorkLayout;
use super::manifest::write_manifest;
use crate::error::{WorkerError, WorkerResult};

/// Result of running the concat step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeStatus {
    /// Merge succeeded and the working directory was removed
    Merged,
    /// Merge exited non-zero (or was killed); intermediates are kept
    Failed { exit_code: Option<i32> },
}

/// Write the manifest, concatenate, and clean up on success.
pub async fn merge_segments<E: MediaEngine + ?Sized>(
    engine: &E,
    layout: &WorkLayout,
    segments: &[ExtractionResult],
) -> WorkerResult<MergeStatus> {
    let output = layout
        .merged_output
        .as_deref()
        .ok_or_else(|| WorkerError::precondition("merge requested without an output file"))?;

    let manifest = layout.manifest_path();
    write_manifest(&manifest, segments).await?;

    let exit_code = match engine.concat(&manifest, output).await {
        Ok(code) => code,
        Err(e) if e.is_launch_failure() => return Err(e.into()),
        Err(e) => {
            warn!(error = %e, "Merge did not complete");
            None
        }
    };

    if exit_code != Some(0) {
        return Ok(MergeStatus::Failed { exit_code });
    }

    info!(output = %output.display(), "Merged segments");
    if let Err(e) = remove_work_dir(&layout.dir).await {
        warn!(dir = %layout.dir.display(), error = %e, "Failed to clean up working directory");
    }
    Ok(MergeStatus::Merged)
}

/// Delete every file in `dir`, then `dir` itself.
pub async fn remove_work_dir(dir: &Path) -> std::io::Result<()> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            tokio::fs::remove_file(entry.path()).await?;
        }
    }
    tokio::fs::remove_dir(dir).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_remove_work_dir() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join(".silenced_parts");
        tokio::fs::create_dir(&dir).await.unwrap();
        tokio::fs::write(dir.join(".a_0.aac"), b"a").await.unwrap();
        tokio::fs::write(dir.join(".filelist"), b"file 'a'\n").await.unwrap();

        remove_work_dir(&dir).await.unwrap();
        assert!(!dir.exists());
    }
}
