//! Concat manifest for the merge step.

use std::path::{Path, PathBuf};

use silencer_media::concat_list_entry;
use silencer_models::ExtractionResult;

/// One `file '<path>'` line per segment, in the given order.
pub fn manifest_contents(segments: &[ExtractionResult]) -> String {
    segments
        .iter()
        .map(|segment| concat_list_entry(&segment.path))
        .collect()
}

/// Write the manifest for `segments` to `path`, resolving relative paths.
pub async fn write_manifest(path: &Path, segments: &[ExtractionResult]) -> std::io::Result<()> {
    let mut resolved = Vec::with_capacity(segments.len());
    for segment in segments {
        let mut segment = segment.clone();
        segment.path = absolute(&segment.path).await?;
        resolved.push(segment);
    }
    tokio::fs::write(path, manifest_contents(&resolved)).await
}

async fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    match tokio::fs::canonicalize(path).await {
        Ok(p) => Ok(p),
        Err(_) if path.is_absolute() => Ok(path.to_path_buf()),
        Err(_) => Ok(std::env::current_dir()?.join(path)),
    }
}
