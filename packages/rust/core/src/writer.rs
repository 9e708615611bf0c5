//! Output tree writer.
//!
//! The output directory is rebuilt from scratch on every run: `clear_output`
//! removes everything except the keep marker, then documents are written
//! fresh. There is no incremental diffing; the upstream fetch is the source
//! of truth.

use std::path::Path;

use tracing::{debug, info};

use specsync_shared::{Result, SpecSyncError};

/// Remove every child of `root` except the keep-marker file. Creates `root`
/// when it does not exist yet. Must complete before any write.
pub fn clear_output(root: &Path, keep_marker: &str) -> Result<()> {
    if !root.exists() {
        std::fs::create_dir_all(root).map_err(|e| SpecSyncError::io(root, e))?;
        debug!(path = %root.display(), "created output directory");
        return Ok(());
    }

    let entries = std::fs::read_dir(root).map_err(|e| SpecSyncError::io(root, e))?;
    let mut removed = 0usize;

    for entry in entries {
        let entry = entry.map_err(|e| SpecSyncError::io(root, e))?;
        if entry.file_name() == keep_marker {
            continue;
        }

        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| SpecSyncError::io(&path, e))?;
        if file_type.is_dir() {
            std::fs::remove_dir_all(&path).map_err(|e| SpecSyncError::io(&path, e))?;
        } else {
            std::fs::remove_file(&path).map_err(|e| SpecSyncError::io(&path, e))?;
        }
        removed += 1;
    }

    info!(path = %root.display(), removed, "cleared output directory");
    Ok(())
}

/// Write one document under `root`, creating parent directories as needed.
/// Overwrites silently; the clear step already ran.
pub fn write_doc(root: &Path, relative_path: &str, content: &str) -> Result<()> {
    let file_path = root.join(relative_path);

    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SpecSyncError::io(parent, e))?;
    }

    std::fs::write(&file_path, content).map_err(|e| SpecSyncError::io(&file_path, e))?;

    debug!(path = %file_path.display(), bytes = content.len(), "wrote document");
    Ok(())
}
