//! Template copying.
//!
//! Hand-maintained guide documents live outside the generated tree and are
//! copied in verbatim after it is rebuilt, preserving relative paths.

use std::path::Path;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use specsync_shared::{Result, SpecSyncError};

/// Copy every file under `templates_dir` into `output_root`, preserving
/// relative paths. A missing templates directory is skipped with a warning.
/// Returns the number of files copied.
pub fn copy_templates(templates_dir: &Path, output_root: &Path) -> Result<usize> {
    if !templates_dir.is_dir() {
        warn!(path = %templates_dir.display(), "templates directory missing, skipping copy");
        return Ok(0);
    }

    let mut copied = 0usize;

    for entry in WalkDir::new(templates_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| templates_dir.to_path_buf());
            SpecSyncError::io(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(templates_dir).map_err(|e| {
            SpecSyncError::validation(format!(
                "template path {} escapes {}: {e}",
                entry.path().display(),
                templates_dir.display()
            ))
        })?;
        let target = output_root.join(relative);

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SpecSyncError::io(parent, e))?;
        }
        std::fs::copy(entry.path(), &target).map_err(|e| SpecSyncError::io(&target, e))?;

        debug!(from = %entry.path().display(), to = %target.display(), "copied template");
        copied += 1;
    }

    info!(count = copied, "templates copied");
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_tree_preserving_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let templates = tmp.path().join("templates");
        let out = tmp.path().join("out");
        std::fs::create_dir_all(templates.join("guides")).unwrap();
        std::fs::write(templates.join("guides/intro.md"), "# Intro\n").unwrap();
        std::fs::write(templates.join("top.md"), "# Top\n").unwrap();
        std::fs::create_dir_all(&out).unwrap();

        let copied = copy_templates(&templates, &out).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(
            std::fs::read_to_string(out.join("guides/intro.md")).unwrap(),
            "# Intro\n"
        );
        assert!(out.join("top.md").exists());
    }

    #[test]
    fn overwrites_existing_targets() {
        let tmp = tempfile::tempdir().unwrap();
        let templates = tmp.path().join("templates");
        let out = tmp.path().join("out");
        std::fs::create_dir_all(&templates).unwrap();
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(templates.join("page.md"), "fresh\n").unwrap();
        std::fs::write(out.join("page.md"), "stale\n").unwrap();

        copy_templates(&templates, &out).unwrap();

        assert_eq!(
            std::fs::read_to_string(out.join("page.md")).unwrap(),
            "fresh\n"
        );
    }

    #[test]
    fn missing_templates_dir_skipped() {
        let tmp = tempfile::tempdir().unwrap();

        let copied = copy_templates(&tmp.path().join("nope"), tmp.path()).unwrap();

        assert_eq!(copied, 0);
    }
}
