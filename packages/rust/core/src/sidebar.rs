//! Sidebar manifest generation.
//!
//! The manifest is the configured navigation tree serialized verbatim.
//! Generation is a pure function of configuration and runs even when fetches
//! failed, so the site navigation never silently loses entries.

use std::path::Path;

use tracing::{debug, warn};

use specsync_shared::{Result, SidebarNode, SpecSyncError};

/// Write the sidebar manifest as pretty-printed JSON.
pub fn write_manifest(path: &Path, sidebar: &[SidebarNode]) -> Result<()> {
    let json = serde_json::to_string_pretty(sidebar)
        .map_err(|e| SpecSyncError::validation(format!("sidebar serialization failed: {e}")))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| SpecSyncError::io(parent, e))?;
        }
    }

    std::fs::write(path, json).map_err(|e| SpecSyncError::io(path, e))?;

    debug!(path = %path.display(), nodes = sidebar.len(), "wrote sidebar manifest");
    Ok(())
}

/// Warn about leaf slugs with no corresponding document in the output tree.
/// Non-fatal: a broken nav link is better than a missing one. Returns the
/// dangling slugs.
pub fn report_dangling_slugs(sidebar: &[SidebarNode], output_dir: &Path) -> Vec<String> {
    let mut slugs = Vec::new();
    for node in sidebar {
        node.collect_slugs(&mut slugs);
    }

    let dangling: Vec<String> = slugs
        .into_iter()
        .filter(|slug| !slug_exists(output_dir, slug))
        .map(String::from)
        .collect();

    for slug in &dangling {
        warn!(%slug, "sidebar references a slug with no written document");
    }

    dangling
}

/// A slug resolves to either `<slug>/index.md` or `<slug>.md` under the
/// output root.
fn slug_exists(output_dir: &Path, slug: &str) -> bool {
    let slug = slug.trim_matches('/');
    if slug.is_empty() {
        return false;
    }
    output_dir.join(slug).join("index.md").is_file()
        || output_dir.join(format!("{slug}.md")).is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use specsync_shared::AutogenerateDir;

    fn sample_sidebar() -> Vec<SidebarNode> {
        vec![
            SidebarNode::Link {
                label: "Introduction".into(),
                slug: "intro".into(),
            },
            SidebarNode::Group {
                label: "Specifications".into(),
                items: vec![SidebarNode::Link {
                    label: "Delegation".into(),
                    slug: "delegation".into(),
                }],
            },
            SidebarNode::Autogenerate {
                label: "Guides".into(),
                autogenerate: AutogenerateDir {
                    directory: "guides".into(),
                },
            },
        ]
    }

    #[test]
    fn manifest_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sidebar.json");

        write_manifest(&path, &sample_sidebar()).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<SidebarNode> = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, sample_sidebar());
    }

    #[test]
    fn manifest_is_pretty_printed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sidebar.json");

        write_manifest(&path, &sample_sidebar()).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\n  "));
    }

    #[test]
    fn manifest_creates_parent_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("site/meta/sidebar.json");

        write_manifest(&path, &sample_sidebar()).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn dangling_slugs_reported() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("intro")).unwrap();
        std::fs::write(tmp.path().join("intro/index.md"), "x").unwrap();

        let dangling = report_dangling_slugs(&sample_sidebar(), tmp.path());

        assert_eq!(dangling, vec!["delegation".to_string()]);
    }

    #[test]
    fn flat_md_files_count_as_written() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("intro.md"), "x").unwrap();

        let dangling = report_dangling_slugs(
            &[SidebarNode::Link {
                label: "Introduction".into(),
                slug: "/intro/".into(),
            }],
            tmp.path(),
        );

        assert!(dangling.is_empty());
    }

    #[test]
    fn autogenerate_nodes_have_no_slugs() {
        let tmp = tempfile::tempdir().unwrap();

        let dangling = report_dangling_slugs(
            &[SidebarNode::Autogenerate {
                label: "Guides".into(),
                autogenerate: AutogenerateDir {
                    directory: "guides".into(),
                },
            }],
            tmp.path(),
        );

        assert!(dangling.is_empty());
    }
}
