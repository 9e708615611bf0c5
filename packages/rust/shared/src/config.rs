//! Site configuration for specsync.
//!
//! Config lives at `specsync.toml` next to the site being built
//! (project-local, like any site generator). The `--config` flag selects an
//! alternate path.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpecSyncError};
use crate::types::SidebarNode;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "specsync.toml";

// ---------------------------------------------------------------------------
// Config structs (matching specsync.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Site paths and output layout.
    #[serde(default)]
    pub site: SiteConfig,

    /// HTTP fetch settings.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Markdown transform settings.
    #[serde(default)]
    pub transform: TransformConfig,

    /// The source registry, in fetch and processing order.
    #[serde(default)]
    pub sources: Vec<SourceEntry>,

    /// Hand-authored reference-label links.
    #[serde(default)]
    pub links: Vec<LinkEntry>,

    /// Sidebar navigation tree, serialized to the manifest as-is.
    #[serde(default)]
    pub sidebar: Vec<SidebarNode>,
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Directory the generated documents are written into. Cleared on every
    /// run except for `keep_marker`.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory of hand-maintained guide documents copied verbatim into the
    /// output tree. Optional; a missing directory is skipped with a warning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates_dir: Option<PathBuf>,

    /// Path of the sidebar manifest, relative to the working directory. Kept
    /// outside `output_dir` so the clear step never removes it.
    #[serde(default = "default_sidebar_manifest")]
    pub sidebar_manifest: PathBuf,

    /// The one filename spared when clearing `output_dir`.
    #[serde(default = "default_keep_marker")]
    pub keep_marker: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            templates_dir: None,
            sidebar_manifest: default_sidebar_manifest(),
            keep_marker: default_keep_marker(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    "content/specs".into()
}
fn default_sidebar_manifest() -> PathBuf {
    "sidebar.json".into()
}
fn default_keep_marker() -> String {
    ".gitkeep".into()
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum concurrent fetches.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_concurrency() -> usize {
    4
}

/// `[transform]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Maximum description length in characters, before the ellipsis.
    #[serde(default = "default_max_description_length")]
    pub max_description_length: usize,

    /// Remove the first heading (and a following `## Version` line) from the
    /// body, since the title already lives in frontmatter.
    #[serde(default = "default_true")]
    pub strip_title_heading: bool,

    /// Level-2 metadata sections removed wholesale from every document.
    #[serde(default = "default_remove_sections")]
    pub remove_sections: Vec<String>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            max_description_length: default_max_description_length(),
            strip_title_heading: true,
            remove_sections: default_remove_sections(),
        }
    }
}

fn default_max_description_length() -> usize {
    150
}
fn default_true() -> bool {
    true
}
fn default_remove_sections() -> Vec<String> {
    ["Editors", "Authors", "Dependencies", "Language"]
        .map(String::from)
        .to_vec()
}

/// `[[sources]]` entry — one specification document to aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEntry {
    /// Slug used as the output path segment (`<name>/index.md`). Unique
    /// across the registry.
    pub name: String,
    /// Display title, used when no title can be extracted from the document.
    pub title: String,
    /// Location of the primary markdown document.
    pub document_url: String,
    /// Optional companion schema document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_url: Option<String>,
}

/// `[[links]]` entry — a bare reference label mapped to a local path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkEntry {
    /// The label as it appears in brackets, e.g. `UCAN`.
    pub label: String,
    /// Root-relative target, e.g. `/spec/`.
    pub path: String,
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load and validate the site config from a file path.
///
/// A missing file is a config error, not a silent default: an empty registry
/// would clear the output tree and rebuild nothing.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Err(SpecSyncError::config(format!(
            "config file not found at {}; run `specsync config init` to create one",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path).map_err(|e| SpecSyncError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| SpecSyncError::config(format!("failed to parse {}: {e}", path.display())))?;

    validate(&config)?;
    Ok(config)
}

/// Write a starter config file. Refuses to overwrite an existing one.
/// Returns the path to the created file.
pub fn init_config(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Err(SpecSyncError::config(format!(
            "config file already exists at {}",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| SpecSyncError::io(parent, e))?;
        }
    }

    std::fs::write(path, STARTER_CONFIG).map_err(|e| SpecSyncError::io(path, e))?;
    tracing::info!(?path, "created starter config file");

    Ok(path.to_path_buf())
}

/// Registry-level validation: slug shape, uniqueness, URL syntax.
pub fn validate(config: &AppConfig) -> Result<()> {
    let mut seen = HashSet::new();

    for source in &config.sources {
        if source.name.is_empty()
            || source
                .name
                .chars()
                .any(|c| c == '/' || c == '\\' || c.is_whitespace())
            || source.name.contains("..")
        {
            return Err(SpecSyncError::config(format!(
                "source name {:?} is not a valid path segment",
                source.name
            )));
        }
        if !seen.insert(source.name.as_str()) {
            return Err(SpecSyncError::config(format!(
                "duplicate source name: {}",
                source.name
            )));
        }
        url::Url::parse(&source.document_url).map_err(|e| {
            SpecSyncError::config(format!(
                "source {}: invalid document_url {:?}: {e}",
                source.name, source.document_url
            ))
        })?;
        if let Some(schema_url) = &source.schema_url {
            url::Url::parse(schema_url).map_err(|e| {
                SpecSyncError::config(format!(
                    "source {}: invalid schema_url {:?}: {e}",
                    source.name, schema_url
                ))
            })?;
        }
    }

    for link in &config.links {
        if link.label.is_empty() {
            return Err(SpecSyncError::config("link entry with empty label"));
        }
    }

    Ok(())
}

/// Starter `specsync.toml` written by `config init`.
const STARTER_CONFIG: &str = r#"# specsync site configuration

[site]
output_dir = "content/specs"
# templates_dir = "templates"
sidebar_manifest = "sidebar.json"
keep_marker = ".gitkeep"

[fetch]
timeout_secs = 30
concurrency = 4

[transform]
max_description_length = 150
strip_title_heading = true
remove_sections = ["Editors", "Authors", "Dependencies", "Language"]

# One [[sources]] block per specification document, in sidebar order.
# [[sources]]
# name = "delegation"
# title = "UCAN Delegation"
# document_url = "https://raw.githubusercontent.com/ucan-wg/delegation/refs/heads/main/README.md"
# schema_url = "https://raw.githubusercontent.com/ucan-wg/delegation/refs/heads/main/delegation.ipldsch"

# Bare reference labels expanded to local links.
# [[links]]
# label = "UCAN"
# path = "/spec/"

# Sidebar navigation tree, written verbatim to the manifest.
# [[sidebar]]
# label = "Specifications"
# items = [{ label = "Delegation", slug = "delegation" }]
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("output_dir"));
        assert!(toml_str.contains("max_description_length"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.fetch.concurrency, 4);
        assert_eq!(parsed.fetch.timeout_secs, 30);
        assert_eq!(parsed.transform.max_description_length, 150);
        assert!(parsed.transform.remove_sections.contains(&"Editors".into()));
    }

    #[test]
    fn config_with_sources() {
        let toml_str = r#"
[site]
output_dir = "out/specs"

[[sources]]
name = "delegation"
title = "UCAN Delegation"
document_url = "https://raw.githubusercontent.com/ucan-wg/delegation/refs/heads/main/README.md"
schema_url = "https://raw.githubusercontent.com/ucan-wg/delegation/refs/heads/main/delegation.ipldsch"

[[sources]]
name = "invocation"
title = "UCAN Invocation"
document_url = "https://raw.githubusercontent.com/ucan-wg/invocation/refs/heads/main/README.md"

[[links]]
label = "UCAN"
path = "/spec/"

[[sidebar]]
label = "Specifications"
items = [{ label = "Delegation", slug = "delegation" }]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.sources.len(), 2);
        assert!(config.sources[0].schema_url.is_some());
        assert!(config.sources[1].schema_url.is_none());
        assert_eq!(config.links[0].label, "UCAN");
        assert_eq!(config.sidebar.len(), 1);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn duplicate_source_names_rejected() {
        let toml_str = r#"
[[sources]]
name = "delegation"
title = "A"
document_url = "https://example.com/a.md"

[[sources]]
name = "delegation"
title = "B"
document_url = "https://example.com/b.md"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate source name"));
    }

    #[test]
    fn bad_source_name_rejected() {
        let toml_str = r#"
[[sources]]
name = "../escape"
title = "A"
document_url = "https://example.com/a.md"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert!(validate(&config).is_err());
    }

    #[test]
    fn bad_document_url_rejected() {
        let toml_str = r#"
[[sources]]
name = "a"
title = "A"
document_url = "not a url"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("invalid document_url"));
    }

    #[test]
    fn starter_config_parses() {
        let config: AppConfig = toml::from_str(STARTER_CONFIG).expect("parse starter");
        assert_eq!(config.site.keep_marker, ".gitkeep");
        assert!(config.sources.is_empty());
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = load_config_from(Path::new("/nonexistent/specsync.toml")).unwrap_err();
        assert!(err.to_string().contains("config init"));
    }
}
