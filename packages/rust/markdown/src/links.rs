//! Cross-reference link mapping and rewriting.
//!
//! One [`LinkMapping`] is built per run from the source registry plus the
//! hand-authored `[[links]]` entries, and is the single authority for
//! rewriting: the transformer and the link auditor both go through
//! [`rewrite_links`].

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use url::Url;

use specsync_shared::{LinkEntry, Result, SourceEntry, SpecSyncError};

/// Host serving raw file contents for GitHub repositories.
pub(crate) const RAW_CONTENT_HOST: &str = "raw.githubusercontent.com";

// ---------------------------------------------------------------------------
// LinkMapping
// ---------------------------------------------------------------------------

/// Maps external URLs and bare reference labels to local site paths.
///
/// URL keys are stored without a trailing slash; [`LinkMapping::lookup`]
/// normalizes candidates the same way and preserves any `#fragment`.
#[derive(Debug, Clone, Default)]
pub struct LinkMapping {
    /// Canonical external URL (no trailing slash) to local path.
    urls: Vec<(String, String)>,
    /// Bare reference label to local path.
    labels: Vec<(String, String)>,
}

impl LinkMapping {
    /// Build the mapping from configuration.
    ///
    /// Each source whose document URL lives on the raw-content host
    /// contributes `github.com/{owner}/{repo}` mapped to `/{name}/`. Label
    /// entries are taken as configured. Malformed targets are rejected here,
    /// before any fetch happens.
    pub fn build(sources: &[SourceEntry], links: &[LinkEntry]) -> Result<Self> {
        let mut urls = Vec::new();

        for source in sources {
            match canonical_repo_url(&source.document_url) {
                Some(repo_url) => {
                    urls.push((repo_url, format!("/{}/", source.name)));
                }
                None => {
                    debug!(
                        name = %source.name,
                        url = %source.document_url,
                        "document URL is not raw-content hosted; no derived link mapping"
                    );
                }
            }
        }

        let mut labels = Vec::new();
        for link in links {
            validate_target(&link.label, &link.path)?;
            labels.push((link.label.clone(), link.path.clone()));
        }

        Ok(Self { urls, labels })
    }

    /// Resolve an external URL to its local path, tolerating a trailing
    /// slash and carrying the source fragment over.
    pub fn lookup(&self, url: &str) -> Option<String> {
        let (base, fragment) = match url.split_once('#') {
            Some((base, fragment)) => (base, Some(fragment)),
            None => (url, None),
        };
        let base = base.strip_suffix('/').unwrap_or(base);

        let target = self
            .urls
            .iter()
            .find(|(key, _)| key == base)
            .map(|(_, path)| path.as_str())?;

        Some(match fragment {
            // The source fragment wins over any fragment baked into the target.
            Some(fragment) => {
                let path = target.split_once('#').map_or(target, |(path, _)| path);
                format!("{path}#{fragment}")
            }
            None => target.to_string(),
        })
    }

    /// Bare labels with their targets, in configuration order.
    pub fn labels(&self) -> &[(String, String)] {
        &self.labels
    }

    /// Mapped external URLs with their targets, in registry order.
    pub fn urls(&self) -> &[(String, String)] {
        &self.urls
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty() && self.labels.is_empty()
    }
}

/// Convert a raw-content URL to the canonical repository URL.
fn canonical_repo_url(document_url: &str) -> Option<String> {
    let url = Url::parse(document_url).ok()?;
    if url.host_str() != Some(RAW_CONTENT_HOST) {
        return None;
    }

    let mut segments = url.path_segments()?;
    let owner = segments.next()?;
    let repo = segments.next()?;
    if owner.is_empty() || repo.is_empty() {
        return None;
    }

    Some(format!("https://github.com/{owner}/{repo}"))
}

/// Mapping targets are root-relative paths: they begin and end with `/`,
/// optionally suffixed with `#fragment`.
fn validate_target(label: &str, path: &str) -> Result<()> {
    let path_part = path.split_once('#').map_or(path, |(p, _)| p);
    if !path_part.starts_with('/') || !path_part.ends_with('/') {
        return Err(SpecSyncError::validation(format!(
            "link target for {label:?} must begin and end with '/': got {path:?}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Rewriting
// ---------------------------------------------------------------------------

/// Rewrite every cross-reference the mapping knows about.
///
/// Three forms are handled: inline links `[text](url)`, reference
/// definitions `[label]: url`, and bare labels `[label]` that are not
/// already part of a link construct.
pub fn rewrite_links(md: &str, mapping: &LinkMapping) -> String {
    if mapping.is_empty() {
        return md.to_string();
    }

    let mut result = rewrite_inline_links(md, mapping);
    result = rewrite_reference_definitions(&result, mapping);
    result = expand_bare_labels(&result, mapping);
    result
}

/// Rewrite `[text](url)` targets that match a mapped URL.
///
/// The `[alt](src)` half of an image also matches the pattern; image sources
/// are left untouched.
fn rewrite_inline_links(md: &str, mapping: &LinkMapping) -> String {
    static INLINE_LINK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid regex"));

    let bytes = md.as_bytes();
    INLINE_LINK_RE
        .replace_all(md, |caps: &regex::Captures| {
            let full_match = caps.get(0).unwrap();
            let preceding = full_match.start().checked_sub(1).map(|i| bytes[i]);
            if preceding == Some(b'!') {
                return caps[0].to_string();
            }

            let text = &caps[1];
            let href = &caps[2];
            match mapping.lookup(href) {
                Some(local) => format!("[{text}]({local})"),
                None => caps[0].to_string(),
            }
        })
        .to_string()
}

/// Rewrite `[label]: url` definition targets that match a mapped URL.
fn rewrite_reference_definitions(md: &str, mapping: &LinkMapping) -> String {
    static REF_DEF_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^\[([^\]]+)\]:\s*(\S+)\s*$").expect("valid regex"));

    REF_DEF_RE
        .replace_all(md, |caps: &regex::Captures| {
            let label = &caps[1];
            let href = &caps[2];
            match mapping.lookup(href) {
                Some(local) => format!("[{label}]: {local}"),
                None => caps[0].to_string(),
            }
        })
        .to_string()
}

/// Expand bare `[label]` occurrences into inline links.
///
/// A bracket run is left alone when it is already link syntax: followed by
/// `(`, `[`, or `:`, preceded by `]` (the reference half of `[text][label]`),
/// or preceded by `!` (an image).
fn expand_bare_labels(md: &str, mapping: &LinkMapping) -> String {
    let mut result = md.to_string();

    for (label, path) in mapping.labels() {
        let Ok(re) = Regex::new(&format!(r"\[{}\]", regex::escape(label))) else {
            continue;
        };

        let input = result.clone();
        result = re
            .replace_all(&input, |caps: &regex::Captures| {
                let full_match = caps.get(0).unwrap();
                let bytes = input.as_bytes();

                let preceding = full_match.start().checked_sub(1).map(|i| bytes[i]);
                if preceding == Some(b']') || preceding == Some(b'!') {
                    return caps[0].to_string();
                }
                if let Some(&following) = bytes.get(full_match.end()) {
                    if matches!(following, b'(' | b'[' | b':') {
                        return caps[0].to_string();
                    }
                }

                format!("[{label}]({path})")
            })
            .to_string();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(name: &str, url: &str) -> SourceEntry {
        SourceEntry {
            name: name.into(),
            title: name.into(),
            document_url: url.into(),
            schema_url: None,
        }
    }

    fn link(label: &str, path: &str) -> LinkEntry {
        LinkEntry {
            label: label.into(),
            path: path.into(),
        }
    }

    fn ucan_mapping() -> LinkMapping {
        LinkMapping::build(
            &[
                source(
                    "delegation",
                    "https://raw.githubusercontent.com/ucan-wg/delegation/refs/heads/main/README.md",
                ),
                source(
                    "invocation",
                    "https://raw.githubusercontent.com/ucan-wg/invocation/refs/heads/main/README.md",
                ),
            ],
            &[link("UCAN", "/spec/")],
        )
        .expect("build mapping")
    }

    #[test]
    fn build_derives_repo_urls() {
        let mapping = ucan_mapping();
        assert_eq!(
            mapping.lookup("https://github.com/ucan-wg/delegation"),
            Some("/delegation/".into())
        );
        assert_eq!(
            mapping.lookup("https://github.com/ucan-wg/invocation"),
            Some("/invocation/".into())
        );
    }

    #[test]
    fn non_raw_urls_derive_nothing() {
        let mapping = LinkMapping::build(
            &[source("other", "https://example.com/docs/spec.md")],
            &[],
        )
        .expect("build mapping");
        assert!(mapping.urls().is_empty());
    }

    #[test]
    fn lookup_tolerates_trailing_slash() {
        let mapping = ucan_mapping();
        assert_eq!(
            mapping.lookup("https://github.com/ucan-wg/delegation/"),
            Some("/delegation/".into())
        );
    }

    #[test]
    fn lookup_preserves_fragment() {
        let mapping = ucan_mapping();
        assert_eq!(
            mapping.lookup("https://github.com/ucan-wg/delegation#capabilities"),
            Some("/delegation/#capabilities".into())
        );
        assert_eq!(
            mapping.lookup("https://github.com/ucan-wg/delegation/#capabilities"),
            Some("/delegation/#capabilities".into())
        );
    }

    #[test]
    fn lookup_misses_unknown_urls() {
        let mapping = ucan_mapping();
        assert_eq!(mapping.lookup("https://github.com/ucan-wg/other"), None);
        assert_eq!(mapping.lookup("https://example.com/"), None);
    }

    #[test]
    fn malformed_label_target_rejected() {
        let err = LinkMapping::build(&[], &[link("UCAN", "spec")]).unwrap_err();
        assert!(err.to_string().contains("begin and end with '/'"));

        let err = LinkMapping::build(&[], &[link("UCAN", "/spec")]).unwrap_err();
        assert!(err.to_string().contains("begin and end with '/'"));
    }

    #[test]
    fn label_target_with_fragment_accepted() {
        let mapping =
            LinkMapping::build(&[], &[link("Attenuation", "/spec/#attenuation")]).expect("build");
        assert_eq!(mapping.labels()[0].1, "/spec/#attenuation");
    }

    #[test]
    fn rewrites_inline_links() {
        let mapping = ucan_mapping();
        let input = "See [UCAN Delegation](https://github.com/ucan-wg/delegation) for details.";
        assert_eq!(
            rewrite_links(input, &mapping),
            "See [UCAN Delegation](/delegation/) for details."
        );
    }

    #[test]
    fn rewrites_inline_links_with_fragment() {
        let mapping = ucan_mapping();
        let input = "[the task](https://github.com/ucan-wg/invocation#task)";
        assert_eq!(rewrite_links(input, &mapping), "[the task](/invocation/#task)");
    }

    #[test]
    fn unknown_inline_links_untouched() {
        let mapping = ucan_mapping();
        let input = "[elsewhere](https://example.com/page)";
        assert_eq!(rewrite_links(input, &mapping), input);
    }

    #[test]
    fn image_sources_not_rewritten() {
        let mapping = ucan_mapping();
        let input = "![flow](https://github.com/ucan-wg/delegation) vs \
                     [docs](https://github.com/ucan-wg/delegation)";
        assert_eq!(
            rewrite_links(input, &mapping),
            "![flow](https://github.com/ucan-wg/delegation) vs [docs](/delegation/)"
        );
    }

    #[test]
    fn rewrites_reference_definitions() {
        let mapping = ucan_mapping();
        let input = "[UCAN Invocation]: https://github.com/ucan-wg/invocation\n";
        assert_eq!(
            rewrite_links(input, &mapping),
            "[UCAN Invocation]: /invocation/\n"
        );
    }

    #[test]
    fn expands_bare_labels() {
        let mapping = ucan_mapping();
        let input = "Defined by [UCAN] and refined here.";
        assert_eq!(
            rewrite_links(input, &mapping),
            "Defined by [UCAN](/spec/) and refined here."
        );
    }

    #[test]
    fn bare_label_guards_hold() {
        let mapping = ucan_mapping();

        // Already an inline link.
        let input = "[UCAN](https://example.com)";
        assert_eq!(rewrite_links(input, &mapping), input);

        // Reference usage and reference-style link.
        let input = "[the spec][UCAN] and [UCAN][]";
        assert_eq!(rewrite_links(input, &mapping), input);

        // Reference definition keeps its label.
        let input = "[UCAN]: https://example.com/unrelated\n";
        assert_eq!(rewrite_links(input, &mapping), input);

        // Image alt text.
        let input = "![UCAN] logo";
        assert_eq!(rewrite_links(input, &mapping), input);
    }

    #[test]
    fn empty_mapping_is_identity() {
        let mapping = LinkMapping::default();
        let input = "See [UCAN](https://github.com/ucan-wg/spec).";
        assert_eq!(rewrite_links(input, &mapping), input);
    }
}
