//! Markdown transformation for fetched specification documents.
//!
//! Turns a raw upstream markdown document into a [`ProcessedDocument`]:
//! extracts title and version, builds a sanitized description, rewrites
//! cross-references through the [`LinkMapping`], removes metadata sections,
//! and assembles frontmatter. Every pass is best-effort text transformation;
//! a non-matching step leaves the text unchanged and the whole transform
//! never fails.

pub mod links;
mod sanitize;

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};
use url::Url;

use specsync_shared::TransformConfig;

pub use links::{LinkMapping, rewrite_links};

use sanitize::{collapse_whitespace, sanitize_inline, truncate_with_ellipsis};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Frontmatter fields for one generated page. Values are plain text: no
/// markdown emphasis, links, inline code, or HTML survive sanitization.
#[derive(Debug, Clone, PartialEq)]
pub struct Frontmatter {
    pub title: String,
    pub description: String,
    pub version: Option<String>,
    pub edit_url: Option<String>,
}

/// A transformed document ready to be written to the output tree.
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub frontmatter: Frontmatter,
    pub body: String,
}

impl ProcessedDocument {
    /// Render the page: a `---`-delimited frontmatter block, a blank line,
    /// then the body.
    pub fn render(&self) -> String {
        let mut fm = String::from("---\n");
        fm.push_str(&format!(
            "title: \"{}\"\n",
            escape_yaml_string(&self.frontmatter.title)
        ));
        fm.push_str(&format!(
            "description: \"{}\"\n",
            escape_yaml_string(&self.frontmatter.description)
        ));
        if let Some(version) = &self.frontmatter.version {
            fm.push_str(&format!("version: \"{}\"\n", escape_yaml_string(version)));
        }
        if let Some(edit_url) = &self.frontmatter.edit_url {
            fm.push_str(&format!("editUrl: \"{edit_url}\"\n"));
        }
        fm.push_str("---\n");
        format!("{fm}\n{}", self.body)
    }
}

// ---------------------------------------------------------------------------
// Transformer
// ---------------------------------------------------------------------------

/// Transform a raw specification document.
///
/// Steps, in order:
/// 1. Extract the title from the first `# ` heading (else `fallback_title`)
/// 2. Extract the version (title token, `## Version` heading, `Version:`
///    line, bare token near the top — first rule to match wins)
/// 3. Clean the display title (version substring out, syntax stripped)
/// 4. Remove the title block from the body when configured
/// 5. Build the description from the `# Abstract` section, or fall back
/// 6. Rewrite cross-reference links through the mapping
/// 7. Remove configured metadata sections
/// 8. Assemble frontmatter, deriving `editUrl` from the source URL
#[instrument(skip_all, fields(title = %fallback_title))]
pub fn transform(
    raw: &str,
    fallback_title: &str,
    source_url: Option<&str>,
    mapping: &LinkMapping,
    config: &TransformConfig,
) -> ProcessedDocument {
    // Step 1: title
    let raw_title = extract_title(raw).unwrap_or_else(|| fallback_title.to_string());

    // Step 2: version, strict priority order
    let (version, display_title) = match version_from_title(&raw_title) {
        Some((version, cleaned)) => (Some(version), cleaned),
        None => {
            let version = version_from_heading(raw)
                .or_else(|| version_from_metadata_line(raw))
                .or_else(|| version_near_top(raw));
            (version, raw_title)
        }
    };

    // Step 3: title cleanup
    let mut title = collapse_whitespace(&sanitize_inline(&display_title));
    if title.is_empty() {
        title = fallback_title.to_string();
    }

    // Step 4: body title removal
    let mut body = if config.strip_title_heading {
        strip_title_block(raw)
    } else {
        raw.to_string()
    };

    // Step 5: description
    let description = match abstract_paragraph(&body) {
        Some(paragraph) => truncate_with_ellipsis(
            &collapse_whitespace(&sanitize_inline(&paragraph)),
            config.max_description_length,
        ),
        None => format!("Documentation for {title}"),
    };

    // Step 6: link rewriting
    body = rewrite_links(&body, mapping);

    // Step 7: metadata section removal
    body = remove_sections(&body, &config.remove_sections);
    body = tidy_body(&body);

    // Step 8: frontmatter
    let edit_url = source_url.and_then(edit_url_for);

    debug!(
        title = %title,
        version = ?version,
        body_len = body.len(),
        "transform complete"
    );

    ProcessedDocument {
        frontmatter: Frontmatter {
            title,
            description,
            version,
            edit_url,
        },
        body,
    }
}

/// Wrap a raw schema document in a minimal page: fixed frontmatter and the
/// schema text fenced as an `ipldsch` code block. The schema is opaque text;
/// nothing is parsed.
pub fn wrap_schema(raw_schema: &str, spec_title: &str) -> ProcessedDocument {
    ProcessedDocument {
        frontmatter: Frontmatter {
            title: format!("{spec_title} Schema"),
            description: format!("IPLD schema for {spec_title}"),
            version: None,
            edit_url: None,
        },
        body: format!("```ipldsch\n{}\n```\n", raw_schema.trim_end_matches('\n')),
    }
}

// ---------------------------------------------------------------------------
// Title and version extraction
// ---------------------------------------------------------------------------

/// A version token: `MAJOR.MINOR.PATCH` with an optional prerelease tag and
/// an optional leading `v` that is stripped from the captured value.
const VERSION_TOKEN: &str = r"v?(\d+\.\d+\.\d+(?:-[0-9A-Za-z.-]+)?)";

static VERSION_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(VERSION_TOKEN).expect("valid regex"));

/// First `# ` heading in the document.
fn extract_title(md: &str) -> Option<String> {
    static H1_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^# (.+)$").expect("valid regex"));

    H1_RE.captures(md).map(|c| c[1].trim().to_string())
}

/// Rule (a): a version token embedded in the title. Returns the version and
/// the title with the matched substring removed.
fn version_from_title(title: &str) -> Option<(String, String)> {
    let caps = VERSION_TOKEN_RE.captures(title)?;
    let full = caps.get(0).unwrap();
    let version = caps[1].to_string();
    let cleaned = format!("{}{}", &title[..full.start()], &title[full.end()..]);
    Some((version, cleaned))
}

/// Rule (b): a `## Version ...` heading carrying a version token.
fn version_from_heading(md: &str) -> Option<String> {
    static VERSION_HEADING_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^##\s+Version\b(.*)$").expect("valid regex"));

    let caps = VERSION_HEADING_RE.captures(md)?;
    VERSION_TOKEN_RE
        .captures(&caps[1])
        .map(|c| c[1].to_string())
}

/// Rule (c): a `Version: ...` metadata line.
fn version_from_metadata_line(md: &str) -> Option<String> {
    static VERSION_LINE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^\s*Version:\s*(.+)$").expect("valid regex"));

    let caps = VERSION_LINE_RE.captures(md)?;
    VERSION_TOKEN_RE
        .captures(&caps[1])
        .map(|c| c[1].to_string())
}

/// Rule (d): a bare version token on its own line near the top.
fn version_near_top(md: &str) -> Option<String> {
    static BARE_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^v?(\d+\.\d+\.\d+(?:-[0-9A-Za-z.-]+)?)$").expect("valid regex")
    });

    md.lines()
        .take(10)
        .find_map(|line| BARE_VERSION_RE.captures(line.trim()))
        .map(|c| c[1].to_string())
}

// ---------------------------------------------------------------------------
// Body passes
// ---------------------------------------------------------------------------

/// Delete the first `# ` heading line and, when one follows it (blank lines
/// tolerated), a `## Version` line. The title already lives in frontmatter.
fn strip_title_block(md: &str) -> String {
    static VERSION_HEADING_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^##\s+Version\b").expect("valid regex"));

    let lines: Vec<&str> = md.lines().collect();
    let Some(h1_idx) = lines.iter().position(|l| l.starts_with("# ")) else {
        return md.to_string();
    };

    let mut end = h1_idx + 1;
    let mut scan = h1_idx + 1;
    while scan < lines.len() && lines[scan].trim().is_empty() {
        scan += 1;
    }
    if scan < lines.len() && VERSION_HEADING_RE.is_match(lines[scan]) {
        end = scan + 1;
    }

    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    out.extend(&lines[..h1_idx]);
    out.extend(&lines[end..]);
    out.join("\n")
}

/// First paragraph of a section headed exactly `# Abstract`.
fn abstract_paragraph(md: &str) -> Option<String> {
    static ABSTRACT_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^#\s+Abstract\s*$").expect("valid regex"));

    let mut in_abstract = false;
    let mut paragraph: Vec<&str> = Vec::new();

    for line in md.lines() {
        if !in_abstract {
            if ABSTRACT_RE.is_match(line) {
                in_abstract = true;
            }
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            if paragraph.is_empty() {
                continue;
            }
            break;
        }
        if trimmed.starts_with('#') {
            break;
        }
        paragraph.push(trimmed);
    }

    if paragraph.is_empty() {
        None
    } else {
        Some(paragraph.join(" "))
    }
}

/// Remove each named `## <name>` section: the heading through to the next
/// heading of depth 1 or 2, or end of document.
fn remove_sections(md: &str, names: &[String]) -> String {
    let mut result = md.to_string();
    for name in names {
        result = remove_section(&result, name);
    }
    result
}

fn remove_section(md: &str, name: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut skipping = false;

    for line in md.lines() {
        if skipping {
            match heading_depth(line) {
                Some(depth) if depth <= 2 => skipping = false,
                _ => continue,
            }
        }
        if is_named_section(line, name) {
            skipping = true;
            continue;
        }
        out.push(line);
    }

    out.join("\n")
}

fn heading_depth(line: &str) -> Option<usize> {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    match line[hashes..].chars().next() {
        Some(' ') | Some('\t') | None => Some(hashes),
        _ => None,
    }
}

fn is_named_section(line: &str, name: &str) -> bool {
    heading_depth(line) == Some(2) && line.trim_start_matches('#').trim() == name
}

/// Collapse excess blank lines and normalize the document edges: no leading
/// blank lines, exactly one trailing newline.
fn tidy_body(md: &str) -> String {
    static MULTI_BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{4,}").expect("valid regex"));

    let collapsed = MULTI_BLANK_RE.replace_all(md, "\n\n\n");
    let trimmed = collapsed.trim_start_matches('\n').trim_end_matches('\n');
    format!("{trimmed}\n")
}

// ---------------------------------------------------------------------------
// Edit URL derivation
// ---------------------------------------------------------------------------

/// Derive a browsable edit URL from a raw-content source URL.
///
/// `raw.githubusercontent.com/{owner}/{repo}/[refs/heads/]{branch}/{path}`
/// becomes `github.com/{owner}/{repo}/edit/{branch}/{path}`. Anything else
/// yields no edit URL.
fn edit_url_for(source_url: &str) -> Option<String> {
    let url = Url::parse(source_url).ok()?;
    if url.host_str() != Some(links::RAW_CONTENT_HOST) {
        return None;
    }

    let segments: Vec<&str> = url.path_segments()?.collect();
    if segments.len() < 4 {
        return None;
    }

    let owner = segments[0];
    let repo = segments[1];
    let (branch, path_start) = if segments[2] == "refs" && segments[3] == "heads" {
        if segments.len() < 6 {
            return None;
        }
        (segments[4], 5)
    } else {
        (segments[2], 3)
    };

    let path = &segments[path_start..];
    if path.is_empty() {
        return None;
    }

    Some(format!(
        "https://github.com/{owner}/{repo}/edit/{branch}/{}",
        path.join("/")
    ))
}

/// Escape special characters in a YAML string value.
fn escape_yaml_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
