//! Link auditor for the written output tree.
//!
//! `audit_tree` scans without touching anything; `fix_tree` applies the same
//! fixes in place. Both walk every `.md` file under the root and run the same
//! pass sequence, so a fixed tree always audits clean. Fixing is idempotent:
//! the passes converge after one application.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

use specsync_markdown::{LinkMapping, rewrite_links};
use specsync_shared::{Result, SpecSyncError};

// ---------------------------------------------------------------------------
// Findings
// ---------------------------------------------------------------------------

/// One problem found in one file.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub file: PathBuf,
    /// 1-based line number the finding applies to.
    pub line: usize,
    pub kind: FindingKind,
    pub detail: String,
}

/// The kinds of problems the auditor recognizes and fixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindingKind {
    /// Identical inline links adjacent on one line.
    DuplicateLink,
    /// Heading marker with no space before the text.
    HeadingSpace,
    /// An external URL the link mapping knows a local path for.
    UnrewrittenUrl,
    /// A run of three or more blank lines.
    ExcessBlankLines,
    /// Spaces or tabs at the end of a line.
    TrailingWhitespace,
}

impl FindingKind {
    pub fn label(&self) -> &'static str {
        match self {
            FindingKind::DuplicateLink => "duplicate-link",
            FindingKind::HeadingSpace => "heading-space",
            FindingKind::UnrewrittenUrl => "unrewritten-url",
            FindingKind::ExcessBlankLines => "blank-lines",
            FindingKind::TrailingWhitespace => "trailing-whitespace",
        }
    }
}

/// Summary returned by [`fix_tree`].
#[derive(Debug)]
pub struct FixSummary {
    pub files_scanned: usize,
    pub files_changed: usize,
    pub findings: Vec<Finding>,
}

// ---------------------------------------------------------------------------
// Tree entry points
// ---------------------------------------------------------------------------

/// Scan every markdown file under `root` and report what `fix_tree` would
/// change, without writing anything.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn audit_tree(root: &Path, mapping: &LinkMapping) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();

    for file in markdown_files(root)? {
        let content = std::fs::read_to_string(&file).map_err(|e| SpecSyncError::io(&file, e))?;
        let (_, raw) = apply_fixes(&content, mapping);
        attach(&mut findings, &file, raw);
    }

    info!(findings = findings.len(), "audit complete");
    Ok(findings)
}

/// Apply every fix in place under `root`. Idempotent: a second run reports
/// zero changes.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn fix_tree(root: &Path, mapping: &LinkMapping) -> Result<FixSummary> {
    let mut summary = FixSummary {
        files_scanned: 0,
        files_changed: 0,
        findings: Vec::new(),
    };

    for file in markdown_files(root)? {
        summary.files_scanned += 1;

        let content = std::fs::read_to_string(&file).map_err(|e| SpecSyncError::io(&file, e))?;
        let (fixed, raw) = apply_fixes(&content, mapping);

        if fixed != content {
            std::fs::write(&file, &fixed).map_err(|e| SpecSyncError::io(&file, e))?;
            summary.files_changed += 1;
            debug!(path = %file.display(), findings = raw.len(), "fixed file");
        }

        attach(&mut summary.findings, &file, raw);
    }

    info!(
        files_scanned = summary.files_scanned,
        files_changed = summary.files_changed,
        findings = summary.findings.len(),
        "fix complete"
    );
    Ok(summary)
}

/// Every `.md` file under `root`, in a stable order.
fn markdown_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf());
            SpecSyncError::io(path, e.into())
        })?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "md") {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

// ---------------------------------------------------------------------------
// Fix passes
// ---------------------------------------------------------------------------

struct RawFinding {
    line: usize,
    kind: FindingKind,
    detail: String,
}

fn attach(findings: &mut Vec<Finding>, file: &Path, raw: Vec<RawFinding>) {
    for r in raw {
        findings.push(Finding {
            file: file.to_path_buf(),
            line: r.line,
            kind: r.kind,
            detail: r.detail,
        });
    }
}

/// Run every pass over one document. Returns the fixed text and the findings
/// with line numbers. The first four passes preserve line structure, so line
/// numbers always refer to the file as it was read.
fn apply_fixes(text: &str, mapping: &LinkMapping) -> (String, Vec<RawFinding>) {
    let mut findings = Vec::new();

    // Rewriting runs before duplicate collapse: an expanded label or a
    // rewritten URL can land beside an identical link, and that duplicate
    // must disappear in the same pass. Rewritten output is stable, so a
    // second pass sees nothing left to do.
    let rewritten = rewrite_links(text, mapping);
    record(
        &mut findings,
        &changed_lines(text, &rewritten),
        FindingKind::UnrewrittenUrl,
        "external link rewritten to local path",
    );

    let deduped = collapse_duplicate_links(&rewritten);
    record(
        &mut findings,
        &changed_lines(&rewritten, &deduped),
        FindingKind::DuplicateLink,
        "duplicate adjacent link collapsed",
    );

    let headed = fix_heading_spaces(&deduped);
    record(
        &mut findings,
        &changed_lines(&deduped, &headed),
        FindingKind::HeadingSpace,
        "missing space after heading marker",
    );

    let trimmed = trim_trailing_whitespace(&headed);
    record(
        &mut findings,
        &changed_lines(&headed, &trimmed),
        FindingKind::TrailingWhitespace,
        "trailing whitespace trimmed",
    );

    let (collapsed, blank_findings) = collapse_blank_runs(&trimmed);
    findings.extend(blank_findings);

    findings.sort_by_key(|f| f.line);
    (collapsed, findings)
}

fn record(findings: &mut Vec<RawFinding>, lines: &[usize], kind: FindingKind, detail: &str) {
    for &line in lines {
        findings.push(RawFinding {
            line,
            kind,
            detail: detail.to_string(),
        });
    }
}

/// 1-based numbers of lines that differ. Only valid when both texts have the
/// same number of lines.
fn changed_lines(before: &str, after: &str) -> Vec<usize> {
    before
        .split('\n')
        .zip(after.split('\n'))
        .enumerate()
        .filter(|(_, (b, a))| b != a)
        .map(|(i, _)| i + 1)
        .collect()
}

static INLINE_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid regex"));

/// Collapse runs of identical inline links separated only by same-line
/// whitespace down to the first occurrence.
fn collapse_duplicate_links(text: &str) -> String {
    let matches: Vec<(std::ops::Range<usize>, &str)> = INLINE_LINK_RE
        .find_iter(text)
        .map(|m| (m.range(), m.as_str()))
        .collect();

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    let mut i = 0;

    while i < matches.len() {
        let (range, link) = &matches[i];

        // Extend the run over identical links that follow directly.
        let mut j = i;
        while j + 1 < matches.len() {
            let (next_range, next_link) = &matches[j + 1];
            let gap = &text[matches[j].0.end..next_range.start];
            if next_link == link && gap.chars().all(|c| c == ' ' || c == '\t') {
                j += 1;
            } else {
                break;
            }
        }

        out.push_str(&text[cursor..range.end]);
        cursor = matches[j].0.end;
        i = j + 1;
    }

    out.push_str(&text[cursor..]);
    out
}

/// Insert the missing space in `#Heading` lines, leaving fenced code blocks
/// alone.
fn fix_heading_spaces(text: &str) -> String {
    static TIGHT_HEADING_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^(#{1,6})([^#\s].*)$").expect("valid regex"));

    let mut in_fence = false;
    let fixed: Vec<String> = text
        .split('\n')
        .map(|line| {
            if line.trim_start().starts_with("```") {
                in_fence = !in_fence;
                return line.to_string();
            }
            if in_fence {
                return line.to_string();
            }
            match TIGHT_HEADING_RE.captures(line) {
                Some(caps) => format!("{} {}", &caps[1], &caps[2]),
                None => line.to_string(),
            }
        })
        .collect();

    fixed.join("\n")
}

fn trim_trailing_whitespace(text: &str) -> String {
    let trimmed: Vec<&str> = text
        .split('\n')
        .map(|line| line.trim_end_matches([' ', '\t']))
        .collect();
    trimmed.join("\n")
}

/// Collapse runs of three or more blank lines to exactly two.
fn collapse_blank_runs(text: &str) -> (String, Vec<RawFinding>) {
    static MULTI_BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{4,}").expect("valid regex"));

    let mut findings = Vec::new();
    for m in MULTI_BLANK_RE.find_iter(text) {
        findings.push(RawFinding {
            line: line_of(text, m.start()) + 1,
            kind: FindingKind::ExcessBlankLines,
            detail: format!("run of {} blank lines trimmed to 2", m.as_str().len() - 1),
        });
    }

    let collapsed = MULTI_BLANK_RE.replace_all(text, "\n\n\n").to_string();
    (collapsed, findings)
}

fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].bytes().filter(|&b| b == b'\n').count() + 1
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
