//! End-to-end `sync` pipeline: config → fetch → transform → write → manifest.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

use specsync_fetcher::{FetchedSpec, Fetcher};
use specsync_markdown::{LinkMapping, transform, wrap_schema};
use specsync_shared::{AppConfig, Result, SpecSyncError};

use crate::{sidebar, templates, writer};

/// Result of one `sync` run.
#[derive(Debug)]
pub struct SyncResult {
    /// Primary documents written.
    pub docs_written: usize,
    /// Schema pages written.
    pub schemas_written: usize,
    /// Entries skipped after a primary fetch failure, with the cause.
    pub skipped: Vec<(String, String)>,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when an entry's documents have been fetched.
    fn entry_fetched(&self, name: &str, current: usize, total: usize);
    /// Called when an entry's pages have been written.
    fn entry_written(&self, name: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &SyncResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn entry_fetched(&self, _name: &str, _current: usize, _total: usize) {}
    fn entry_written(&self, _name: &str, _current: usize, _total: usize) {}
    fn done(&self, _result: &SyncResult) {}
}

/// Run the full sync pipeline.
///
/// 1. Build the link mapping from configuration
/// 2. Clear the output tree (keep marker spared)
/// 3. Fetch all entries with bounded concurrency
/// 4. Transform and write each fetched entry, in registry order
/// 5. Copy templates
/// 6. Write the sidebar manifest
///
/// A failed primary fetch skips its entry and is reported in the result; a
/// filesystem error aborts the run.
#[instrument(skip_all, fields(sources = config.sources.len()))]
pub async fn sync(config: &AppConfig, progress: &dyn ProgressReporter) -> Result<SyncResult> {
    let start = Instant::now();

    if config.sources.is_empty() {
        return Err(SpecSyncError::config(
            "no [[sources]] configured; nothing to sync",
        ));
    }

    info!(sources = config.sources.len(), "starting sync");

    // --- Phase 1: Link mapping ---
    let mapping = LinkMapping::build(&config.sources, &config.links)?;

    // --- Phase 2: Clear output ---
    progress.phase("Clearing output directory");
    writer::clear_output(&config.site.output_dir, &config.site.keep_marker)?;

    // --- Phase 3: Fetch ---
    progress.phase("Fetching source documents");
    let fetched = fetch_all(config, progress).await?;

    // --- Phase 4: Transform and write ---
    progress.phase("Writing documents");
    let mut docs_written = 0usize;
    let mut schemas_written = 0usize;
    let mut skipped = Vec::new();
    let total = fetched.len();

    for (i, outcome) in fetched.into_iter().enumerate() {
        match outcome {
            Ok(spec) => {
                write_entry(config, &mapping, &spec, &mut schemas_written)?;
                docs_written += 1;
                progress.entry_written(&spec.entry.name, i + 1, total);
            }
            Err((name, error)) => {
                warn!(name = %name, error = %error, "entry skipped");
                skipped.push((name, error));
            }
        }
    }

    // --- Phase 5: Templates ---
    if let Some(templates_dir) = &config.site.templates_dir {
        progress.phase("Copying templates");
        templates::copy_templates(templates_dir, &config.site.output_dir)?;
    }

    // --- Phase 6: Sidebar manifest ---
    progress.phase("Writing sidebar manifest");
    sidebar::write_manifest(&config.site.sidebar_manifest, &config.sidebar)?;
    sidebar::report_dangling_slugs(&config.sidebar, &config.site.output_dir);

    let result = SyncResult {
        docs_written,
        schemas_written,
        skipped,
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        docs_written = result.docs_written,
        schemas_written = result.schemas_written,
        skipped = result.skipped.len(),
        elapsed_ms = result.elapsed.as_millis(),
        "sync complete"
    );

    Ok(result)
}

/// Per-entry fetch outcome: the fetched content, or the entry name with the
/// error that skipped it.
type FetchOutcome = std::result::Result<FetchedSpec, (String, String)>;

/// Fetch every entry with bounded concurrency, preserving registry order in
/// the returned vec. A failed primary fetch becomes a per-entry error, never
/// a run failure.
async fn fetch_all(
    config: &AppConfig,
    progress: &dyn ProgressReporter,
) -> Result<Vec<FetchOutcome>> {
    let fetcher = Arc::new(Fetcher::new(&config.fetch)?);
    let semaphore = Arc::new(Semaphore::new(config.fetch.concurrency.max(1)));
    let total = config.sources.len();

    let mut handles = Vec::with_capacity(total);
    for entry in config.sources.iter().cloned() {
        let fetcher = fetcher.clone();
        let sem = semaphore.clone();
        handles.push(tokio::spawn(async move {
            let _permit = sem.acquire().await.expect("semaphore closed");
            let name = entry.name.clone();
            fetcher
                .fetch_entry(&entry)
                .await
                .map_err(|e| (name, e.to_string()))
        }));
    }

    let mut outcomes = Vec::with_capacity(total);
    for (i, handle) in handles.into_iter().enumerate() {
        let outcome = handle
            .await
            .map_err(|e| SpecSyncError::validation(format!("fetch task panicked: {e}")))?;
        if let Ok(spec) = &outcome {
            progress.entry_fetched(&spec.entry.name, i + 1, total);
        }
        outcomes.push(outcome);
    }

    Ok(outcomes)
}

/// Transform one fetched entry and write its pages.
fn write_entry(
    config: &AppConfig,
    mapping: &LinkMapping,
    spec: &FetchedSpec,
    schemas_written: &mut usize,
) -> Result<()> {
    let doc = transform(
        &spec.document,
        &spec.entry.title,
        Some(&spec.entry.document_url),
        mapping,
        &config.transform,
    );

    let index_path = format!("{}/index.md", spec.entry.name);
    writer::write_doc(&config.site.output_dir, &index_path, &doc.render())?;

    if let Some(schema) = &spec.schema {
        let page = wrap_schema(schema, &doc.frontmatter.title);
        let schema_path = format!("{}/schema.md", spec.entry.name);
        writer::write_doc(&config.site.output_dir, &schema_path, &page.render())?;
        *schemas_written += 1;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
