//! HTTP fetching for specsync source documents.
//!
//! One [`Fetcher`] is built per run and shared across entries. Fetching is
//! deliberately minimal: no retries, no caching. A failed primary document
//! skips its entry; a failed schema document is omitted with a warning.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use specsync_shared::{FetchConfig, Result, SourceEntry, SpecSyncError};

/// User-Agent string for fetch requests.
const USER_AGENT: &str = concat!("specsync/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// FetchedSpec
// ---------------------------------------------------------------------------

/// A registry entry paired with its fetched document text.
#[derive(Debug, Clone)]
pub struct FetchedSpec {
    /// The registry entry this content belongs to.
    pub entry: SourceEntry,
    /// Raw markdown of the primary document.
    pub document: String,
    /// Raw schema text, when configured and fetched successfully.
    pub schema: Option<String>,
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// HTTP client wrapper for retrieving source documents.
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Build a fetcher with the configured timeout.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SpecSyncError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Fetch a URL's text body. Non-2xx statuses and transport errors both
    /// surface as [`SpecSyncError::Fetch`].
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        debug!(%url, "fetching");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SpecSyncError::fetch(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpecSyncError::fetch_status(
                url,
                status.as_u16(),
                format!("HTTP {status}"),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| SpecSyncError::fetch(url, format!("body read failed: {e}")))
    }

    /// Fetch one registry entry: the primary document, then the schema if one
    /// is configured. A primary failure propagates; a schema failure logs a
    /// warning and yields `schema: None`.
    pub async fn fetch_entry(&self, entry: &SourceEntry) -> Result<FetchedSpec> {
        let document = self.fetch_text(&entry.document_url).await?;

        let schema = match &entry.schema_url {
            Some(url) => match self.fetch_text(url).await {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!(name = %entry.name, %url, error = %e, "schema fetch failed, omitting schema page");
                    None
                }
            },
            None => None,
        };

        Ok(FetchedSpec {
            entry: entry.clone(),
            document,
            schema,
        })
    }
}
