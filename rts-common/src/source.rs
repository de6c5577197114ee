//! Source resolution: where the raw CSV text comes from
//!
//! A published spreadsheet is fetched over HTTP; a local file or an uploaded
//! blob is used as-is. Either way the result is plain text for the parser.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;
use tracing::{debug, warn};

use crate::error::IngestError;

/// Default spreadsheet export endpoint
pub const DEFAULT_EXPORT_BASE_URL: &str = "https://docs.google.com/spreadsheets/d";

const USER_AGENT: &str = concat!("rts-board/", env!("CARGO_PKG_VERSION"));

/// A published spreadsheet tab
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSource {
    pub base_url: String,
    pub sheet_id: String,
    pub tab_name: String,
}

impl SheetSource {
    pub fn new(sheet_id: impl Into<String>, tab_name: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_EXPORT_BASE_URL.to_string(),
            sheet_id: sheet_id.into(),
            tab_name: tab_name.into(),
        }
    }

    /// Override the export endpoint (tests, mirrors)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// CSV export URL with the tab name URL-encoded
    pub fn export_url(&self) -> Result<Url, IngestError> {
        let raw = format!(
            "{}/{}/gviz/tq",
            self.base_url.trim_end_matches('/'),
            self.sheet_id
        );
        Url::parse_with_params(&raw, &[("tqx", "out:csv"), ("sheet", self.tab_name.as_str())])
            .map_err(|e| IngestError::Network(format!("Invalid export URL {}: {}", raw, e)))
    }
}

/// Where one ingestion reads from
#[derive(Debug, Clone)]
pub enum Source {
    /// Published spreadsheet fetched over HTTP
    Sheet(SheetSource),
    /// CSV file on local disk
    File(PathBuf),
    /// CSV blob handed in by the user
    Upload { name: String, contents: String },
}

impl Source {
    /// Short human-readable description for logs and the dashboard
    pub fn label(&self) -> String {
        match self {
            Source::Sheet(sheet) => format!("sheet {} / {}", sheet.sheet_id, sheet.tab_name),
            Source::File(path) => format!("file {}", path.display()),
            Source::Upload { name, .. } => format!("upload {}", name),
        }
    }
}

/// True when the body is an HTML document rather than delimited text
pub fn looks_like_html(body: &str) -> bool {
    let head: String = body
        .trim_start()
        .chars()
        .take(16)
        .flat_map(char::to_lowercase)
        .collect();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

/// Classify a transport-level reqwest failure
///
/// Requests that never produced a response (refused connection, DNS, TLS,
/// blocked by a proxy) are reported as an access restriction so the user is
/// pointed to the upload fallback. Timeouts and body failures stay generic.
pub fn classify_transport_error(err: &reqwest::Error) -> IngestError {
    if err.is_timeout() || err.is_body() || err.is_decode() {
        IngestError::Network(err.to_string())
    } else if err.is_connect() || err.is_request() {
        IngestError::AccessRestricted(err.to_string())
    } else {
        IngestError::Network(err.to_string())
    }
}

/// Resolves a [`Source`] into raw CSV text
#[derive(Debug, Clone)]
pub struct SourceResolver {
    http_client: reqwest::Client,
}

impl SourceResolver {
    /// Create a resolver whose fetches give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, IngestError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| IngestError::Network(e.to_string()))?;

        Ok(Self { http_client })
    }

    /// Produce the raw text for `source`
    pub async fn resolve(&self, source: &Source) -> Result<String, IngestError> {
        match source {
            Source::Sheet(sheet) => self.fetch_sheet(sheet).await,
            Source::File(path) => {
                let bytes = tokio::fs::read(path).await?;
                let text = String::from_utf8(bytes).map_err(|e| {
                    IngestError::Parse(format!("{} is not valid UTF-8: {}", path.display(), e))
                })?;
                reject_html(text)
            }
            Source::Upload { contents, .. } => reject_html(contents.clone()),
        }
    }

    /// Fetch the CSV export of a published sheet
    pub async fn fetch_sheet(&self, sheet: &SheetSource) -> Result<String, IngestError> {
        let body = self.fetch_export(sheet).await?;
        reject_html(body)
    }

    /// Fetch the export body as-is, checking only the HTTP status
    pub async fn fetch_export(&self, sheet: &SheetSource) -> Result<String, IngestError> {
        let url = sheet.export_url()?;
        debug!(url = %url, "Fetching sheet export");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                let classified = classify_transport_error(&e);
                warn!(kind = classified.kind(), "Sheet fetch failed: {}", e);
                classified
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Fetch {
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| IngestError::Network(e.to_string()))
    }
}

fn reject_html(body: String) -> Result<String, IngestError> {
    if looks_like_html(&body) {
        Err(IngestError::PrivateSheet)
    } else {
        Ok(body)
    }
}
