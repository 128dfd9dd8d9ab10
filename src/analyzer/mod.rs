//! HTML analyzer
//!
//! This module turns a fetched document into [`PageMetrics`]:
//! - HTML version from the document type declaration (or HTML5 markers)
//! - Page title and per-level heading counts
//! - Internal/external link counts
//! - Unreachable outbound links, found by probing each candidate link
//! - Login form presence
//!
//! Only the probes touch the network, and they go through the injected
//! [`LinkProber`]; the rest is [`inspect_document`], a pure function.

mod document;
mod links;
mod version;

pub use document::{inspect_document, PageInspection};
pub use links::{check_links, classify, discover_link, DiscoveredLink, LinkScope};
pub use version::{detect_html_version, version_from_declaration, HtmlVersion};

use crate::fetcher::LinkProber;
use serde::ser::SerializeMap;
use serde::Serialize;
use url::Url;

/// An outbound link (or the page itself) that could not be reached
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct UnreachableLink {
    pub url: String,
    /// HTTP status observed, or [`UnreachableLink::CONNECTION_FAILURE`]
    pub status_code: i32,
}

impl UnreachableLink {
    /// Status recorded when no HTTP response was obtained
    pub const CONNECTION_FAILURE: i32 = -1;

    pub fn new(url: impl Into<String>, status_code: i32) -> Self {
        Self {
            url: url.into(),
            status_code,
        }
    }

    pub fn connection_failure(url: impl Into<String>) -> Self {
        Self::new(url, Self::CONNECTION_FAILURE)
    }

    pub fn is_connection_failure(&self) -> bool {
        self.status_code == Self::CONNECTION_FAILURE
    }
}

/// Count of `h1`..`h6` elements
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadingCounts([u32; 6]);

impl HeadingCounts {
    pub fn from_counts(counts: [u32; 6]) -> Self {
        Self(counts)
    }

    /// Count for heading level 1..=6; other levels are always 0
    pub fn get(&self, level: usize) -> u32 {
        match level {
            1..=6 => self.0[level - 1],
            _ => 0,
        }
    }

    pub fn as_array(&self) -> [u32; 6] {
        self.0
    }

    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }
}

impl Serialize for HeadingCounts {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(6))?;
        for (index, count) in self.0.iter().enumerate() {
            map.serialize_entry(&format!("h{}", index + 1), count)?;
        }
        map.end()
    }
}

/// Metrics derived from one analyzed page
#[derive(Debug, Clone, PartialEq)]
pub struct PageMetrics {
    pub title: String,
    pub html_version: HtmlVersion,
    pub headings: HeadingCounts,
    pub internal_links: u32,
    pub external_links: u32,
    pub unreachable_links: Vec<UnreachableLink>,
    pub has_login_form: bool,
}

impl PageMetrics {
    /// Always the length of the detail list
    pub fn unreachable_count(&self) -> u32 {
        self.unreachable_links.len() as u32
    }
}

/// Analyzes a fetched document
///
/// `probe_concurrency` bounds how many outbound links are probed at once; 1
/// probes them one by one in document order.
pub async fn analyze<P>(base_url: &Url, html: &str, prober: &P, probe_concurrency: usize) -> PageMetrics
where
    P: LinkProber + ?Sized,
{
    let inspection = inspect_document(base_url, html);
    let unreachable = check_links(prober, &inspection.links, probe_concurrency).await;

    tracing::debug!(
        "Analyzed {}: {} links, {} unreachable",
        base_url,
        inspection.links.len(),
        unreachable.len()
    );

    inspection.into_metrics(unreachable)
}
