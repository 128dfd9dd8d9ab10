//! Storage module for persisting analysis results
//!
//! This module handles all database operations of the analyzer:
//! - SQLite database initialization and schema management
//! - URL submission and the dispatcher's work queue
//! - Transactional result writes with their unreachable-link details
//! - Paginated listing, manual status changes and deletion for the façade

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

pub use crate::analyzer::UnreachableLink;

use crate::analyzer::{HeadingCounts, HtmlVersion, PageMetrics};
use crate::state::CheckStatus;
use chrono::{DateTime, Utc};

/// One submitted URL and the results of its last check
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRecord {
    pub id: i64,
    pub url: String,
    pub status: CheckStatus,
    pub submitted_at: DateTime<Utc>,
    /// Unset until the first `checked`/`error` outcome
    pub checked_at: Option<DateTime<Utc>>,
    pub title: String,
    /// Unset until the first successful analysis
    pub html_version: Option<HtmlVersion>,
    pub headings: HeadingCounts,
    pub internal_link_count: u32,
    pub external_link_count: u32,
    /// Always equal to `unreachable_links.len()`
    pub unreachable_link_count: u32,
    pub has_login_form: bool,
    pub unreachable_links: Vec<UnreachableLink>,
}

impl AnalysisRecord {
    /// The write that changes this record's status and nothing else
    pub fn with_status(&self, status: CheckStatus) -> CheckUpdate {
        CheckUpdate {
            url: self.url.clone(),
            status,
            checked_at: self.checked_at,
            title: self.title.clone(),
            html_version: self.html_version,
            headings: self.headings,
            internal_links: self.internal_link_count,
            external_links: self.external_link_count,
            has_login_form: self.has_login_form,
            unreachable_links: self.unreachable_links.clone(),
        }
    }
}

/// A record the dispatcher may pick up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedRecord {
    pub id: i64,
    pub url: String,
}

/// A full write of a record's mutable fields
///
/// The unreachable count is not a field: it is derived from the detail list
/// on write, so the two cannot disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckUpdate {
    pub url: String,
    pub status: CheckStatus,
    pub checked_at: Option<DateTime<Utc>>,
    pub title: String,
    pub html_version: Option<HtmlVersion>,
    pub headings: HeadingCounts,
    pub internal_links: u32,
    pub external_links: u32,
    pub has_login_form: bool,
    pub unreachable_links: Vec<UnreachableLink>,
}

impl CheckUpdate {
    /// Fresh `pending` state: metrics zeroed, details cleared
    pub fn pending(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: CheckStatus::Pending,
            checked_at: None,
            title: String::new(),
            html_version: None,
            headings: HeadingCounts::default(),
            internal_links: 0,
            external_links: 0,
            has_login_form: false,
            unreachable_links: Vec::new(),
        }
    }

    /// `error` outcome: the page itself is the single unreachable link
    pub fn failed(url: impl Into<String>, detail: UnreachableLink, checked_at: DateTime<Utc>) -> Self {
        Self {
            status: CheckStatus::Error,
            checked_at: Some(checked_at),
            unreachable_links: vec![detail],
            ..Self::pending(url)
        }
    }

    /// `checked` outcome carrying the page metrics
    pub fn checked(url: impl Into<String>, metrics: PageMetrics, checked_at: DateTime<Utc>) -> Self {
        Self {
            url: url.into(),
            status: CheckStatus::Checked,
            checked_at: Some(checked_at),
            title: metrics.title,
            html_version: Some(metrics.html_version),
            headings: metrics.headings,
            internal_links: metrics.internal_links,
            external_links: metrics.external_links,
            has_login_form: metrics.has_login_form,
            unreachable_links: metrics.unreachable_links,
        }
    }

    pub fn unreachable_count(&self) -> u32 {
        self.unreachable_links.len() as u32
    }
}

/// One page of records plus the total across all pages
#[derive(Debug, Clone, PartialEq)]
pub struct RecordPage {
    pub records: Vec<AnalysisRecord>,
    pub total_count: u64,
}
