//! Page fetching and link probing
//!
//! This module owns all network access of the pipeline:
//! - `fetch`: GET the submitted page with a bounded timeout
//! - `probe`: lightweight HEAD check of an outbound link
//!
//! Both are exposed through traits so the dispatcher and analyzer can be
//! driven by fixed-response fakes in tests.

mod http;

pub use http::{build_http_client, build_probe_client, HttpFetcher};

use crate::analyzer::UnreachableLink;
use async_trait::async_trait;
use std::sync::Arc;

/// A successfully fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,
    pub status_code: u16,
    pub body: String,
}

/// Why a page fetch failed
///
/// Every failure is terminal for the record; there is no retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    /// HTTP status when the server answered with >= 400
    pub status_code: Option<u16>,
    pub reason: String,
}

impl FetchFailure {
    pub fn http(status_code: u16) -> Self {
        Self {
            status_code: Some(status_code),
            reason: format!("HTTP {}", status_code),
        }
    }

    pub fn transport(reason: impl Into<String>) -> Self {
        Self {
            status_code: None,
            reason: reason.into(),
        }
    }

    /// Status to record: the HTTP code, or the connection-failure sentinel
    pub fn recorded_status(&self) -> i32 {
        self.status_code
            .map(i32::from)
            .unwrap_or(UnreachableLink::CONNECTION_FAILURE)
    }

    /// The single detail row describing the page itself
    pub fn to_unreachable(&self, url: &str) -> UnreachableLink {
        UnreachableLink::new(url, self.recorded_status())
    }
}

/// Result of probing one outbound link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Reachable { status_code: u16 },
    /// HTTP status >= 400, or [`UnreachableLink::CONNECTION_FAILURE`]
    Unreachable { status_code: i32 },
}

impl ProbeOutcome {
    /// Classifies an HTTP status: anything >= 400 is unreachable
    pub fn from_status(status_code: u16) -> Self {
        if status_code >= 400 {
            Self::Unreachable {
                status_code: i32::from(status_code),
            }
        } else {
            Self::Reachable { status_code }
        }
    }

    pub fn connection_failure() -> Self {
        Self::Unreachable {
            status_code: UnreachableLink::CONNECTION_FAILURE,
        }
    }

    pub fn is_reachable(&self) -> bool {
        matches!(self, Self::Reachable { .. })
    }
}

/// Checks whether an outbound link answers
#[async_trait]
pub trait LinkProber: Send + Sync {
    /// Never fails: transport problems become an `Unreachable` outcome
    async fn probe(&self, url: &str) -> ProbeOutcome;
}

/// Retrieves submitted pages; also a prober for their links
#[async_trait]
pub trait PageFetcher: LinkProber {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchFailure>;
}

#[async_trait]
impl<T: LinkProber + ?Sized> LinkProber for Arc<T> {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        (**self).probe(url).await
    }
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for Arc<T> {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchFailure> {
        (**self).fetch(url).await
    }
}
