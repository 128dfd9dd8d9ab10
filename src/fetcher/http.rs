//! reqwest-backed fetcher
//!
//! Two clients with independent bounds:
//! - the page client follows redirects normally and uses the fetch timeout
//! - the probe client sends a browser-like User-Agent, uses the short probe
//!   timeout and stops following after `max_probe_redirects`, keeping the
//!   last response instead of erroring

use crate::config::{UserAgentConfig, WorkerConfig};
use crate::fetcher::{FetchFailure, FetchedPage, LinkProber, PageFetcher, ProbeOutcome};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;

/// Builds the client used for the main page fetch
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use webpage_analyzer::config::UserAgentConfig;
/// use webpage_analyzer::fetcher::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "PageAnalyzer".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.fetch_user_agent())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Builds the client used for outbound link probes
pub fn build_probe_client(
    config: &UserAgentConfig,
    timeout: Duration,
    max_redirects: usize,
) -> Result<Client, reqwest::Error> {
    // Past the limit the redirect response itself is the answer
    let policy = Policy::custom(move |attempt| {
        if attempt.previous().len() > max_redirects {
            attempt.stop()
        } else {
            attempt.follow()
        }
    });

    Client::builder()
        .user_agent(config.probe_user_agent())
        .timeout(timeout)
        .redirect(policy)
        .build()
}

/// Network fetcher used by the dispatcher in production
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    page_client: Client,
    probe_client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &UserAgentConfig, worker: &WorkerConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            page_client: build_http_client(
                user_agent,
                Duration::from_secs(worker.fetch_timeout_secs),
            )?,
            probe_client: build_probe_client(
                user_agent,
                Duration::from_secs(worker.probe_timeout_secs),
                worker.max_probe_redirects,
            )?,
        })
    }

    /// Wraps already-built clients
    pub fn with_clients(page_client: Client, probe_client: Client) -> Self {
        Self {
            page_client,
            probe_client,
        }
    }
}

fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        "Connection refused".to_string()
    } else if error.is_builder() {
        format!("Invalid request: {}", error)
    } else {
        error.to_string()
    }
}

#[async_trait]
impl LinkProber for HttpFetcher {
    /// HEAD first; servers that refuse HEAD (405/501) get one GET
    async fn probe(&self, url: &str) -> ProbeOutcome {
        let mut response = self.probe_client.head(url).send().await;

        if let Ok(head) = &response {
            if matches!(
                head.status(),
                StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
            ) {
                tracing::debug!("HEAD refused by {}, retrying with GET", url);
                response = self.probe_client.get(url).send().await;
            }
        }

        match response {
            Ok(response) => ProbeOutcome::from_status(response.status().as_u16()),
            Err(e) => {
                tracing::debug!("Probe of {} failed: {}", url, describe_transport_error(&e));
                ProbeOutcome::connection_failure()
            }
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    /// Fetches a page; any status >= 400 or transport error is a failure
    ///
    /// | Condition | Outcome |
    /// |-----------|---------|
    /// | 2xx/3xx with readable body | `FetchedPage` |
    /// | HTTP >= 400 | failure with that status |
    /// | timeout / connect / TLS error | failure, no status |
    /// | body read error | failure, no status |
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchFailure> {
        let response = self
            .page_client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchFailure::transport(describe_transport_error(&e)))?;

        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(FetchFailure::http(status.as_u16()));
        }

        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| FetchFailure::transport(format!("Failed to read body: {}", e)))?;

        Ok(FetchedPage {
            final_url,
            status_code: status.as_u16(),
            body,
        })
    }
}
