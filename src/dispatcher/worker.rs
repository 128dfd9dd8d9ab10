//! Dispatcher loop - drives one record at a time through fetch and analysis
//!
//! Each cycle:
//! 1. Polls the store for one eligible record
//! 2. Marks it `pending` with empty metrics
//! 3. Fetches the page; a failure becomes `error` with one detail row
//! 4. Analyzes the page and commits `checked` with all metrics
//!
//! The dispatcher keeps no record state between cycles.

use crate::analyzer::analyze;
use crate::config::WorkerConfig;
use crate::fetcher::{FetchFailure, PageFetcher};
use crate::state::CheckStatus;
use crate::storage::{CheckUpdate, QueuedRecord, Storage, UnreachableLink};
use crate::AnalyzerError;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use url::Url;

/// What one dispatcher cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing eligible
    Idle,
    Checked { id: i64 },
    Failed { id: i64, status_code: i32 },
    /// The record was deleted while it was being analyzed
    Discarded { id: i64 },
    /// A manual status change replaced the claim; its result was dropped
    Superseded { id: i64 },
}

/// Background worker that owns the record state machine
pub struct Dispatcher<S: Storage + ?Sized, F: PageFetcher> {
    storage: Arc<S>,
    fetcher: F,
    poll_interval: Duration,
    probe_concurrency: usize,
}

impl<S: Storage + ?Sized, F: PageFetcher> Dispatcher<S, F> {
    /// Creates a new dispatcher
    ///
    /// # Arguments
    ///
    /// * `storage` - Store handle shared with the HTTP façade
    /// * `fetcher` - Network access for page fetches and link probes
    /// * `config` - Poll interval and probe concurrency
    pub fn new(storage: Arc<S>, fetcher: F, config: &WorkerConfig) -> Self {
        Self {
            storage,
            fetcher,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            probe_concurrency: config.probe_concurrency.max(1),
        }
    }

    /// Runs cycles until `shutdown` turns true or its sender is dropped
    ///
    /// A record that was found is followed immediately by the next poll;
    /// idle polls and errors wait out the poll interval.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            "Dispatcher started (poll interval {:?}, probe concurrency {})",
            self.poll_interval,
            self.probe_concurrency
        );

        let mut processed: u64 = 0;

        loop {
            if *shutdown.borrow() {
                break;
            }

            let wait = match self.run_cycle().await {
                Ok(CycleOutcome::Idle) => true,
                Ok(_) => {
                    processed += 1;
                    if processed % 10 == 0 {
                        tracing::info!("Progress: {} records processed", processed);
                    }
                    false
                }
                Err(e) => {
                    tracing::error!("Dispatcher cycle failed: {}", e);
                    true
                }
            };

            if wait {
                tokio::select! {
                    _ = tokio::time::sleep(self.poll_interval) => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!("Dispatcher stopped after {} records", processed);
    }

    /// Processes at most one eligible record
    ///
    /// Storage errors are returned after logging context; the record stays in
    /// whatever state was last committed.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, AnalyzerError> {
        let queued = match self.storage.next_eligible()? {
            Some(queued) => queued,
            None => return Ok(CycleOutcome::Idle),
        };

        tracing::debug!("Processing record {}: {}", queued.id, queued.url);
        self.storage.claim_record(queued.id, &queued.url)?;

        let update = self.check(&queued).await;
        let outcome = if update.status == CheckStatus::Error {
            CycleOutcome::Failed {
                id: queued.id,
                status_code: update
                    .unreachable_links
                    .first()
                    .map(|detail| detail.status_code)
                    .unwrap_or(UnreachableLink::CONNECTION_FAILURE),
            }
        } else {
            CycleOutcome::Checked { id: queued.id }
        };

        match self.storage.commit_check(queued.id, &update) {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::warn!("Record {} was deleted during analysis", queued.id);
                return Ok(CycleOutcome::Discarded { id: queued.id });
            }
            Err(e) if e.is_not_claimed() => {
                tracing::info!(
                    "Record {} changed status during analysis, result dropped",
                    queued.id
                );
                return Ok(CycleOutcome::Superseded { id: queued.id });
            }
            Err(e) => return Err(e.into()),
        }

        match &outcome {
            CycleOutcome::Failed { status_code, .. } => {
                tracing::info!("Record {} failed: {} ({})", queued.id, queued.url, status_code)
            }
            _ => tracing::info!(
                "Record {} checked: {} ({} unreachable links)",
                queued.id,
                queued.url,
                update.unreachable_count()
            ),
        }

        Ok(outcome)
    }

    /// Fetches and analyzes one record, producing the write to commit
    async fn check(&self, queued: &QueuedRecord) -> CheckUpdate {
        let base_url = match Url::parse(&queued.url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Record {} has an invalid URL: {}", queued.id, e);
                return failed(queued, FetchFailure::transport(e.to_string()));
            }
        };

        let page = match self.fetcher.fetch(&queued.url).await {
            Ok(page) => page,
            Err(failure) => {
                tracing::warn!("Failed to fetch {}: {}", queued.url, failure.reason);
                return failed(queued, failure);
            }
        };

        if page.final_url != queued.url {
            tracing::debug!("Record {} redirected to {}", queued.id, page.final_url);
        }

        // Relative links resolve against the submitted URL
        let metrics = analyze(&base_url, &page.body, &self.fetcher, self.probe_concurrency).await;
        CheckUpdate::checked(&queued.url, metrics, Utc::now())
    }
}

fn failed(queued: &QueuedRecord, failure: FetchFailure) -> CheckUpdate {
    CheckUpdate::failed(&queued.url, failure.to_unreachable(&queued.url), Utc::now())
}
