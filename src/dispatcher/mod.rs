//! Dispatcher module for background record processing
//!
//! This module contains the work loop that moves records through their
//! status state machine:
//! - Polling the store for eligible records
//! - Coordinating fetching and analysis
//! - Committing results atomically
//! - Cooperative shutdown

mod worker;

pub use worker::{CycleOutcome, Dispatcher};

use crate::config::Config;
use crate::fetcher::HttpFetcher;
use crate::storage::Storage;
use crate::AnalyzerError;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A dispatcher running on its own task
pub struct DispatcherHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl DispatcherHandle {
    /// Signals the loop to stop and waits for the current cycle to finish
    pub async fn shutdown(self) -> Result<(), AnalyzerError> {
        // A send error means the loop already exited
        let _ = self.shutdown.send(true);
        self.task
            .await
            .map_err(|e| AnalyzerError::Server(format!("Dispatcher task failed: {}", e)))
    }
}

/// Starts the dispatcher against the network with the configured bounds
///
/// # Arguments
///
/// * `storage` - Store handle, shared with the HTTP façade
/// * `config` - Worker bounds and user agent identity
///
/// # Returns
///
/// * `Ok(DispatcherHandle)` - Loop is running
/// * `Err(AnalyzerError)` - HTTP clients could not be built
pub fn spawn_dispatcher<S>(storage: Arc<S>, config: &Config) -> Result<DispatcherHandle, AnalyzerError>
where
    S: Storage + ?Sized + 'static,
{
    let fetcher = HttpFetcher::new(&config.user_agent, &config.worker)?;
    let dispatcher = Dispatcher::new(storage, fetcher, &config.worker);
    let (shutdown, receiver) = watch::channel(false);

    let task = tokio::spawn(async move { dispatcher.run(receiver).await });

    Ok(DispatcherHandle { shutdown, task })
}
