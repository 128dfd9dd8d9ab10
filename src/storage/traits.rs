//! Storage traits and error types
//!
//! This module defines the trait interface for the result store and its
//! error type.

use crate::state::CheckStatus;
use crate::storage::{AnalysisRecord, CheckUpdate, QueuedRecord, RecordPage};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// The update matched no row
    #[error("Record not found: {0}")]
    NotFound(i64),

    /// The dispatcher's claim was cleared by a manual status change
    #[error("Record {0} is no longer claimed by the dispatcher")]
    NotClaimed(i64),

    #[error("Status '{0}' cannot be set manually")]
    InvalidStatus(CheckStatus),

    #[error("Invalid page request: page size {page_size}, page {page}")]
    InvalidPagination { page_size: u32, page: u32 },

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StorageError {
    /// True when the record does not exist, as opposed to a database failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// True when a dispatcher commit lost its claim to a manual status edit
    pub fn is_not_claimed(&self) -> bool {
        matches!(self, Self::NotClaimed(_))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for result store implementations
///
/// Every method takes `&self`: the dispatcher and the façade share one store
/// handle across tasks, so implementations serialize access internally.
pub trait Storage: Send + Sync {
    // ===== Submission =====

    /// Creates one `created` record per URL, all in a single transaction
    ///
    /// # Returns
    ///
    /// The new record IDs, in input order
    fn submit_urls(&self, urls: &[String]) -> StorageResult<Vec<i64>>;

    // ===== Work Queue =====

    /// Finds one record the dispatcher may process
    ///
    /// Eligible: `created`, or `pending` without a dispatcher claim (a
    /// manual re-queue). Lowest id first.
    fn next_eligible(&self) -> StorageResult<Option<QueuedRecord>>;

    /// Marks a record `pending` and in flight, clearing its metrics and details
    fn claim_record(&self, id: i64, url: &str) -> StorageResult<()>;

    /// Writes status, metrics and the full unreachable-link set atomically
    ///
    /// Existing detail rows are replaced, never appended to. Only a record
    /// still claimed by `claim_record` is written: fails with `NotClaimed`
    /// when a manual status edit cleared the claim, and with `NotFound` when
    /// the id matches no row.
    fn commit_check(&self, id: i64, update: &CheckUpdate) -> StorageResult<()>;

    /// Clears dispatcher claims left behind by an interrupted process
    ///
    /// # Returns
    ///
    /// The number of records made eligible again
    fn requeue_stranded(&self) -> StorageResult<usize>;

    // ===== Façade Queries =====

    /// Changes only the status of a record (`pending` or `stop`)
    ///
    /// Everything else, detail rows included, is rewritten unchanged in the
    /// same transactional write `commit_check` uses.
    fn set_status(&self, id: i64, status: CheckStatus) -> StorageResult<()>;

    /// Gets a record with its unreachable-link details
    fn get_record(&self, id: i64) -> StorageResult<AnalysisRecord>;

    /// Lists records ordered by id; `page` is 1-based
    fn list_records(&self, page_size: u32, page: u32) -> StorageResult<RecordPage>;

    /// Deletes a record; its detail rows go with it
    fn delete_record(&self, id: i64) -> StorageResult<()>;

    // ===== Statistics =====

    /// Counts records per status
    fn count_by_status(&self) -> StorageResult<HashMap<CheckStatus, u64>>;
}
