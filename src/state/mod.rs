//! State module for tracking analysis progress
//!
//! `CheckStatus` is the status field the store persists for each record and
//! the dispatcher's only notion of where a record is.

mod check_status;

pub use check_status::CheckStatus;
