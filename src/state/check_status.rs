//! Check status definitions for analysis records
//!
//! A record moves `created -> pending -> {checked | error}` under the
//! dispatcher; `stop` and manual re-queues to `pending` only come from the
//! façade.

use std::fmt;

/// Represents where a record is in the analysis lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckStatus {
    /// Submitted, waiting for the dispatcher
    Created,

    /// Claimed by the dispatcher, or manually re-queued
    Pending,

    /// Fetched and analyzed successfully
    Checked,

    /// The page itself could not be fetched
    Error,

    /// Parked by an operator; never picked up again unless re-queued
    Stop,
}

impl CheckStatus {
    /// Returns true for the statuses an operator may set through the façade
    pub fn is_manual_target(&self) -> bool {
        matches!(self, Self::Pending | Self::Stop)
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Pending => "pending",
            Self::Checked => "checked",
            Self::Error => "error",
            Self::Stop => "stop",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "created" => Some(Self::Created),
            "pending" => Some(Self::Pending),
            "checked" => Some(Self::Checked),
            "error" => Some(Self::Error),
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }

    /// Parses a status requested through the façade
    ///
    /// Only `pending` and `stop` are accepted; anything else is rejected
    /// before it reaches the store.
    pub fn parse_manual(s: &str) -> Option<Self> {
        Self::from_db_string(s).filter(Self::is_manual_target)
    }

    pub fn all_statuses() -> [Self; 5] {
        [
            Self::Created,
            Self::Pending,
            Self::Checked,
            Self::Error,
            Self::Stop,
        ]
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

impl serde::Serialize for CheckStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.to_db_string())
    }
}
