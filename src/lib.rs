//! Webpage Analyzer: a status-driven page analysis service
//!
//! Submitted URLs are queued in a SQLite store, picked up one at a time by a
//! background dispatcher, fetched, analyzed (HTML version, title, headings,
//! link classification, outbound reachability, login forms) and written back
//! together with their unreachable-link details.

pub mod analyzer;
pub mod config;
pub mod dispatcher;
pub mod fetcher;
pub mod server;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Webpage Analyzer operations
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server error: {0}")]
    Server(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Webpage Analyzer operations
pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use analyzer::{analyze, HtmlVersion, PageMetrics};
pub use config::Config;
pub use dispatcher::Dispatcher;
pub use state::CheckStatus;
pub use storage::{AnalysisRecord, SqliteStorage, Storage, UnreachableLink};
