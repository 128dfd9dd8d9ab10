//! Integration tests for the analyzer
//!
//! These tests use wiremock to create mock HTTP servers and exercise the
//! fetcher, the full dispatcher cycle, and the `/links` API end-to-end.

mod dispatcher_tests;
mod server_tests;

use webpage_analyzer::config::{
    Config, DatabaseConfig, ServerConfig, UserAgentConfig, WorkerConfig,
};

/// Creates a test configuration writing to `db_path`
pub fn create_test_config(db_path: &str) -> Config {
    Config {
        worker: WorkerConfig {
            poll_interval_ms: 20, // Very short for testing
            fetch_timeout_secs: 5,
            probe_timeout_secs: 2,
            max_probe_redirects: 5,
            probe_concurrency: 1,
            recover_pending: true,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestAnalyzer".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        database: DatabaseConfig {
            path: db_path.to_string(),
        },
        server: ServerConfig::default(),
    }
}
