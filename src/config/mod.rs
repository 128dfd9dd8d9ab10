//! Configuration module for Webpage Analyzer
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use webpage_analyzer::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Probe timeout: {}s", config.worker.probe_timeout_secs);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, DatabaseConfig, ServerConfig, UserAgentConfig, WorkerConfig};

// Re-export parser functions
pub use parser::{load_config, load_config_with_hash, parse_config};
