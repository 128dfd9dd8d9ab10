//! Webpage Analyzer main entry point
//!
//! This is the command-line interface for the Webpage Analyzer service.

use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use webpage_analyzer::config::{load_config_with_hash, Config};
use webpage_analyzer::dispatcher::spawn_dispatcher;
use webpage_analyzer::server::{serve, AppState};
use webpage_analyzer::state::CheckStatus;
use webpage_analyzer::storage::{SqliteStorage, Storage};

/// Webpage Analyzer: queue web pages and inspect their structure
///
/// Submitted URLs are fetched in the background and analyzed for HTML
/// version, title, headings, link counts, unreachable links and login
/// forms. Results are served over a small JSON API.
#[derive(Parser, Debug)]
#[command(name = "webpage-analyzer")]
#[command(version = "1.0.0")]
#[command(about = "A status-driven webpage analysis service", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the effective settings without serving
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show per-status record counts from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_serve(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("webpage_analyzer=info,warn"),
            1 => EnvFilter::new("webpage_analyzer=debug,info"),
            2 => EnvFilter::new("webpage_analyzer=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the validated configuration
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Webpage Analyzer Dry Run ===\n");

    println!("Worker:");
    println!("  Poll interval: {}ms", config.worker.poll_interval_ms);
    println!("  Fetch timeout: {}s", config.worker.fetch_timeout_secs);
    println!("  Probe timeout: {}s", config.worker.probe_timeout_secs);
    println!("  Max probe redirects: {}", config.worker.max_probe_redirects);
    println!("  Probe concurrency: {}", config.worker.probe_concurrency);
    println!("  Recover pending on start: {}", config.worker.recover_pending);

    println!("\nUser Agent:");
    println!("  Page fetches: {}", config.user_agent.fetch_user_agent());
    println!("  Link probes: {}", config.user_agent.probe_user_agent());

    println!("\nDatabase: {}", config.database.path);

    println!("\nServer:");
    println!("  Bind address: {}", config.server.bind_address);
    println!(
        "  Page size: {} (max {})",
        config.server.default_page_size, config.server.max_page_size
    );
    println!("  Allowed origins ({}):", config.server.allowed_origins.len());
    for origin in &config.server.allowed_origins {
        println!("    - {}", origin);
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows record counts per status
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.database.path);

    let storage = SqliteStorage::new(Path::new(&config.database.path))?;
    let counts = storage.count_by_status()?;

    let total: u64 = counts.values().sum();
    println!("Records: {}", total);
    for status in CheckStatus::all_statuses() {
        println!(
            "  {:<8} {}",
            status.to_db_string(),
            counts.get(&status).copied().unwrap_or(0)
        );
    }

    Ok(())
}

/// Handles the default mode: dispatcher plus HTTP façade until Ctrl-C
async fn handle_serve(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = config
        .server
        .bind_address
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind_address))?;

    let storage = Arc::new(SqliteStorage::new(Path::new(&config.database.path))?);
    tracing::info!("Opened database: {}", config.database.path);

    if config.worker.recover_pending {
        let recovered = storage.requeue_stranded()?;
        if recovered > 0 {
            tracing::info!("Re-queued {} records left pending by a previous run", recovered);
        }
    }

    let dispatcher = spawn_dispatcher(Arc::clone(&storage), &config)?;

    let state = AppState::new(storage, &config.server)?;
    let result = serve(state, addr, shutdown_signal()).await;

    tracing::info!("Waiting for the dispatcher to finish its current record");
    dispatcher.shutdown().await?;

    result?;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl-C, shutting down"),
        Err(e) => tracing::error!("Failed to listen for Ctrl-C: {}", e),
    }
}
