//! Cedi Search main entry point
//!
//! This is the command-line interface for the product catalog pipeline.

use anyhow::Context;
use cedi_search::config::{load_config_with_hash, Config};
use cedi_search::output::{load_statistics, print_statistics};
use cedi_search::sources::SourceRegistry;
use cedi_search::storage::open_storage;
use cedi_search::Orchestrator;
use clap::Parser;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Cedi Search: a product catalog built from e-commerce listings
///
/// Cedi Search discovers product pages on each configured site, crawls them,
/// extracts product records and publishes them to the catalog and search
/// index. It runs until interrupted.
#[derive(Parser, Debug)]
#[command(name = "cedi-search")]
#[command(version)]
#[command(about = "Crawl, extract and index product listings", long_about = None)]
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

    /// Validate config and show the registered sources without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show per-source statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_run(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("cedi_search=info,warn"),
            1 => EnvFilter::new("cedi_search=debug,info"),
            2 => EnvFilter::new("cedi_search=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would run
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let registry = SourceRegistry::from_config(&config.sources)?;

    println!("=== Cedi Search Dry Run ===\n");

    println!("Crawler:");
    println!("  Batch size: {}", config.crawler.batch_size);
    println!("  Per-source sample: {}", config.crawler.per_source_sample);
    println!("  Max in flight: {}", config.crawler.max_in_flight);
    println!("  Cycle interval: {:?}", config.crawler.crawl_interval());
    println!("  Fetch timeout: {:?}", config.crawler.fetch_timeout());

    println!("\nIndexer:");
    println!("  Page size: {}", config.indexer.page_size);
    println!("  Idle interval: {:?}", config.indexer.idle_interval());

    println!("\nSniffer:");
    println!("  Max pages per category: {}", config.sniffer.max_pages);
    println!(
        "  Pause {:?} every {} pages",
        config.sniffer.pause(),
        config.sniffer.pause_every
    );
    println!("  Pass interval: {:?}", config.sniffer.pass_interval());

    println!("\nUser Agent: {}", config.user_agent.user_agent_string());
    println!("Database: {}", config.storage.database_path);

    match config.search_index.resolved_endpoint() {
        Some(endpoint) if config.search_index.is_enabled() => println!(
            "Search index: {} at {}",
            config.search_index.index_name, endpoint
        ),
        _ => println!("Search index: disabled (no credentials)"),
    }

    println!("\nSources ({}):", registry.len());
    for adapter in registry.adapters() {
        println!(
            "  - {} ({} categories)",
            adapter.name(),
            adapter.categories().len()
        );
        if let Some(first) = adapter.categories().first() {
            if let Ok(url) = adapter.page_url(first, 1) {
                println!("    * first listing page: {}", url);
            }
        }
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let storage = open_storage(Path::new(&config.storage.database_path))
        .context("Failed to open database")?;

    let sources: Vec<String> = config.sources.iter().map(|s| s.name.clone()).collect();
    let stats = load_statistics(&storage, &sources)?;

    print_statistics(&stats);

    Ok(())
}

/// Handles the main pipeline run
async fn handle_run(config: Config) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::new(config).context("Failed to start pipeline")?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received, finishing in-flight work");
                cancel.cancel();
            }
        });
    }

    orchestrator.run(cancel).await?;

    tracing::info!("Pipeline stopped");
    Ok(())
}
