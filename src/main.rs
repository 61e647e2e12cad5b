//! Photofeed main entry point
//!
//! This is the command-line interface for the Photofeed gallery crawler.

use anyhow::Context;
use clap::Parser;
use photofeed::cache::ResultCache;
use photofeed::config::{load_config_with_hash, Config};
use photofeed::crawler::crawl;
use photofeed::output::{compute_statistics, load_cache_entry, print_statistics, write_snapshot};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Photofeed: a resilient gallery feed over a WordPress REST API
///
/// Photofeed crawls every post of a WordPress site, picks one image per
/// post, sanitizes the post markup and either writes the result as a JSON
/// snapshot or serves a single page of it through the result cache.
#[derive(Parser, Debug)]
#[command(name = "photofeed")]
#[command(version)]
#[command(about = "A resilient gallery feed over a WordPress REST API", long_about = None)]
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

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["page", "snapshot"])]
    dry_run: bool,

    /// Serve one page through the result cache and print it as JSON
    #[arg(long, value_name = "N", conflicts_with_all = ["dry_run", "snapshot"])]
    page: Option<u32>,

    /// Page size for --page (defaults to the configured page size)
    #[arg(long, value_name = "SIZE", requires = "page")]
    page_size: Option<u32>,

    /// Seed the cache from the existing snapshot before serving --page
    #[arg(long, requires = "page")]
    warm: bool,

    /// Crawl everything and write the snapshot (default behavior)
    #[arg(long, conflicts_with_all = ["dry_run", "page"])]
    snapshot: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if let Some(page) = cli.page {
        handle_page(&config, page, cli.page_size, cli.warm).await?;
    } else {
        handle_snapshot(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("photofeed=info,warn"),
            1 => EnvFilter::new("photofeed=debug,info"),
            2 => EnvFilter::new("photofeed=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Photofeed Dry Run ===\n");

    println!("Upstream:");
    println!("  Base URL: {}", config.upstream.base_url);
    println!("  Posts per page: {}", config.upstream.per_page);

    println!("\nFetching:");
    println!("  Timeout: {}ms", config.fetch.timeout_ms);
    println!("  Max attempts: {}", config.fetch.max_attempts);
    println!("  Base retry delay: {}ms", config.fetch.base_delay_ms);
    println!("  Delay between pages: {}ms", config.crawler.page_delay_ms);

    println!("\nCache:");
    println!("  TTL: {}s", config.cache.ttl_seconds);
    println!("  Page size: {}", config.cache.page_size);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Snapshot: {}", config.output.snapshot_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the --page mode: serves one page through the result cache
async fn handle_page(
    config: &Config,
    page: u32,
    page_size: Option<u32>,
    warm: bool,
) -> anyhow::Result<()> {
    let cache = ResultCache::from_config(config).context("Failed to build result cache")?;

    if warm {
        let path = Path::new(&config.output.snapshot_path);
        match load_cache_entry(path) {
            Ok(entry) => cache.seed(entry).await,
            Err(e) => tracing::warn!("Could not seed cache from {}: {}", path.display(), e),
        }
    }

    let result = cache.get_page_numbered(page, page_size).await;
    tracing::info!(
        "Page {}/{} with {} of {} items",
        result.current_page,
        result.total_pages,
        result.items.len(),
        result.total_items
    );

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Handles the main snapshot operation
async fn handle_snapshot(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Starting crawl of {}", config.upstream.base_url);

    let (aggregate, report) = match crawl(config).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    if report.stopped_early {
        tracing::warn!("Crawl stopped early; the snapshot may be incomplete");
    }

    let path = Path::new(&config.output.snapshot_path);
    write_snapshot(&aggregate, path)
        .with_context(|| format!("Failed to write snapshot to {}", path.display()))?;

    println!("✓ Snapshot written to: {}\n", path.display());
    print_statistics(&compute_statistics(&aggregate));

    Ok(())
}
