//! Newsreap main entry point
//!
//! This is the command-line interface for the Newsreap article crawler.

use anyhow::Context;
use clap::Parser;
use newsreap::config::{load_config_with_hash, CrawlConfig};
use newsreap::crawler::{build_http_client, SessionLauncher};
use newsreap::pipeline::Pipeline;
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Newsreap: a single-site news crawler
///
/// Newsreap expands the site's news feed, collects up to the configured
/// number of article links, and stores each article as a raw text file plus
/// a JSON metadata file.
#[derive(Parser, Debug)]
#[command(name = "newsreap")]
#[command(version = "1.0.0")]
#[command(about = "A single-site news crawler and article extractor", long_about = None)]
struct Cli {
    /// Path to the JSON (or TOML) crawl descriptor
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Directory that receives the articles (wiped before each run)
    #[arg(short, long, value_name = "DIR", default_value = "tmp/articles")]
    output: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e).context("invalid crawl configuration");
        }
    };

    if cli.dry_run {
        handle_dry_run(&config, &cli.output);
        return Ok(());
    }

    let client = build_http_client(&config).context("failed to build HTTP client")?;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current request");
            trigger.cancel();
        }
    });

    handle_crawl(config, client, cancel, config_hash, cli.output).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("newsreap=info,warn"),
            1 => EnvFilter::new("newsreap=debug,info"),
            2 => EnvFilter::new("newsreap=trace,debug"),
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

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &CrawlConfig, output: &std::path::Path) {
    println!("=== Newsreap Dry Run ===\n");

    println!("Seeds ({}):", config.seed_urls.len());
    for seed in &config.seed_urls {
        println!("  * {}", seed);
    }

    println!("\nFeed:");
    println!(
        "  Landing page: {}",
        config.landing_url().unwrap_or_else(|| "-".to_string())
    );
    println!("  Preview selector: {}", config.site.preview);
    println!("  Reveal control: {}", config.site.reveal_control);
    println!(
        "  Pause between reveals: {}-{}s",
        config.pagination.min_pause_secs, config.pagination.max_pause_secs
    );
    println!("  Headless: {}", config.headless_mode);

    println!("\nRequests:");
    println!("  Articles: {}", config.total_articles);
    println!("  Timeout: {}s", config.timeout);
    println!("  Encoding: {}", config.encoding);
    println!("  Verify certificates: {}", config.should_verify_certificate);
    println!("  Retries: {}", config.retry.max_attempts);
    println!("  Concurrency: {}", config.concurrency);

    println!("\nOutput: {}", output.display());

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: CrawlConfig,
    client: Client,
    cancel: CancellationToken,
    config_hash: String,
    output: PathBuf,
) -> anyhow::Result<()> {
    tracing::info!(
        "Seeds: {}, articles requested: {}",
        config.seed_urls.len(),
        config.total_articles
    );

    #[cfg(feature = "browser")]
    let launcher =
        newsreap::crawler::ChromeLauncher::new(config.headless_mode, config.request_timeout());

    #[cfg(not(feature = "browser"))]
    let launcher = {
        if !config.headless_mode {
            tracing::warn!("Built without the `browser` feature; headless_mode has no effect");
        }
        newsreap::crawler::HttpLauncher::new(client.clone(), config.encoding.clone())
    };

    run_pipeline(Arc::new(config), client, launcher, cancel, config_hash, output).await
}

async fn run_pipeline<L: SessionLauncher>(
    config: Arc<CrawlConfig>,
    client: Client,
    launcher: L,
    cancel: CancellationToken,
    config_hash: String,
    output: PathBuf,
) -> anyhow::Result<()> {
    let summary = Pipeline::new(config, client, launcher, cancel)
        .with_config_hash(config_hash)
        .run_to_directory(&output)
        .await
        .map_err(|e| {
            tracing::error!("Crawl failed: {}", e);
            e
        })?;

    tracing::info!(
        "Crawl completed: {} stored, {} failed, output in {}",
        summary.articles_stored(),
        summary.failures.len(),
        output.display()
    );

    Ok(())
}
