//! Seoscope main entry point
//!
//! Command-line interface for the Seoscope site crawler.

use anyhow::Context;
use clap::Parser;
use seoscope::config::{load_config_with_hash, Config, CrawlOptions};
use seoscope::crawler::{Coordinator, LogSink};
use seoscope::storage::SqliteStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Seoscope: a budgeted, polite SEO site crawler
///
/// Crawls a website under a URL and depth budget, discovering work from
/// sitemaps and in-page links, respecting robots.txt and rate limits, and
/// reporting duplicate content and canonical inconsistencies.
#[derive(Parser, Debug)]
#[command(name = "seoscope")]
#[command(version)]
#[command(about = "A budgeted, polite SEO site crawler", long_about = None)]
struct Cli {
    /// The URL to start crawling from
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum number of URLs to process
    #[arg(long)]
    url_limit: Option<usize>,

    /// Maximum crawl depth
    #[arg(long)]
    depth_limit: Option<u32>,

    /// Follow links to other hosts
    #[arg(long)]
    follow_external: bool,

    /// Skip sitemap discovery during seeding
    #[arg(long)]
    no_sitemap: bool,

    /// Crawl exactly the URLs in this file (one per line), no discovery
    #[arg(long, value_name = "FILE")]
    url_list: Option<PathBuf>,

    /// Crawl a local directory tree instead of fetching pages
    #[arg(long, value_name = "PATH")]
    directory_tree: Option<String>,

    /// Exclusion pattern (substring), repeatable
    #[arg(long, value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Inclusion pattern (substring), repeatable
    #[arg(long, value_name = "PATTERN")]
    include: Vec<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?;
            tracing::info!("Configuration loaded (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    let store = Arc::new(
        SqliteStore::new(Path::new(&config.output.database_path))
            .with_context(|| format!("failed to open database {}", config.output.database_path))?,
    );

    let coordinator = Coordinator::new(config, store, Arc::new(LogSink))?;

    for pattern in &cli.include {
        coordinator.filter().add_inclusion_rule(pattern, false)?;
    }
    for pattern in &cli.exclude {
        coordinator.filter().add_exclusion_rule(pattern, false)?;
    }

    let options = build_options(&cli)?;
    let report = coordinator.crawl_website(&cli.url, &options).await?;

    println!("Crawl session: {}", report.crawling_id);
    println!("Pages processed: {}", report.pages_processed);
    if !report.average_scores.is_empty() {
        println!("Average scores:");
        for (name, value) in &report.average_scores {
            println!("  {:<18} {:>6.1}", name, value);
        }
    }
    if report.canonical_consistency.is_consistent {
        println!("Canonical tags: consistent");
    } else {
        println!(
            "Canonical tags: {} inconsistent group(s)",
            report.canonical_consistency.inconsistencies.len()
        );
        for group in &report.canonical_consistency.inconsistencies {
            println!(
                "  {} <- {}",
                group.canonical_url,
                group.conflicting_urls.join(", ")
            );
        }
    }

    Ok(())
}

/// Builds per-crawl options from the CLI flags
fn build_options(cli: &Cli) -> anyhow::Result<CrawlOptions> {
    let specific_url_list = match &cli.url_list {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read URL list {}", path.display()))?
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    };

    Ok(CrawlOptions {
        url_limit: cli.url_limit,
        depth_limit: cli.depth_limit,
        follow_internal_links: None,
        follow_external_links: cli.follow_external.then_some(true),
        follow_subfolder_links: None,
        specific_url_list,
        use_directory_tree_crawling: cli.directory_tree.is_some(),
        directory_tree_root_path: cli.directory_tree.clone(),
        custom_starting_points: Vec::new(),
        sitemap_enabled: cli.no_sitemap.then_some(false),
    })
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("seoscope=info,warn"),
            1 => EnvFilter::new("seoscope=debug,info"),
            2 => EnvFilter::new("seoscope=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
