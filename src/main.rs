//! Linkshell-Harvest main entry point
//!
//! This is the command-line interface for the Linkshell-Harvest roster dumper.

use clap::Parser;
use linkshell_harvest::config::{load_config_with_hash, validate, Config};
use linkshell_harvest::crawler::crawl;
use linkshell_harvest::SearchRequest;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Linkshell-Harvest: dump linkshell rosters from the Lodestone
///
/// Searches the linkshell directory for a term, looks up every linkshell
/// found and appends one CSV row per member. Requests are spread randomly
/// over time so the directory does not start refusing them.
#[derive(Parser, Debug)]
#[command(name = "linkshell-harvest")]
#[command(version)]
#[command(about = "Dump linkshell rosters from the Lodestone", long_about = None)]
struct Cli {
    /// Search term, e.g. "Hunt"
    #[arg(value_name = "TERM")]
    term: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// World to search (overrides the configuration)
    #[arg(long)]
    server: Option<String>,

    /// CSV file to append rows to (overrides the configuration)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Look up only the first linkshell found
    #[arg(long)]
    single_shot: bool,

    /// Debug run: single-shot with debug logging
    ///
    /// Any value of `DEBUG` other than an empty string, 0, false, no, off, n
    /// or f switches it on.
    #[arg(long, env = "DEBUG", value_parser = clap::builder::FalseyValueParser::new())]
    debug: bool,

    /// Cap on requests running at the same time
    #[arg(long, value_name = "N")]
    max_in_flight: Option<u32>,

    /// Dispatch every request immediately instead of spreading them
    #[arg(long)]
    no_spread: bool,

    /// Validate config and show what would be searched without sending requests
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(if cli.debug { cli.verbose.max(1) } else { cli.verbose }, cli.quiet);

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    if cli.dry_run {
        handle_dry_run(&config, &cli.term);
        return Ok(());
    }

    handle_crawl(&config, &cli.term).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("linkshell_harvest=info,warn"),
            1 => EnvFilter::new("linkshell_harvest=debug,info"),
            _ => EnvFilter::new("linkshell_harvest=trace,debug"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file, if any, and applies command-line overrides
fn resolve_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(server) = &cli.server {
        config.directory.server = server.clone();
    }
    if let Some(output) = &cli.output {
        config.output.csv_path = output.display().to_string();
    }
    if cli.single_shot || cli.debug {
        config.crawler.single_shot = true;
    }
    if let Some(limit) = cli.max_in_flight {
        config.crawler.max_in_flight = Some(limit);
    }
    if cli.no_spread {
        config.crawler.spread_window_ms = 0;
        config.crawler.min_delay_ms = 0;
    }

    validate(&config)?;
    Ok(config)
}

/// Handles the --dry-run mode: shows what would be searched
fn handle_dry_run(config: &Config, term: &str) {
    let request = SearchRequest::new(term, config.directory.server.clone());

    println!("=== Linkshell-Harvest Dry Run ===\n");

    println!("Search:");
    println!("  Term: {}", request.term);
    println!("  World: {}", request.server);
    println!(
        "  URL: {}{}",
        config.directory.base_url.trim_end_matches('/'),
        request.locator(&config.directory.search_path)
    );

    println!("\nPacing:");
    println!(
        "  Delay per request: {}ms + up to {}ms",
        config.crawler.min_delay_ms, config.crawler.spread_window_ms
    );
    match config.crawler.max_in_flight {
        Some(limit) => println!("  Max in flight: {}", limit),
        None => println!("  Max in flight: unlimited"),
    }
    println!("  Members per page: {}", config.crawler.member_page_size);
    println!("  Single-shot: {}", config.crawler.single_shot);

    println!("\nOutput:");
    println!("  CSV: {}", config.output.csv_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, term: &str) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Harvesting linkshells matching '{}' on {} into {}",
        term,
        config.directory.server,
        config.output.csv_path
    );
    if config.crawler.single_shot {
        tracing::info!("Single-shot mode: only the first linkshell will be looked up");
    }

    match crawl(config, term).await {
        Ok(report) => {
            report.log();
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
