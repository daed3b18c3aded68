// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments (and INPUT_* environment variables)
// 2. Set up logging to stderr, so stdout stays clean for the report
// 3. Crawl the site, stopping early on Ctrl-C
// 4. Print the report and write the CI output file
// 5. Exit with proper code (0 = success, 1 = broken links, 2 = error)
//
// Rust concepts used:
// - async/await: the crawler makes many network requests concurrently
// - anyhow::Result + Context: any fatal error becomes exit code 2
// - CancellationToken: shared "please stop" flag between Ctrl-C and crawl
// =============================================================================

mod cli;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use broken_link_crawler::report::{print_report, write_output_time};
use broken_link_crawler::Crawler;
use cli::Cli;

// The #[tokio::main] attribute transforms our async main into a real main function
#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = no broken links
//   Ok(1) = broken links found
//   Err = configuration or output error (exit code 2)
async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.build_config().context("invalid configuration")?;
    let crawler = Crawler::new(config).context("failed to set up the crawler")?;

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, finishing with a partial report");
            on_ctrl_c.cancel();
        }
    });

    info!(seed = %crawler.config().seed_url, "🔍 Scanning website");
    let report = crawler.run_with_cancellation(cancel).await;

    print_report(&report, cli.json).context("failed to print report")?;

    if let Some(path) = std::env::var_os("GITHUB_OUTPUT").map(PathBuf::from) {
        write_output_time(&path, &report)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    Ok(report.verdict().exit_code())
}

// Logs go to stderr. RUST_LOG wins when set, otherwise --verbose picks the level.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("broken_link_crawler={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why std::process::exit instead of returning from main?
//    - CI only looks at the exit code, and we need three different ones
//
// 2. Why is Ctrl-C handled in a spawned task?
//    - tokio::signal::ctrl_c() is a future that completes on the signal
//    - Running it in its own task lets the crawl keep going until it fires
//
// 3. Why stderr for logs?
//    - `broken-link-crawler --json > report.json` should produce valid JSON
// -----------------------------------------------------------------------------
