// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Build the immutable configuration and set up logging
// 3. Load the offline host list (if one was given)
// 4. Run the mirror and print the report
// 5. Exit with proper code (0 = all good, 1 = some URLs failed, 2 = error)
// =============================================================================

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use site_mirror::cli::Cli;
use site_mirror::crawl::{CrawlReport, DiskStore, Fetcher, HttpFetcher, Mirror};
use site_mirror::logging::init_logging;
use site_mirror::offline::{load_offline_hosts, OfflineHosts};
use site_mirror::MirrorConfig;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = every URL was stored, skipped or rejected
//   Ok(1) = at least one URL failed
//   Err   = the crawl could not run at all
async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = Arc::new(MirrorConfig::from_cli(&cli));

    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(
        &config.user_agent,
        config.timeout,
        config.max_body_bytes,
    )?);
    let store = Arc::new(DiskStore::new(&config.output_dir));

    let offline = match &config.offline_source {
        Some(source) => {
            let hosts = load_offline_hosts(source, fetcher.as_ref()).await?;
            info!(source = %source, hosts = hosts.len(), "loaded offline hosts");
            hosts
        }
        None => OfflineHosts::default(),
    };

    let report = Mirror::new(Arc::clone(&config), fetcher, store, offline)
        .run()
        .await?;

    print_report(&report, cli.json)?;

    if report.failed > 0 {
        Ok(1)
    } else {
        Ok(0)
    }
}

// Prints the report either as a summary or as JSON
fn print_report(report: &CrawlReport, json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(report)?;
        println!("{}", json_output);
        return Ok(());
    }

    println!("📊 Summary:");
    println!("   💾 Stored: {}", report.stored);
    println!("   🚫 Rejected: {}", report.rejected);
    println!("   ⏭️  Skipped: {}", report.skipped);
    println!("   ❌ Failed: {}", report.failed);
    if report.retried > 0 {
        println!("   🔁 Retried: {}", report.retried);
    }
    if report.dropped > 0 {
        println!("   🗑️  Unusable links: {}", report.dropped);
    }
    println!("   📋 Total: {}", report.total());

    if !report.failures.is_empty() {
        println!();
        println!("{:<70} {}", "FAILED URL", "ERROR");
        println!("{}", "=".repeat(100));
        for failure in &report.failures {
            let url_display = if failure.url.chars().count() > 67 {
                format!("{}...", failure.url.chars().take(67).collect::<String>())
            } else {
                failure.url.clone()
            };
            println!("{:<70} {}", url_display, failure.error);
        }
    }

    Ok(())
}
