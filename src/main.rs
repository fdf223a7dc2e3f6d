//! # AI Tool Scout
//!
//! An AI-tool discovery pipeline that scrapes announcements from eight
//! public sources, classifies candidates as tools, deduplicates them against
//! the catalog, and stores accepted tools in SQLite alongside a log of every
//! run.
//!
//! ## Features
//!
//! - Scrapes ProductHunt, Hacker News, GitHub, YouTube, AI news RSS feeds,
//!   Dev.to, Hugging Face Spaces, and Reddit
//! - Classifies candidates with Gemini when an API key is configured, with a
//!   keyword heuristic fallback that also serves sources on its own
//! - Three-step deduplication: exact URL, fuzzy name similarity, and
//!   same-domain-plus-similar-name
//! - Read commands for browsing the catalog and its run history: list, show,
//!   categories, tags, platform statistics, and recent run logs
//!
//! ## Usage
//!
//! ```sh
//! ai_tool_scout run
//! ai_tool_scout list --search "image"
//! ```
//!
//! ## Architecture
//!
//! The `run` command fans out to every scraper in parallel; each scraper
//! fetches, pre-filters, classifies, deduplicates, and inserts independently,
//! so one failing source never blocks the rest. The aggregate outcome is
//! persisted as a run log row.

use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod classify;
mod cli;
mod dedup;
mod models;
mod orchestrator;
mod retry;
mod scrapers;
mod store;

use classify::Classifier;
use cli::{Cli, Command};
use orchestrator::RunReport;
use scrapers::{Credentials, ScrapeContext};
use store::{Store, ToolFilters};

#[tokio::main]
async fn main() {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();

    if let Err(e) = run(args).await {
        let envelope = serde_json::json!({ "success": false, "error": e.to_string() });
        println!("{envelope}");
        std::process::exit(1);
    }
}

async fn run(args: Cli) -> anyhow::Result<()> {
    debug!(db = %args.db, "Parsed CLI arguments");

    let store = Store::open(Path::new(&args.db))?;
    store.init_schema()?;

    match args.command {
        Command::Run { scraper } => {
            let classifier = Classifier::new(
                args.gemini_api_key.clone(),
                reqwest::Client::new(),
            );
            let creds = Credentials {
                github_token: args.github_token.clone(),
                producthunt_token: args.producthunt_token.clone(),
                youtube_api_key: args.youtube_api_key.clone(),
                reddit_client_id: args.reddit_client_id.clone(),
                reddit_client_secret: args.reddit_client_secret.clone(),
            };
            let ctx = Arc::new(ScrapeContext::new(store, classifier, creds));

            info!("Tool scout starting up");
            let report = match scraper {
                Some(name) => orchestrator::run_one(ctx, &name).await?,
                None => orchestrator::run_all(ctx).await,
            };
            print_run_report(&report)?;
        }
        Command::List {
            page,
            category,
            search,
            tag,
        } => {
            let filters = ToolFilters {
                category,
                search,
                tags: tag,
            };
            // the store's page index is zero-based
            let tools = store.get_tools((page - 1).max(0), &filters)?;
            println!("{}", serde_json::to_string_pretty(&tools)?);
        }
        Command::Show { id } => match store.get_tool_by_id(id)? {
            Some(tool) => println!("{}", serde_json::to_string_pretty(&tool)?),
            None => anyhow::bail!("No tool with id {id}"),
        },
        Command::Logs { limit } => {
            let logs = store.latest_run_logs(limit)?;
            println!("{}", serde_json::to_string_pretty(&logs)?);
        }
        Command::Categories => {
            let categories = store.get_categories()?;
            println!("{}", serde_json::to_string_pretty(&categories)?);
        }
        Command::Tags => {
            let tags = store.get_all_tags()?;
            println!("{}", serde_json::to_string_pretty(&tags)?);
        }
        Command::Stats => {
            let stats = store.get_platform_stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

fn print_run_report(report: &RunReport) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&run_envelope(report))?);
    Ok(())
}

/// A completed run is a success even when individual scrapers failed; the
/// per-scraper flags and summary counters carry that detail. `success: false`
/// is reserved for the error envelope on unhandled failures.
fn run_envelope(report: &RunReport) -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "summary": report.summary,
        "results": report.results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RunSummary, ScraperOutcome};

    #[test]
    fn completed_run_with_failing_scrapers_is_still_a_success() {
        let report = RunReport {
            summary: RunSummary {
                total_duration_ms: 10,
                scrapers_run: 2,
                scrapers_successful: 1,
                scrapers_failed: 1,
                total_tools_added: 3,
                total_duplicates: 0,
                total_errors: 0,
            },
            results: vec![
                ScraperOutcome {
                    scraper: "GitHub".to_string(),
                    success: true,
                    results: None,
                    error: None,
                    duration_ms: 5,
                },
                ScraperOutcome {
                    scraper: "ProductHunt".to_string(),
                    success: false,
                    results: None,
                    error: Some("ProductHunt API token not configured".to_string()),
                    duration_ms: 1,
                },
            ],
        };

        let envelope = run_envelope(&report);
        assert_eq!(envelope["success"], true);
        assert_eq!(envelope["summary"]["scrapers_failed"], 1);
        assert_eq!(envelope["results"][1]["success"], false);
    }
}
