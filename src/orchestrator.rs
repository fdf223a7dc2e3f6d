//! Fan-out/fan-in execution of all registered scrapers.
//!
//! Scrapers run fully in parallel (the sequential-with-delay discipline this
//! replaced traded latency for rate-limit courtesy; the shared APIs tolerate
//! one burst per run). A failing scraper never affects its siblings: each
//! outcome is captured independently, summarized, and persisted as one
//! run log row. Run-log persistence is best-effort telemetry; a failed
//! insert is logged and swallowed because the run itself already happened.

use crate::models::{RunSummary, ScrapeResults, ScraperOutcome};
use crate::scrapers::{self, ScrapeContext, SCRAPER_NAMES};
use crate::store::Store;
use chrono::Utc;
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument};

/// A named scraper invocation, boxed so stubs can stand in during tests.
pub type ScraperJob = (String, BoxFuture<'static, anyhow::Result<ScrapeResults>>);

/// The aggregate of one orchestration run, returned to the caller and
/// persisted (minus the id/created_at the store assigns) as a run log.
#[derive(Debug)]
pub struct RunReport {
    pub summary: RunSummary,
    pub results: Vec<ScraperOutcome>,
}

/// Run every registered scraper in parallel and persist one run log.
#[instrument(level = "info", skip_all)]
pub async fn run_all(ctx: Arc<ScrapeContext>) -> RunReport {
    let jobs: Vec<ScraperJob> = SCRAPER_NAMES
        .iter()
        .map(|name| {
            let ctx = Arc::clone(&ctx);
            let scraper_name = name.to_string();
            let fut = async move { scrapers::run_by_name(&scraper_name, &ctx).await }.boxed();
            (name.to_string(), fut)
        })
        .collect();

    let report = execute(jobs).await;
    persist_run_log(&ctx.store, &report);
    report
}

/// Run a single scraper by registry name, still recording a run log.
#[instrument(level = "info", skip(ctx))]
pub async fn run_one(ctx: Arc<ScrapeContext>, name: &str) -> anyhow::Result<RunReport> {
    if !SCRAPER_NAMES.contains(&name) {
        anyhow::bail!(
            "Unknown scraper '{}'. Known scrapers: {}",
            name,
            SCRAPER_NAMES.join(", ")
        );
    }

    let job_ctx = Arc::clone(&ctx);
    let scraper_name = name.to_string();
    let fut = async move { scrapers::run_by_name(&scraper_name, &job_ctx).await }.boxed();

    let report = execute(vec![(name.to_string(), fut)]).await;
    persist_run_log(&ctx.store, &report);
    Ok(report)
}

/// Await all jobs concurrently and fold their outcomes into a summary.
/// Split out from [`run_all`] so tests can drive stub outcomes.
pub async fn execute(jobs: Vec<ScraperJob>) -> RunReport {
    let start = Instant::now();
    info!(count = jobs.len(), "Starting parallel scraper run");

    let outcome_futures = jobs.into_iter().map(|(name, fut)| async move {
        let job_start = Instant::now();
        match fut.await {
            Ok(results) => {
                info!(scraper = %name, added = results.added, "Scraper succeeded");
                ScraperOutcome {
                    scraper: name,
                    success: true,
                    results: Some(results),
                    error: None,
                    duration_ms: job_start.elapsed().as_millis() as u64,
                }
            }
            Err(e) => {
                error!(scraper = %name, error = %e, "Scraper failed");
                ScraperOutcome {
                    scraper: name,
                    success: false,
                    results: None,
                    error: Some(e.to_string()),
                    duration_ms: job_start.elapsed().as_millis() as u64,
                }
            }
        }
    });

    let results: Vec<ScraperOutcome> = join_all(outcome_futures).await;
    let summary = summarize(&results, start.elapsed().as_millis() as u64);

    info!(
        successful = summary.scrapers_successful,
        failed = summary.scrapers_failed,
        added = summary.total_tools_added,
        "Scraper run complete"
    );

    RunReport { summary, results }
}

fn summarize(results: &[ScraperOutcome], total_duration_ms: u64) -> RunSummary {
    let payload = |f: fn(&ScrapeResults) -> usize| -> usize {
        results
            .iter()
            .filter_map(|r| r.results.as_ref())
            .map(f)
            .sum()
    };

    RunSummary {
        total_duration_ms,
        scrapers_run: results.len(),
        scrapers_successful: results.iter().filter(|r| r.success).count(),
        scrapers_failed: results.iter().filter(|r| !r.success).count(),
        total_tools_added: payload(|r| r.added),
        total_duplicates: payload(|r| r.duplicates),
        total_errors: payload(|r| r.errors),
    }
}

fn persist_run_log(store: &Store, report: &RunReport) {
    let run_date = Utc::now().to_rfc3339();
    if let Err(e) = store.insert_run_log(&run_date, &report.summary, &report.results) {
        error!(error = %e, "Failed to persist run log");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_job(name: &str, added: usize, duplicates: usize, errors: usize) -> ScraperJob {
        let results = ScrapeResults {
            total: added + duplicates,
            added,
            duplicates,
            errors,
            ..Default::default()
        };
        (name.to_string(), async move { Ok(results) }.boxed())
    }

    fn failing_job(name: &str) -> ScraperJob {
        (
            name.to_string(),
            async { Err(anyhow::anyhow!("connection refused")) }.boxed(),
        )
    }

    #[tokio::test]
    async fn three_of_eight_failing_scrapers_are_summarized() {
        let jobs = vec![
            ok_job("A", 2, 1, 0),
            ok_job("B", 1, 0, 1),
            failing_job("C"),
            ok_job("D", 0, 3, 0),
            failing_job("E"),
            ok_job("F", 4, 0, 0),
            failing_job("G"),
            ok_job("H", 0, 0, 0),
        ];

        let report = execute(jobs).await;
        assert_eq!(report.summary.scrapers_run, 8);
        assert_eq!(report.summary.scrapers_successful, 5);
        assert_eq!(report.summary.scrapers_failed, 3);
        assert_eq!(report.summary.total_tools_added, 7);
        assert_eq!(report.summary.total_duplicates, 4);
        assert_eq!(report.summary.total_errors, 1);
        assert_eq!(report.results.len(), 8);

        let failed = report.results.iter().find(|r| r.scraper == "C").unwrap();
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("connection refused"));
        assert!(failed.results.is_none());

        let store = crate::store::Store::open_in_memory().unwrap();
        store.init_schema().unwrap();
        persist_run_log(&store, &report);

        let logs = store.latest_run_logs(5).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].details.len(), 8);
        assert_eq!(logs[0].summary.scrapers_failed, 3);
    }

    #[tokio::test]
    async fn outcomes_preserve_registration_order() {
        let jobs = vec![ok_job("First", 0, 0, 0), failing_job("Second"), ok_job("Third", 1, 0, 0)];
        let report = execute(jobs).await;
        let names: Vec<_> = report.results.iter().map(|r| r.scraper.clone()).collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
    }
}
