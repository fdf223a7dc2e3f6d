//! Data models for catalogued tools, scrape results, and run logs.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Tool`] / [`NewTool`]: persisted catalog rows and their insert shape
//! - [`Category`]: seeded reference rows for the fixed taxonomy
//! - [`Classification`]: transient output of the classification stage
//! - [`ScrapeResults`], [`ScraperOutcome`], [`RunSummary`]: per-scraper and
//!   per-run accounting, persisted as a [`RunLog`] row after each orchestration

use serde::{Deserialize, Serialize};

/// A catalogued AI tool as stored in the `tools` table.
///
/// Rows are created only by scrapers after passing deduplication and
/// classification; the core pipeline never updates or deletes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Store-assigned row id.
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Canonical (normalized) URL of the tool.
    pub url: String,
    /// One of the fixed taxonomy categories, or "Other".
    pub category: String,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    /// Release date in `YYYY-MM-DD` form, when the source provides one.
    pub release_date: Option<String>,
    /// Human-readable origin, e.g. "GitHub" or "Reddit r/artificial".
    pub source: String,
    /// RFC 3339 timestamp assigned at insert.
    pub created_at: String,
    pub updated_at: String,
}

/// Insert shape for a tool: everything except the store-assigned fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTool {
    pub name: String,
    pub description: Option<String>,
    pub url: String,
    pub category: String,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub release_date: Option<String>,
    pub source: String,
}

/// A taxonomy category. Seed data only; the pipeline never writes these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

/// Aggregate catalog counters for the `stats` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformStats {
    pub total_tools: i64,
    pub total_categories: i64,
    pub new_today: i64,
    pub total_tags: i64,
}

/// Result of classifying one candidate item.
///
/// Produced either by the external LLM call (strict JSON contract) or by the
/// heuristic fallback; consumed immediately by the calling scraper and never
/// persisted. All extraction fields are optional so a bare `is_tool: false`
/// response deserializes cleanly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Classification {
    pub is_tool: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Per-scraper item accounting. Every scraper returns one of these.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrapeResults {
    /// Raw items fetched from the source before filtering.
    pub total: usize,
    pub added: usize,
    pub duplicates: usize,
    pub errors: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors_detail: Vec<String>,
}

impl ScrapeResults {
    /// Record a per-item failure without aborting the run.
    pub fn record_error(&mut self, detail: impl Into<String>) {
        self.errors += 1;
        self.errors_detail.push(detail.into());
    }
}

/// Outcome of one scraper within an orchestration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperOutcome {
    pub scraper: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<ScrapeResults>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Aggregate counters for one orchestration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_duration_ms: u64,
    pub scrapers_run: usize,
    pub scrapers_successful: usize,
    pub scrapers_failed: usize,
    pub total_tools_added: usize,
    pub total_duplicates: usize,
    pub total_errors: usize,
}

/// A persisted record of one orchestration run. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLog {
    pub id: i64,
    pub run_date: String,
    pub summary: RunSummary,
    pub details: Vec<ScraperOutcome>,
    pub created_at: String,
}
