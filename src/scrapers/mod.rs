//! Source scrapers feeding the catalog ingestion pipeline.
//!
//! Each submodule adapts one external API or feed and follows the same shape:
//!
//! 1. Fetch raw items (via the retry helper where the source is flaky)
//! 2. Apply a cheap source-specific pre-filter (recency, keywords, link check)
//! 3. Extract a best-effort URL for the prospective tool
//! 4. Check the deduplication engine with the raw identity
//! 5. Classify, skip non-tools, and insert accepted candidates
//! 6. Accumulate `{total, added, duplicates, errors}`, continuing past
//!    per-item failures
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Pre-filter |
//! |--------|--------|--------|------------|
//! | GitHub | [`github`] | Search API | `topic:ai`, created <48h |
//! | Hacker News | [`hackernews`] | Firebase API | "Show HN" with external URL |
//! | Reddit | [`reddit`] | OAuth/public JSON | announcement keywords, external link |
//! | RSS feeds | [`rss`] | XML feeds | launch keywords, article link scan |
//! | Dev.to | [`devto`] | Articles API | published <48h, toolish keywords |
//! | Hugging Face | [`huggingface`] | Spaces API | modified <7d, like-gated |
//! | ProductHunt | [`producthunt`] | GraphQL | AI-relatedness keywords |
//! | YouTube | [`youtube`] | Data API | published <24h, description link |

use crate::classify::Classifier;
use crate::models::ScrapeResults;
use crate::store::Store;
use once_cell::sync::Lazy;
use regex::Regex;

pub mod devto;
pub mod github;
pub mod hackernews;
pub mod huggingface;
pub mod producthunt;
pub mod reddit;
pub mod rss;
pub mod youtube;

/// Registered scrapers, in orchestration order.
pub const SCRAPER_NAMES: &[&str] = &[
    "ProductHunt",
    "Hacker News",
    "GitHub",
    "YouTube",
    "RSS Feeds",
    "Dev.to",
    "Hugging Face",
    "Reddit",
];

/// Credentials for sources that need them, all optional unless the scraper
/// states otherwise.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub github_token: Option<String>,
    pub producthunt_token: Option<String>,
    pub youtube_api_key: Option<String>,
    pub reddit_client_id: Option<String>,
    pub reddit_client_secret: Option<String>,
}

/// Shared dependencies handed to every scraper.
pub struct ScrapeContext {
    pub store: Store,
    pub classifier: Classifier,
    pub http: reqwest::Client,
    pub creds: Credentials,
}

impl ScrapeContext {
    pub fn new(store: Store, classifier: Classifier, creds: Credentials) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("ai-tool-scout/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self {
            store,
            classifier,
            http,
            creds,
        }
    }
}

/// Run one scraper by its registry name.
pub async fn run_by_name(name: &str, ctx: &ScrapeContext) -> anyhow::Result<ScrapeResults> {
    match name {
        "ProductHunt" => producthunt::scrape(ctx).await,
        "Hacker News" => hackernews::scrape(ctx).await,
        "GitHub" => github::scrape(ctx).await,
        "YouTube" => youtube::scrape(ctx).await,
        "RSS Feeds" => rss::scrape(ctx).await,
        "Dev.to" => devto::scrape(ctx).await,
        "Hugging Face" => huggingface::scrape(ctx).await,
        "Reddit" => reddit::scrape(ctx).await,
        other => anyhow::bail!("Unknown scraper: {other}"),
    }
}

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s"'<>\)\]]+"#).expect("valid URL regex"));

/// Find the first URL in `text` whose string contains none of the excluded
/// domain fragments. Sources use this to skip their own links and known
/// social/news domains when hunting for the actual tool URL.
pub(crate) fn first_external_link(text: &str, excluded: &[&str]) -> Option<String> {
    URL_RE
        .find_iter(text)
        .map(|m| m.as_str())
        .find(|url| !excluded.iter().any(|d| url.contains(d)))
        .map(|url| url.trim_end_matches(&['.', ',', ';'][..]).to_string())
}

/// What became of one candidate item, used to tally [`ScrapeResults`].
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ItemOutcome {
    Added,
    Duplicate,
    /// Pre-filter or classifier rejected the item; not an error.
    Skipped,
}

impl ScrapeResults {
    pub(crate) fn tally(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Added => self.added += 1,
            ItemOutcome::Duplicate => self.duplicates += 1,
            ItemOutcome::Skipped => {}
        }
    }
}

/// Order-preserving tag dedup with a cap.
pub(crate) fn merge_tags(tags: Vec<String>, cap: usize) -> Vec<String> {
    use itertools::Itertools;
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unique()
        .take(cap)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_external_link_skips_excluded_domains() {
        let text = "watch https://youtube.com/watch?v=1 then try https://acme.io/app today";
        assert_eq!(
            first_external_link(text, &["youtube.com", "twitter.com"]),
            Some("https://acme.io/app".to_string())
        );
    }

    #[test]
    fn first_external_link_none_when_all_excluded() {
        let text = "see https://reddit.com/r/foo";
        assert_eq!(first_external_link(text, &["reddit.com"]), None);
    }

    #[test]
    fn first_external_link_trims_trailing_punctuation() {
        assert_eq!(
            first_external_link("check https://acme.io/app.", &[]),
            Some("https://acme.io/app".to_string())
        );
    }

    #[test]
    fn merge_tags_dedupes_preserving_order() {
        let tags = vec![
            "ai".to_string(),
            "github".to_string(),
            "ai".to_string(),
            "open-source".to_string(),
        ];
        assert_eq!(merge_tags(tags, 8), vec!["ai", "github", "open-source"]);
    }

    #[test]
    fn merge_tags_caps() {
        let tags = (0..12).map(|i| format!("t{i}")).collect();
        assert_eq!(merge_tags(tags, 8).len(), 8);
    }
}
