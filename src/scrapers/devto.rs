//! Dev.to scraper: freshly published AI articles that showcase a tool.
//!
//! Pulls the newest `ai`-tagged articles, keeps those published within 48
//! hours whose title/description read like a tool showcase, then lets the
//! classifier decide tool-ness before inserting.

use super::{merge_tags, ItemOutcome, ScrapeContext};
use crate::dedup::{is_duplicate, normalize_url, Candidate};
use crate::models::{NewTool, ScrapeResults};
use crate::retry::retry;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::{info, instrument};

const ARTICLES_URL: &str = "https://dev.to/api/articles?tag=ai&state=fresh&per_page=30";
const MAX_TAGS: usize = 8;

const TOOLISH_KEYWORDS: &[&str] = &[
    "built", "create", "tool", "library", "app", "project", "launch", "introducing",
];

#[derive(Debug, Deserialize)]
struct Article {
    title: String,
    #[serde(default)]
    description: String,
    url: String,
    published_timestamp: String,
    #[serde(default)]
    tag_list: Vec<String>,
    #[serde(default)]
    social_image: Option<String>,
}

#[instrument(level = "info", skip_all)]
pub async fn scrape(ctx: &ScrapeContext) -> anyhow::Result<ScrapeResults> {
    let articles = retry(|| fetch_articles(ctx)).await?;

    let mut results = ScrapeResults {
        total: articles.len(),
        ..Default::default()
    };

    for article in &articles {
        match process_article(ctx, article).await {
            Ok(outcome) => results.tally(outcome),
            Err(e) => {
                results.record_error(format!("{}: {}", article.title, e));
            }
        }
    }

    info!(
        added = results.added,
        duplicates = results.duplicates,
        errors = results.errors,
        "Dev.to scrape finished"
    );
    Ok(results)
}

async fn fetch_articles(ctx: &ScrapeContext) -> anyhow::Result<Vec<Article>> {
    let resp = ctx.http.get(ARTICLES_URL).send().await?;
    if !resp.status().is_success() {
        anyhow::bail!("Dev.to API error: {}", resp.status());
    }
    Ok(resp.json().await?)
}

async fn process_article(ctx: &ScrapeContext, article: &Article) -> anyhow::Result<ItemOutcome> {
    if !is_recent(&article.published_timestamp) || !is_likely_tool(article) {
        return Ok(ItemOutcome::Skipped);
    }

    let url = normalize_url(&article.url);
    if is_duplicate(
        &ctx.store,
        &Candidate {
            name: article.title.clone(),
            url: url.clone(),
        },
    )? {
        return Ok(ItemOutcome::Duplicate);
    }

    let content = format!(
        "{} \n\n Tags: {}",
        article.description,
        article.tag_list.join(", ")
    );
    let classification = ctx.classifier.classify(&article.title, &content).await;
    if !classification.is_tool {
        return Ok(ItemOutcome::Skipped);
    }

    let mut tags = classification.tags.unwrap_or_default();
    tags.push("dev.to".to_string());
    tags.extend(article.tag_list.iter().cloned());

    ctx.store.insert_tool(&NewTool {
        name: classification.name.unwrap_or_else(|| article.title.clone()),
        description: Some(
            classification
                .description
                .unwrap_or_else(|| article.description.clone()),
        ),
        url,
        category: classification
            .category
            .unwrap_or_else(|| "Code & Development".to_string()),
        tags: merge_tags(tags, MAX_TAGS),
        image_url: article.social_image.clone(),
        release_date: article.published_timestamp.get(..10).map(str::to_string),
        source: "Dev.to".to_string(),
    })?;

    Ok(ItemOutcome::Added)
}

fn is_recent(timestamp: &str) -> bool {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(published) => published.with_timezone(&Utc) > Utc::now() - Duration::hours(48),
        Err(_) => false,
    }
}

fn is_likely_tool(article: &Article) -> bool {
    let text = format!("{} {}", article.title, article.description).to_lowercase();
    TOOLISH_KEYWORDS.iter().any(|k| text.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, description: &str, published: DateTime<Utc>) -> Article {
        Article {
            title: title.to_string(),
            description: description.to_string(),
            url: "https://dev.to/someone/post".to_string(),
            published_timestamp: published.to_rfc3339(),
            tag_list: vec!["ai".to_string()],
            social_image: None,
        }
    }

    #[test]
    fn recency_window_is_48_hours() {
        let fresh = article("t", "d", Utc::now() - Duration::hours(1));
        assert!(is_recent(&fresh.published_timestamp));
        let stale = article("t", "d", Utc::now() - Duration::hours(72));
        assert!(!is_recent(&stale.published_timestamp));
        assert!(!is_recent("not a timestamp"));
    }

    #[test]
    fn toolish_keyword_filter() {
        assert!(is_likely_tool(&article(
            "I built a summarizer",
            "a weekend project",
            Utc::now()
        )));
        assert!(!is_likely_tool(&article(
            "Thoughts on testing",
            "some reflections",
            Utc::now()
        )));
    }
}
