//! Hacker News scraper: "Show HN" stories carrying an external URL.
//!
//! Pulls the current `showstories` list, fetches the top 30 items, and keeps
//! stories that link out of HN. Titles are cleaned of the "Show HN:" prefix
//! and any trailing ` - tagline` suffix before classification.

use super::{merge_tags, ItemOutcome, ScrapeContext};
use crate::classify::{self, clean_description};
use crate::dedup::{is_duplicate, normalize_url, Candidate};
use crate::models::{NewTool, ScrapeResults};
use chrono::DateTime;
use serde::Deserialize;
use tracing::{info, instrument, warn};

const SHOW_STORIES_URL: &str = "https://hacker-news.firebaseio.com/v0/showstories.json";
const ITEM_URL: &str = "https://hacker-news.firebaseio.com/v0/item";
const MAX_STORIES: usize = 30;
const MAX_TAGS: usize = 8;

#[derive(Debug, Deserialize)]
struct HnItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    time: i64,
    #[serde(rename = "type", default)]
    kind: String,
}

#[instrument(level = "info", skip_all)]
pub async fn scrape(ctx: &ScrapeContext) -> anyhow::Result<ScrapeResults> {
    let resp = ctx.http.get(SHOW_STORIES_URL).send().await?;
    if !resp.status().is_success() {
        anyhow::bail!("Hacker News API error: {}", resp.status());
    }
    let story_ids: Vec<u64> = resp.json().await?;
    let story_ids: Vec<u64> = story_ids.into_iter().take(MAX_STORIES).collect();

    let mut results = ScrapeResults {
        total: story_ids.len(),
        ..Default::default()
    };

    for id in story_ids {
        match process_story(ctx, id).await {
            Ok(outcome) => results.tally(outcome),
            Err(e) => {
                warn!(id, error = %e, "Failed to process HN story");
                results.record_error(format!("Item {id}: {e}"));
            }
        }
    }

    info!(
        added = results.added,
        duplicates = results.duplicates,
        errors = results.errors,
        "Hacker News scrape finished"
    );
    Ok(results)
}

async fn process_story(ctx: &ScrapeContext, id: u64) -> anyhow::Result<ItemOutcome> {
    let resp = ctx.http.get(format!("{ITEM_URL}/{id}.json")).send().await?;
    if !resp.status().is_success() {
        anyhow::bail!("item fetch failed: {}", resp.status());
    }
    let item: HnItem = resp.json().await?;

    let url = match item.url {
        Some(ref url) if item.kind == "story" => url.clone(),
        _ => return Ok(ItemOutcome::Skipped),
    };

    let name = clean_title(&item.title);
    let description = item
        .text
        .clone()
        .unwrap_or_else(|| format!("{} (via Hacker News)", item.title));
    let url = normalize_url(&url);

    if is_duplicate(
        &ctx.store,
        &Candidate {
            name: name.clone(),
            url: url.clone(),
        },
    )? {
        return Ok(ItemOutcome::Duplicate);
    }

    let category = classify::categorize(&name, &description);
    let mut tags = classify::extract_tags(&name, &description);
    tags.push("show hn".to_string());
    tags.push("hacker news".to_string());

    let release_date = DateTime::from_timestamp(item.time, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string());

    ctx.store.insert_tool(&NewTool {
        name,
        description: Some(clean_description(&description)),
        url,
        category,
        tags: merge_tags(tags, MAX_TAGS),
        image_url: None,
        release_date,
        source: "Hacker News".to_string(),
    })?;

    Ok(ItemOutcome::Added)
}

/// Strip the "Show HN:" prefix and any trailing ` - tagline` suffix.
fn clean_title(title: &str) -> String {
    let title = title.trim();
    let has_prefix = title
        .get(..8)
        .map(|head| head.eq_ignore_ascii_case("show hn:"))
        .unwrap_or(false);
    let without_prefix = if has_prefix { title[8..].trim() } else { title };
    match without_prefix.find(" - ") {
        Some(pos) => without_prefix[..pos].trim().to_string(),
        None => without_prefix.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_title_strips_show_hn_prefix() {
        assert_eq!(clean_title("Show HN: AcmeTool"), "AcmeTool");
        assert_eq!(clean_title("show hn without prefix match"), "show hn without prefix match");
    }

    #[test]
    fn clean_title_strips_trailing_dash_suffix() {
        assert_eq!(
            clean_title("Show HN: AcmeTool - the fastest widget generator"),
            "AcmeTool"
        );
        assert_eq!(clean_title("Plain title"), "Plain title");
    }

    #[test]
    fn hn_item_deserializes_with_sparse_fields() {
        let item: HnItem = serde_json::from_str(r#"{"title": "x", "type": "story"}"#).unwrap();
        assert_eq!(item.kind, "story");
        assert!(item.url.is_none());
    }
}
