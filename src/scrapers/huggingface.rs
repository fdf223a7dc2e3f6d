//! Hugging Face scraper: trending Spaces that are still being worked on.
//!
//! Spaces are fetched sorted by likes and filtered to those modified within
//! the last 7 days, which keeps long-dormant evergreen demos out. Spaces are
//! almost always tools, so the classifier verdict only vetoes low-like ones.

use super::{merge_tags, ItemOutcome, ScrapeContext};
use crate::dedup::{is_duplicate, normalize_url, Candidate};
use crate::models::{NewTool, ScrapeResults};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::{info, instrument, warn};

const SPACES_URL: &str = "https://huggingface.co/api/spaces?sort=likes&direction=-1&limit=25&full=true";

/// Spaces this popular are accepted even when the classifier is unsure.
const TRUSTED_LIKES: u64 = 50;

#[derive(Debug, Deserialize)]
struct Space {
    id: String,
    #[serde(default)]
    likes: u64,
    #[serde(rename = "lastModified")]
    last_modified: String,
    #[serde(rename = "cardData", default)]
    card_data: Option<CardData>,
}

#[derive(Debug, Default, Deserialize)]
struct CardData {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    short_description: Option<String>,
}

#[instrument(level = "info", skip_all)]
pub async fn scrape(ctx: &ScrapeContext) -> anyhow::Result<ScrapeResults> {
    let resp = ctx.http.get(SPACES_URL).send().await?;
    if !resp.status().is_success() {
        anyhow::bail!("Hugging Face API error: {}", resp.status());
    }
    let spaces: Vec<Space> = resp.json().await?;

    let mut results = ScrapeResults {
        total: spaces.len(),
        ..Default::default()
    };

    for space in &spaces {
        match process_space(ctx, space).await {
            Ok(outcome) => results.tally(outcome),
            Err(e) => {
                warn!(space = %space.id, error = %e, "Failed to process space");
                results.record_error(format!("{}: {}", space.id, e));
            }
        }
    }

    info!(
        added = results.added,
        duplicates = results.duplicates,
        errors = results.errors,
        "Hugging Face scrape finished"
    );
    Ok(results)
}

async fn process_space(ctx: &ScrapeContext, space: &Space) -> anyhow::Result<ItemOutcome> {
    let last_modified = DateTime::parse_from_rfc3339(&space.last_modified)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now() - Duration::days(365));
    if last_modified < Utc::now() - Duration::days(7) {
        return Ok(ItemOutcome::Skipped);
    }

    let (owner, space_name) = space.id.split_once('/').unwrap_or(("", space.id.as_str()));
    let card = space.card_data.as_ref();
    let raw_name = card
        .and_then(|c| c.title.clone())
        .unwrap_or_else(|| space_name.to_string());
    let raw_desc = card
        .and_then(|c| c.short_description.clone())
        .unwrap_or_else(|| format!("AI Space by {owner}"));

    let space_url = normalize_url(&format!("https://huggingface.co/spaces/{}", space.id));
    if is_duplicate(
        &ctx.store,
        &Candidate {
            name: raw_name.clone(),
            url: space_url.clone(),
        },
    )? {
        return Ok(ItemOutcome::Duplicate);
    }

    let classification = ctx.classifier.classify(&raw_name, &raw_desc).await;
    if !classification.is_tool && space.likes < TRUSTED_LIKES {
        return Ok(ItemOutcome::Skipped);
    }

    let mut tags = classification.tags.unwrap_or_default();
    tags.push("hugging-face".to_string());
    tags.push("demo".to_string());

    ctx.store.insert_tool(&NewTool {
        name: classification.name.unwrap_or(raw_name),
        description: Some(classification.description.unwrap_or(raw_desc)),
        url: space_url,
        category: classification.category.unwrap_or_else(|| "Other".to_string()),
        tags: merge_tags(tags, 8),
        image_url: None,
        release_date: Some(last_modified.format("%Y-%m-%d").to_string()),
        source: "Hugging Face".to_string(),
    })?;

    Ok(ItemOutcome::Added)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn space_deserializes_with_partial_card_data() {
        let space: Space = serde_json::from_str(
            r#"{"id": "acme/widget", "likes": 12, "lastModified": "2026-08-29T00:00:00.000Z"}"#,
        )
        .unwrap();
        assert_eq!(space.id, "acme/widget");
        assert!(space.card_data.is_none());
    }

    #[test]
    fn unparseable_last_modified_counts_as_stale() {
        let stale = DateTime::parse_from_rfc3339("not-a-date");
        assert!(stale.is_err());
    }
}
