//! YouTube scraper: tool links surfaced by fresh review videos.
//!
//! Requires an API key. Searches for day-old "new ai tool review" videos,
//! then fetches each video's full description and hunts for the first
//! external link that isn't YouTube itself or a social profile. The video is
//! only ever a pointer; the extracted link is the tool.

use super::{first_external_link, merge_tags, ItemOutcome, ScrapeContext};
use crate::dedup::{is_duplicate, normalize_url, Candidate};
use crate::models::{NewTool, ScrapeResults};
use chrono::{Duration, SecondsFormat, Utc};
use serde::Deserialize;
use tracing::{info, instrument};

const SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";
const VIDEOS_URL: &str = "https://www.googleapis.com/youtube/v3/videos";
const SEARCH_QUERY: &str = "new ai tool review";
const MAX_TAGS: usize = 8;

/// Domains that are the video ecosystem, not the tool being reviewed.
const LINK_EXCLUSIONS: &[&str] = &[
    "youtube.com",
    "youtu.be",
    "twitter.com",
    "facebook.com",
    "instagram.com",
];

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: VideoId,
}

#[derive(Debug, Deserialize)]
struct VideoId {
    #[serde(rename = "videoId")]
    video_id: String,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "publishedAt", default)]
    published_at: String,
}

#[instrument(level = "info", skip_all)]
pub async fn scrape(ctx: &ScrapeContext) -> anyhow::Result<ScrapeResults> {
    let api_key = ctx
        .creds
        .youtube_api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("YouTube API key not configured"))?;

    let one_day_ago =
        (Utc::now() - Duration::hours(24)).to_rfc3339_opts(SecondsFormat::Secs, true);
    let search_url = format!(
        "{}?part=snippet&q={}&type=video&order=date&publishedAfter={}&maxResults=50&key={}",
        SEARCH_URL,
        urlencoding::encode(SEARCH_QUERY),
        one_day_ago,
        api_key
    );

    let resp = ctx.http.get(&search_url).send().await?;
    if !resp.status().is_success() {
        anyhow::bail!("YouTube API error: {}", resp.status());
    }
    let search: SearchResponse = resp.json().await?;

    let mut results = ScrapeResults {
        total: search.items.len(),
        ..Default::default()
    };

    for item in &search.items {
        match process_video(ctx, &api_key, &item.id.video_id).await {
            Ok(outcome) => results.tally(outcome),
            Err(e) => {
                results.record_error(format!("Video {}: {}", item.id.video_id, e));
            }
        }
    }

    info!(
        added = results.added,
        duplicates = results.duplicates,
        errors = results.errors,
        "YouTube scrape finished"
    );
    Ok(results)
}

async fn process_video(
    ctx: &ScrapeContext,
    api_key: &str,
    video_id: &str,
) -> anyhow::Result<ItemOutcome> {
    let details_url = format!("{VIDEOS_URL}?part=snippet&id={video_id}&key={api_key}");
    let resp = ctx.http.get(&details_url).send().await?;
    if !resp.status().is_success() {
        anyhow::bail!("video details fetch failed: {}", resp.status());
    }
    let videos: VideosResponse = resp.json().await?;
    let snippet = match videos.items.into_iter().next() {
        Some(item) => item.snippet,
        None => return Ok(ItemOutcome::Skipped),
    };

    // the description must point somewhere outside the video ecosystem
    let tool_url = match first_external_link(&snippet.description, LINK_EXCLUSIONS) {
        Some(url) => url,
        None => return Ok(ItemOutcome::Skipped),
    };

    let classification = ctx
        .classifier
        .classify(&snippet.title, &snippet.description)
        .await;
    if !classification.is_tool {
        return Ok(ItemOutcome::Skipped);
    }

    let name = classification.name.unwrap_or_else(|| snippet.title.clone());
    let url = normalize_url(&tool_url);
    if is_duplicate(
        &ctx.store,
        &Candidate {
            name: name.clone(),
            url: url.clone(),
        },
    )? {
        return Ok(ItemOutcome::Duplicate);
    }

    let description = classification
        .description
        .unwrap_or_else(|| snippet.description.chars().take(200).collect());
    let mut tags = classification.tags.unwrap_or_default();
    tags.push("youtube".to_string());
    tags.push("review".to_string());

    ctx.store.insert_tool(&NewTool {
        name,
        description: Some(description),
        url,
        category: classification
            .category
            .unwrap_or_else(|| "Video & Audio".to_string()),
        tags: merge_tags(tags, MAX_TAGS),
        image_url: None,
        release_date: snippet.published_at.get(..10).map(str::to_string),
        source: "YouTube".to_string(),
    })?;

    Ok(ItemOutcome::Added)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_link_extraction_skips_video_ecosystem() {
        let description = "Subscribe: https://youtube.com/@me\nFollow: https://twitter.com/me\nTry the tool: https://acme.io/app";
        assert_eq!(
            first_external_link(description, LINK_EXCLUSIONS),
            Some("https://acme.io/app".to_string())
        );
    }

    #[test]
    fn search_response_parses_with_missing_items() {
        let parsed: SearchResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(parsed.items.is_empty());
    }
}
