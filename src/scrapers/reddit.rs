//! Reddit scraper: tool announcements from AI subreddits.
//!
//! Monitors a fixed subreddit list. Uses OAuth client credentials when
//! configured, otherwise the public JSON endpoint (rate limited but
//! anonymous). A post qualifies when it carries an extractable non-Reddit
//! URL and announcement-style wording without discussion wording.

use super::{first_external_link, merge_tags, ItemOutcome, ScrapeContext};
use crate::classify::{self, clean_description};
use crate::dedup::{is_duplicate, normalize_url, Candidate};
use crate::models::{NewTool, ScrapeResults};
use crate::retry::retry;
use chrono::DateTime;
use serde::Deserialize;
use tracing::{info, instrument, warn};

const SUBREDDITS: &[&str] = &["artificial", "MachineLearning", "ArtificialIntelligence"];
const POSTS_PER_SUBREDDIT: u32 = 25;
const MAX_TAGS: usize = 8;

const ANNOUNCEMENT_KEYWORDS: &[&str] = &[
    "launch", "released", "introducing", "new tool", "built", "created", "made", "check out",
    "announcement", "available",
];

const EXCLUDE_KEYWORDS: &[&str] =
    &["question", "help", "discussion", "opinion", "what do you think"];

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<PostWrapper>,
}

#[derive(Debug, Deserialize)]
struct PostWrapper {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    created_utc: f64,
    subreddit: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[instrument(level = "info", skip_all)]
pub async fn scrape(ctx: &ScrapeContext) -> anyhow::Result<ScrapeResults> {
    let mut results = ScrapeResults::default();

    let access_token = match (&ctx.creds.reddit_client_id, &ctx.creds.reddit_client_secret) {
        (Some(id), Some(secret)) => match fetch_access_token(ctx, id, secret).await {
            Ok(token) => Some(token),
            Err(e) => {
                warn!(error = %e, "Reddit OAuth failed; using public endpoint");
                None
            }
        },
        _ => None,
    };

    for subreddit in SUBREDDITS {
        let posts = match retry(|| fetch_posts(ctx, subreddit, access_token.as_deref())).await {
            Ok(posts) => posts,
            Err(e) => {
                warn!(subreddit, error = %e, "Failed to fetch subreddit");
                results.record_error(format!("Subreddit {subreddit}: {e}"));
                continue;
            }
        };
        results.total += posts.len();

        for post in posts {
            match process_post(ctx, &post) {
                Ok(outcome) => results.tally(outcome),
                Err(e) => {
                    results.record_error(format!("{}: {}", post.title, e));
                }
            }
        }
    }

    info!(
        added = results.added,
        duplicates = results.duplicates,
        errors = results.errors,
        "Reddit scrape finished"
    );
    Ok(results)
}

async fn fetch_access_token(
    ctx: &ScrapeContext,
    client_id: &str,
    client_secret: &str,
) -> anyhow::Result<String> {
    let resp = ctx
        .http
        .post("https://www.reddit.com/api/v1/access_token")
        .basic_auth(client_id, Some(client_secret))
        .form(&[("grant_type", "client_credentials")])
        .send()
        .await?;
    if !resp.status().is_success() {
        anyhow::bail!("Reddit OAuth error: {}", resp.status());
    }
    let token: TokenResponse = resp.json().await?;
    Ok(token.access_token)
}

async fn fetch_posts(
    ctx: &ScrapeContext,
    subreddit: &str,
    access_token: Option<&str>,
) -> anyhow::Result<Vec<Post>> {
    let req = match access_token {
        Some(token) => ctx
            .http
            .get(format!(
                "https://oauth.reddit.com/r/{subreddit}/new?limit={POSTS_PER_SUBREDDIT}"
            ))
            .bearer_auth(token),
        None => ctx.http.get(format!(
            "https://www.reddit.com/r/{subreddit}/new.json?limit={POSTS_PER_SUBREDDIT}"
        )),
    };

    let resp = req.send().await?;
    if !resp.status().is_success() {
        anyhow::bail!("Reddit API error: {}", resp.status());
    }
    let listing: Listing = resp.json().await?;
    Ok(listing.data.children.into_iter().map(|w| w.data).collect())
}

fn process_post(ctx: &ScrapeContext, post: &Post) -> anyhow::Result<ItemOutcome> {
    let tool_url = match extract_tool_url(post) {
        Some(url) => url,
        None => return Ok(ItemOutcome::Skipped),
    };
    if !is_tool_announcement(post) {
        return Ok(ItemOutcome::Skipped);
    }

    let url = normalize_url(&tool_url);
    if is_duplicate(
        &ctx.store,
        &Candidate {
            name: post.title.clone(),
            url: url.clone(),
        },
    )? {
        return Ok(ItemOutcome::Duplicate);
    }

    let category = classify::categorize(&post.title, &post.selftext);
    let mut tags = classify::extract_tags(&post.title, &post.selftext);
    tags.push(post.subreddit.to_lowercase());

    let description = if post.selftext.is_empty() {
        post.title.clone()
    } else {
        post.selftext.clone()
    };
    let release_date = DateTime::from_timestamp(post.created_utc as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string());

    ctx.store.insert_tool(&NewTool {
        name: extract_tool_name(&post.title),
        description: Some(clean_description(&description)),
        url,
        category,
        tags: merge_tags(tags, MAX_TAGS),
        image_url: None,
        release_date,
        source: format!("Reddit r/{}", post.subreddit),
    })?;

    Ok(ItemOutcome::Added)
}

/// The post's own link if it leaves Reddit, otherwise the first non-Reddit
/// URL found in the body text.
fn extract_tool_url(post: &Post) -> Option<String> {
    if !post.url.is_empty() && !post.url.contains("reddit.com") {
        return Some(post.url.clone());
    }
    first_external_link(&post.selftext, &["reddit.com"])
}

fn is_tool_announcement(post: &Post) -> bool {
    let title = post.title.to_lowercase();
    let text = post.selftext.to_lowercase();

    let announced = ANNOUNCEMENT_KEYWORDS
        .iter()
        .any(|k| title.contains(k) || text.contains(k));
    let excluded = EXCLUDE_KEYWORDS.iter().any(|k| title.contains(k));

    announced && !excluded
}

/// Trim announcement boilerplate down to the likely tool name.
fn extract_tool_name(title: &str) -> String {
    let mut name = title.trim();

    // bracketed subreddit-convention prefixes like "[P]"
    while name.starts_with('[') {
        match name.find(']') {
            Some(pos) => name = name[pos + 1..].trim_start(),
            None => break,
        }
    }

    let mut owned = name.to_string();
    for prefix in ["Introducing", "Launched", "Released", "New", "Check out"] {
        let matched = owned
            .get(..prefix.len())
            .map(|head| head.eq_ignore_ascii_case(prefix))
            .unwrap_or(false);
        if matched && owned.len() > prefix.len() {
            owned = owned[prefix.len()..].trim_start().to_string();
            break;
        }
    }

    match owned.find(|c| matches!(c, '-' | '–' | '—' | ':')) {
        Some(pos) => owned[..pos].trim().to_string(),
        None => owned.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(title: &str, selftext: &str, url: &str) -> Post {
        Post {
            title: title.to_string(),
            selftext: selftext.to_string(),
            url: url.to_string(),
            created_utc: 1_760_000_000.0,
            subreddit: "artificial".to_string(),
        }
    }

    #[test]
    fn external_post_url_wins() {
        let p = post("t", "body", "https://acme.io");
        assert_eq!(extract_tool_url(&p), Some("https://acme.io".to_string()));
    }

    #[test]
    fn selftext_link_used_when_post_links_to_reddit() {
        let p = post(
            "t",
            "try it at https://acme.io/app today",
            "https://www.reddit.com/r/artificial/comments/1",
        );
        assert_eq!(extract_tool_url(&p), Some("https://acme.io/app".to_string()));
    }

    #[test]
    fn no_external_link_means_no_url() {
        let p = post("t", "just text", "https://www.reddit.com/r/artificial/1");
        assert_eq!(extract_tool_url(&p), None);
    }

    #[test]
    fn announcement_filter_requires_keywords_and_no_exclusions() {
        assert!(is_tool_announcement(&post(
            "Introducing AcmeBot",
            "we built a new tool",
            ""
        )));
        assert!(!is_tool_announcement(&post(
            "Question about launch strategies",
            "we built something",
            ""
        )));
        assert!(!is_tool_announcement(&post("Random musings", "no keywords here", "")));
    }

    #[test]
    fn tool_name_extraction_strips_boilerplate() {
        assert_eq!(extract_tool_name("Introducing AcmeBot - your AI pal"), "AcmeBot");
        assert_eq!(extract_tool_name("[P] Launched WidgetAI: fast widgets"), "WidgetAI");
        assert_eq!(extract_tool_name("PlainName"), "PlainName");
    }
}
