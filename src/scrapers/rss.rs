//! RSS scraper: launch coverage from AI news feeds.
//!
//! Monitors a fixed feed list. An item qualifies when its title/description
//! carry launch-style keywords without exclusion keywords, and the linked
//! article page yields a qualifying external link for the tool itself (the
//! article URL is news coverage, not the tool).

use super::{merge_tags, ItemOutcome, ScrapeContext};
use crate::classify::{self, clean_description};
use crate::dedup::{is_duplicate, normalize_url, Candidate};
use crate::models::{NewTool, ScrapeResults};
use crate::retry::retry;
use chrono::DateTime;
use quick_xml::events::Event;
use quick_xml::Reader;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};

struct Feed {
    name: &'static str,
    url: &'static str,
}

const FEEDS: &[Feed] = &[
    Feed {
        name: "TechCrunch AI",
        url: "https://techcrunch.com/category/artificial-intelligence/feed/",
    },
    Feed {
        name: "The Verge AI",
        url: "https://www.theverge.com/ai-artificial-intelligence/rss/index.xml",
    },
    Feed {
        name: "VentureBeat AI",
        url: "https://venturebeat.com/category/ai/feed/",
    },
];

const LAUNCH_KEYWORDS: &[&str] = &[
    "launch", "releases", "introduces", "unveils", "announces", "debuts", "rolls out",
    "new tool", "new ai", "startup",
];

const EXCLUDE_KEYWORDS: &[&str] = &["opinion", "analysis", "interview", "podcast", "video"];

/// Domains never accepted as the tool's own URL when scanning article HTML.
const LINK_EXCLUSIONS: &[&str] = &[
    "techcrunch.com",
    "theverge.com",
    "venturebeat.com",
    "twitter.com",
    "facebook.com",
    "linkedin.com",
    "youtube.com",
];

const MAX_TAGS: usize = 8;

#[derive(Debug, Default, Clone)]
struct RssItem {
    title: String,
    description: String,
    link: String,
    pub_date: String,
}

#[instrument(level = "info", skip_all)]
pub async fn scrape(ctx: &ScrapeContext) -> anyhow::Result<ScrapeResults> {
    let mut results = ScrapeResults::default();

    for feed in FEEDS {
        let items = match retry(|| fetch_feed(ctx, feed.url)).await {
            Ok(items) => items,
            Err(e) => {
                warn!(feed = feed.name, error = %e, "Failed to fetch feed");
                results.record_error(format!("Feed {}: {}", feed.name, e));
                continue;
            }
        };
        results.total += items.len();
        debug!(feed = feed.name, count = items.len(), "Parsed feed items");

        for item in items {
            match process_item(ctx, feed.name, &item).await {
                Ok(outcome) => results.tally(outcome),
                Err(e) => {
                    results.record_error(format!("{}: {}", item.title, e));
                }
            }
        }
    }

    info!(
        added = results.added,
        duplicates = results.duplicates,
        errors = results.errors,
        "RSS scrape finished"
    );
    Ok(results)
}

async fn fetch_feed(ctx: &ScrapeContext, url: &str) -> anyhow::Result<Vec<RssItem>> {
    let resp = ctx.http.get(url).send().await?;
    if !resp.status().is_success() {
        anyhow::bail!("RSS fetch error: {}", resp.status());
    }
    let xml = resp.text().await?;
    parse_feed(&xml)
}

/// Pull `<item>` entries out of an RSS document with the streaming reader.
/// Handles both plain text and CDATA payloads; nested markup inside a field
/// is flattened to its text content.
fn parse_feed(xml: &str) -> anyhow::Result<Vec<RssItem>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut current: Option<RssItem> = None;
    let mut field: Option<&'static str> = None;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"item" => current = Some(RssItem::default()),
                b"title" if current.is_some() => field = Some("title"),
                b"description" if current.is_some() => field = Some("description"),
                b"link" if current.is_some() => field = Some("link"),
                b"pubDate" if current.is_some() => field = Some("pubDate"),
                _ => {}
            },
            Event::Text(ref e) => {
                if let (Some(item), Some(name)) = (current.as_mut(), field) {
                    let text = e.unescape()?.into_owned();
                    append_field(item, name, &text);
                }
            }
            Event::CData(ref e) => {
                if let (Some(item), Some(name)) = (current.as_mut(), field) {
                    let text = String::from_utf8_lossy(&e.to_vec()).into_owned();
                    append_field(item, name, &text);
                }
            }
            Event::End(ref e) => match e.name().as_ref() {
                b"item" => {
                    if let Some(item) = current.take() {
                        if !item.title.is_empty() && !item.link.is_empty() {
                            items.push(item);
                        }
                    }
                    field = None;
                }
                b"title" | b"description" | b"link" | b"pubDate" => field = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(items)
}

fn append_field(item: &mut RssItem, field: &str, text: &str) {
    let target = match field {
        "title" => &mut item.title,
        "description" => &mut item.description,
        "link" => &mut item.link,
        "pubDate" => &mut item.pub_date,
        _ => return,
    };
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(strip_html(text).trim());
}

/// Drop embedded markup from feed fields that smuggle HTML in.
fn strip_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

async fn process_item(
    ctx: &ScrapeContext,
    feed_name: &str,
    item: &RssItem,
) -> anyhow::Result<ItemOutcome> {
    if !is_tool_launch(item) {
        return Ok(ItemOutcome::Skipped);
    }

    let tool_url = match extract_tool_url_from_article(ctx, &item.link).await {
        Some(url) => url,
        None => return Ok(ItemOutcome::Skipped),
    };

    let name = extract_tool_name(&item.title);
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

    let category = classify::categorize(&item.title, &item.description);
    let tags = classify::extract_tags(&item.title, &item.description);

    let release_date = DateTime::parse_from_rfc2822(&item.pub_date)
        .ok()
        .map(|dt| dt.format("%Y-%m-%d").to_string());

    ctx.store.insert_tool(&NewTool {
        name,
        description: Some(clean_description(&item.description)),
        url,
        category,
        tags: merge_tags(tags, MAX_TAGS),
        image_url: None,
        release_date,
        source: feed_name.to_string(),
    })?;

    Ok(ItemOutcome::Added)
}

fn is_tool_launch(item: &RssItem) -> bool {
    let text = format!("{} {}", item.title, item.description).to_lowercase();
    let launched = LAUNCH_KEYWORDS.iter().any(|k| text.contains(k));
    let excluded = EXCLUDE_KEYWORDS.iter().any(|k| text.contains(k));
    launched && !excluded
}

/// Fetch the article page and scan its links for the first qualifying
/// external URL. Any fetch problem means "no URL found", not an error.
async fn extract_tool_url_from_article(ctx: &ScrapeContext, article_url: &str) -> Option<String> {
    let resp = ctx.http.get(article_url).send().await.ok()?;
    if !resp.status().is_success() {
        return None;
    }
    let html = resp.text().await.ok()?;
    scan_article_for_link(&html)
}

fn scan_article_for_link(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let anchor_selector = Selector::parse("a[href]").ok()?;

    for element in document.select(&anchor_selector) {
        if let Some(href) = element.value().attr("href") {
            if href.starts_with("http")
                && !LINK_EXCLUSIONS.iter().any(|domain| href.contains(domain))
            {
                return Some(href.to_string());
            }
        }
    }
    None
}

/// Reduce a headline like "Acme launches WidgetAI, a ..." to the tool name.
fn extract_tool_name(title: &str) -> String {
    let lower = title.to_lowercase();
    let mut name = title.to_string();

    for verb in ["launches", "releases", "introduces", "unveils", "announces"] {
        if let Some(pos) = lower.find(verb) {
            if let Some(rest) = title.get(pos + verb.len()..) {
                name = rest.trim_start().to_string();
                break;
            }
        }
    }

    if let Some(pos) = name.find(',') {
        name = name[..pos].to_string();
    }
    match name.find(|c| matches!(c, '-' | '–' | '—')) {
        Some(pos) => name[..pos].trim().to_string(),
        None => name.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example AI Feed</title>
    <item>
      <title>Acme launches WidgetAI, a code assistant</title>
      <description><![CDATA[<p>Acme today releases <b>WidgetAI</b> for developers.</p>]]></description>
      <link>https://example.com/acme-widgetai</link>
      <pubDate>Sat, 29 Aug 2026 10:00:00 +0000</pubDate>
    </item>
    <item>
      <title>Opinion: the state of AI</title>
      <description>An opinion piece.</description>
      <link>https://example.com/opinion</link>
      <pubDate>Sat, 29 Aug 2026 11:00:00 +0000</pubDate>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parse_feed_extracts_items_and_cdata() {
        let items = parse_feed(SAMPLE_FEED).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Acme launches WidgetAI, a code assistant");
        assert_eq!(
            items[0].description,
            "Acme today releases WidgetAI for developers."
        );
        assert_eq!(items[0].link, "https://example.com/acme-widgetai");
    }

    #[test]
    fn launch_filter_excludes_opinion_pieces() {
        let items = parse_feed(SAMPLE_FEED).unwrap();
        assert!(is_tool_launch(&items[0]));
        assert!(!is_tool_launch(&items[1]));
    }

    #[test]
    fn tool_name_from_headline() {
        assert_eq!(
            extract_tool_name("Acme launches WidgetAI, a code assistant"),
            "WidgetAI"
        );
        assert_eq!(
            extract_tool_name("Startup unveils PhotoBrush - AI art for all"),
            "PhotoBrush"
        );
        assert_eq!(extract_tool_name("WidgetAI"), "WidgetAI");
    }

    #[test]
    fn strip_html_flattens_tags() {
        assert_eq!(strip_html("<p>hello <b>world</b></p>"), "hello world");
        assert_eq!(strip_html("plain"), "plain");
    }

    #[test]
    fn article_scan_skips_publisher_and_social_links() {
        let html = r#"<html><body>
            <a href="https://techcrunch.com/about">About</a>
            <a href="https://twitter.com/techcrunch">Tweet</a>
            <a href="/internal/path">Internal</a>
            <a href="https://widget-ai.dev/signup">Try WidgetAI</a>
        </body></html>"#;
        assert_eq!(
            scan_article_for_link(html),
            Some("https://widget-ai.dev/signup".to_string())
        );
        assert_eq!(scan_article_for_link("<p>no links</p>"), None);
    }
}
