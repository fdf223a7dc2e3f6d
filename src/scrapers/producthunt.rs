//! ProductHunt scraper: newest launches, filtered to AI-related products.
//!
//! Requires an API token. The GraphQL query fetches the 20 newest posts with
//! their topics; an AI-relatedness keyword check gates the rest of the
//! pipeline so unrelated launches never reach classification.

use super::{merge_tags, ItemOutcome, ScrapeContext};
use crate::classify::{self, clean_description};
use crate::dedup::{is_duplicate, normalize_url, Candidate};
use crate::models::{NewTool, ScrapeResults};
use crate::retry::retry;
use serde::Deserialize;
use tracing::{info, instrument};

const GRAPHQL_URL: &str = "https://api.producthunt.com/v2/api/graphql";
const MAX_TAGS: usize = 8;

const AI_KEYWORDS: &[&str] = &[
    "ai", "artificial intelligence", "machine learning", "ml", "deep learning", "neural",
    "gpt", "llm", "chatbot", "automation", "intelligent", "smart", "cognitive",
];

const POSTS_QUERY: &str = r#"
query {
  posts(first: 20, order: NEWEST) {
    edges {
      node {
        id
        name
        tagline
        description
        url
        thumbnail { url }
        createdAt
        topics(first: 5) { edges { node { name } } }
      }
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: PostsData,
}

#[derive(Debug, Deserialize)]
struct PostsData {
    posts: PostConnection,
}

#[derive(Debug, Deserialize)]
struct PostConnection {
    edges: Vec<PostEdge>,
}

#[derive(Debug, Deserialize)]
struct PostEdge {
    node: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    name: String,
    #[serde(default)]
    tagline: String,
    #[serde(default)]
    description: String,
    url: String,
    #[serde(default)]
    thumbnail: Option<Thumbnail>,
    #[serde(rename = "createdAt")]
    created_at: String,
    #[serde(default)]
    topics: Option<TopicConnection>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
struct TopicConnection {
    edges: Vec<TopicEdge>,
}

#[derive(Debug, Deserialize)]
struct TopicEdge {
    node: Topic,
}

#[derive(Debug, Deserialize)]
struct Topic {
    name: String,
}

#[instrument(level = "info", skip_all)]
pub async fn scrape(ctx: &ScrapeContext) -> anyhow::Result<ScrapeResults> {
    let token = ctx
        .creds
        .producthunt_token
        .clone()
        .ok_or_else(|| anyhow::anyhow!("ProductHunt API token not configured"))?;

    let posts = retry(|| fetch_posts(ctx, &token)).await?;

    let mut results = ScrapeResults {
        total: posts.len(),
        ..Default::default()
    };

    for post in &posts {
        match process_post(ctx, post) {
            Ok(outcome) => results.tally(outcome),
            Err(e) => {
                results.record_error(format!("{}: {}", post.name, e));
            }
        }
    }

    info!(
        added = results.added,
        duplicates = results.duplicates,
        errors = results.errors,
        "ProductHunt scrape finished"
    );
    Ok(results)
}

async fn fetch_posts(ctx: &ScrapeContext, token: &str) -> anyhow::Result<Vec<Post>> {
    let resp = ctx
        .http
        .post(GRAPHQL_URL)
        .bearer_auth(token)
        .json(&serde_json::json!({ "query": POSTS_QUERY }))
        .send()
        .await?;
    if !resp.status().is_success() {
        anyhow::bail!("ProductHunt API error: {}", resp.status());
    }
    let body: GraphQlResponse = resp.json().await?;
    Ok(body.data.posts.edges.into_iter().map(|e| e.node).collect())
}

fn process_post(ctx: &ScrapeContext, post: &Post) -> anyhow::Result<ItemOutcome> {
    if !is_ai_related(post) {
        return Ok(ItemOutcome::Skipped);
    }

    let url = normalize_url(&post.url);
    if is_duplicate(
        &ctx.store,
        &Candidate {
            name: post.name.clone(),
            url: url.clone(),
        },
    )? {
        return Ok(ItemOutcome::Duplicate);
    }

    let category = classify::categorize(&post.name, &post.description);
    let mut tags = classify::extract_tags(&post.name, &post.description);
    if let Some(ref topics) = post.topics {
        for edge in &topics.edges {
            tags.push(edge.node.name.to_lowercase());
        }
    }

    let description = if post.description.is_empty() {
        post.tagline.clone()
    } else {
        post.description.clone()
    };

    ctx.store.insert_tool(&NewTool {
        name: post.name.clone(),
        description: Some(clean_description(&description)),
        url,
        category,
        tags: merge_tags(tags, MAX_TAGS),
        image_url: post.thumbnail.as_ref().map(|t| t.url.clone()),
        release_date: post.created_at.get(..10).map(str::to_string),
        source: "ProductHunt".to_string(),
    })?;

    Ok(ItemOutcome::Added)
}

fn is_ai_related(post: &Post) -> bool {
    let text = format!("{} {} {}", post.name, post.tagline, post.description).to_lowercase();
    AI_KEYWORDS.iter().any(|k| text.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(name: &str, tagline: &str, description: &str) -> Post {
        Post {
            name: name.to_string(),
            tagline: tagline.to_string(),
            description: description.to_string(),
            url: "https://acme.io".to_string(),
            thumbnail: None,
            created_at: "2026-08-29T12:00:00Z".to_string(),
            topics: None,
        }
    }

    #[test]
    fn ai_keyword_gate() {
        assert!(is_ai_related(&post("Acme", "an AI writing pal", "")));
        assert!(is_ai_related(&post("Acme", "", "powered by machine learning")));
        assert!(!is_ai_related(&post("Lunchbox", "meal prep delivered", "food boxes")));
    }

    #[test]
    fn graphql_response_shape_parses() {
        let raw = r#"{"data":{"posts":{"edges":[{"node":{
            "id":"1","name":"Acme","tagline":"AI pal","description":"an ai tool",
            "url":"https://acme.io","thumbnail":{"url":"https://img"},
            "createdAt":"2026-08-29T12:00:00Z",
            "topics":{"edges":[{"node":{"name":"Artificial Intelligence"}}]}
        }}]}}}"#;
        let parsed: GraphQlResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.data.posts.edges.len(), 1);
        assert_eq!(parsed.data.posts.edges[0].node.name, "Acme");
    }
}
