//! Classification of candidate items into catalog-ready tool records.
//!
//! Two strategies implement [`ClassifierStrategy`]:
//! - [`GeminiClassifier`] delegates to the generative-language API with a
//!   strict JSON output contract
//! - [`HeuristicClassifier`] scores a fixed keyword taxonomy locally
//!
//! The composing [`Classifier`] tries the external strategy when an API key
//! is configured and silently falls back to the heuristic on any failure, so
//! callers never see the distinction and `classify` itself cannot fail.

use crate::models::Classification;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use tracing::{debug, instrument, warn};

/// Presence of any of these marks a text as describing a tool.
const TOOL_KEYWORDS: &[&str] = &[
    "launch", "release", "tool", "library", "model", "platform", "api", "sdk", "generator",
];

/// The fixed category taxonomy with its scoring keywords. Declaration order
/// breaks score ties: an earlier category wins over a later one with the same
/// number of keyword hits.
static CATEGORY_KEYWORDS: Lazy<Vec<(&'static str, Vec<&'static str>)>> = Lazy::new(|| {
    vec![
        (
            "Image Generation",
            vec![
                "image", "photo", "picture", "art", "visual", "graphic", "illustration",
                "midjourney", "dalle", "stable diffusion", "generate image", "create image",
            ],
        ),
        (
            "Text & Writing",
            vec![
                "text", "writing", "content", "copy", "article", "blog", "essay", "gpt",
                "writer", "copywriting", "generate text", "write",
            ],
        ),
        (
            "Code & Development",
            vec![
                "code", "programming", "developer", "coding", "software", "github", "copilot",
                "debug", "development", "api", "function",
            ],
        ),
        (
            "Video & Audio",
            vec![
                "video", "audio", "voice", "speech", "sound", "music", "podcast", "tts",
                "text-to-speech", "voice synthesis", "video editing",
            ],
        ),
        (
            "Data Analysis",
            vec![
                "data", "analytics", "analysis", "visualization", "chart", "graph",
                "statistics", "insights", "business intelligence", "dashboard",
            ],
        ),
        (
            "Chatbots & Assistants",
            vec![
                "chatbot", "chat", "assistant", "conversation", "dialogue", "bot",
                "virtual assistant", "ai assistant", "conversational",
            ],
        ),
        (
            "Productivity",
            vec![
                "productivity", "workflow", "automation", "task", "organize", "management",
                "efficiency", "workspace", "collaboration",
            ],
        ),
        (
            "Design & Creative",
            vec![
                "design", "creative", "ui", "ux", "interface", "prototype", "mockup",
                "template", "branding", "logo",
            ],
        ),
        (
            "Research & Education",
            vec![
                "research", "education", "learning", "study", "academic", "search",
                "knowledge", "discovery", "analysis", "paper",
            ],
        ),
    ]
});

/// Tag vocabulary scanned in order; the first five present in the text win.
const COMMON_TAGS: &[&str] = &[
    "ai", "ml", "machine learning", "deep learning", "neural network", "automation", "api",
    "saas", "cloud", "web", "mobile", "free", "open source", "enterprise", "startup",
    "productivity", "creative", "business", "marketing", "analytics", "visualization",
    "generation", "synthesis",
];

const MAX_HEURISTIC_TAGS: usize = 5;
const MAX_DESCRIPTION_LEN: usize = 500;

/// True when the text contains any tool-announcement keyword.
pub fn has_tool_keywords(text: &str) -> bool {
    let lower = text.to_lowercase();
    TOOL_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Pick the taxonomy category with the most keyword hits; "Other" when none.
pub fn categorize(name: &str, description: &str) -> String {
    let text = format!("{} {}", name, description).to_lowercase();

    let mut best = "Other";
    let mut max_score = 0usize;
    for (category, keywords) in CATEGORY_KEYWORDS.iter() {
        let score = keywords.iter().filter(|k| text.contains(*k)).count();
        if score > max_score {
            max_score = score;
            best = *category;
        }
    }
    best.to_string()
}

/// Collect up to five common tags present in the text.
pub fn extract_tags(name: &str, description: &str) -> Vec<String> {
    let text = format!("{} {}", name, description).to_lowercase();
    COMMON_TAGS
        .iter()
        .filter(|tag| text.contains(*tag))
        .take(MAX_HEURISTIC_TAGS)
        .map(|t| t.to_string())
        .collect()
}

/// Collapse whitespace and cap at 500 characters with an ellipsis.
pub fn clean_description(description: &str) -> String {
    let cleaned = description.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.chars().count() > MAX_DESCRIPTION_LEN {
        let truncated: String = cleaned.chars().take(MAX_DESCRIPTION_LEN - 3).collect();
        format!("{}...", truncated)
    } else {
        cleaned
    }
}

#[async_trait]
pub trait ClassifierStrategy: Send + Sync {
    async fn classify(&self, title: &str, content: &str) -> anyhow::Result<Classification>;
}

/// Keyword-based local classification. Never fails.
pub struct HeuristicClassifier;

#[async_trait]
impl ClassifierStrategy for HeuristicClassifier {
    async fn classify(&self, title: &str, content: &str) -> anyhow::Result<Classification> {
        if !has_tool_keywords(&format!("{} {}", title, content)) {
            return Ok(Classification {
                is_tool: false,
                ..Default::default()
            });
        }
        Ok(Classification {
            is_tool: true,
            name: Some(title.to_string()),
            description: Some(clean_description(content)),
            category: Some(categorize(title, content)),
            tags: Some(extract_tags(title, content)),
        })
    }
}

/// Gemini structured-output classification over HTTP.
pub struct GeminiClassifier {
    api_key: String,
    client: reqwest::Client,
}

const GEMINI_MODEL: &str = "gemini-2.5-flash-lite";

impl GeminiClassifier {
    pub fn new(api_key: String, client: reqwest::Client) -> Self {
        Self { api_key, client }
    }

    fn prompt(title: &str, content: &str) -> String {
        format!(
            "You are an AI Tools extractor. Analyze the text provided.\n\
             1. Determine if it describes a specific software tool, library, or AI model.\n\
             2. If yes, extract a concise Name (5-6 words max, no taglines), an objective \
             Summary (2-3 sentences, no promotional language), a Category, and 3-5 Tags.\n\
             3. Category must be one of: Image Generation, Text & Writing, Code & Development, \
             Video & Audio, Data Analysis, Chatbots & Assistants, Productivity, \
             Design & Creative, Research & Education, Other.\n\
             4. Return strictly valid JSON.\n\n\
             Title: {}\nContent: {}\n\n\
             JSON Schema:\n\
             {{ \"is_tool\": boolean, \"name\": string, \"description\": string, \
             \"category\": string, \"tags\": string[] }}",
            title, content
        )
    }
}

#[async_trait]
impl ClassifierStrategy for GeminiClassifier {
    #[instrument(level = "debug", skip_all)]
    async fn classify(&self, title: &str, content: &str) -> anyhow::Result<Classification> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            GEMINI_MODEL, self.api_key
        );

        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": Self::prompt(title, content) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "temperature": 0.3
            }
        });

        let resp = self.client.post(&url).json(&body).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error {}: {}", status, detail);
        }

        let json: serde_json::Value = resp.json().await?;
        let text = json
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("Gemini response missing candidate text"))?;

        Ok(serde_json::from_str(text)?)
    }
}

/// The composing classifier used by scrapers.
pub struct Classifier {
    external: Option<GeminiClassifier>,
    heuristic: HeuristicClassifier,
}

impl Classifier {
    pub fn new(gemini_api_key: Option<String>, client: reqwest::Client) -> Self {
        let external =
            gemini_api_key.map(|key| GeminiClassifier::new(key, client));
        Self {
            external,
            heuristic: HeuristicClassifier,
        }
    }

    /// Classify a title/content pair. The external strategy is consulted first
    /// when configured; any failure degrades to the heuristic path, so this
    /// never surfaces an error to the calling scraper.
    pub async fn classify(&self, title: &str, content: &str) -> Classification {
        if let Some(ref external) = self.external {
            match external.classify(title, content).await {
                Ok(result) => {
                    debug!(is_tool = result.is_tool, "External classification succeeded");
                    return result;
                }
                Err(e) => {
                    warn!(error = %e, "External classification failed; falling back to heuristics");
                }
            }
        }
        self.heuristic
            .classify(title, content)
            .await
            .unwrap_or_else(|_| Classification::default())
    }
}
