//! Command-line interface definitions for AI Tool Scout.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Credentials can be provided via command-line flags or environment
//! variables. Where the upstream API allows it, a scraper with absent
//! credentials degrades to unauthenticated access; otherwise it reports an
//! error that the run summary records.

use clap::{Parser, Subcommand};

/// Command-line arguments for the AI Tool Scout application.
///
/// # Examples
///
/// ```sh
/// # Run every scraper against the default database
/// ai_tool_scout run
///
/// # Run one scraper with a Gemini key for LLM classification
/// ai_tool_scout --gemini-api-key YOUR_KEY run --scraper "Dev.to"
///
/// # Browse the catalog
/// ai_tool_scout list --category "Image Generation" --page 2
/// ai_tool_scout show 42
/// ai_tool_scout stats
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the SQLite catalog database
    #[arg(short, long, env = "TOOL_SCOUT_DB", default_value = "tools.db")]
    pub db: String,

    /// Gemini API key for LLM classification (heuristics are used without it)
    #[arg(long, env = "GEMINI_API_KEY")]
    pub gemini_api_key: Option<String>,

    /// GitHub token for authenticated repository search
    #[arg(long, env = "GITHUB_ACCESS_TOKEN")]
    pub github_token: Option<String>,

    /// ProductHunt API token (the ProductHunt scraper reports an error without it)
    #[arg(long, env = "PRODUCTHUNT_API_TOKEN")]
    pub producthunt_token: Option<String>,

    /// YouTube Data API key (the YouTube scraper reports an error without it)
    #[arg(long, env = "YOUTUBE_API_KEY")]
    pub youtube_api_key: Option<String>,

    /// Reddit OAuth client id
    #[arg(long, env = "REDDIT_CLIENT_ID")]
    pub reddit_client_id: Option<String>,

    /// Reddit OAuth client secret
    #[arg(long, env = "REDDIT_CLIENT_SECRET")]
    pub reddit_client_secret: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run all scrapers (or a single named one) and record the run
    Run {
        /// Run only this scraper, e.g. "GitHub" or "Hacker News"
        #[arg(long)]
        scraper: Option<String>,
    },

    /// List catalog tools, newest first, 12 per page
    List {
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: i64,

        /// Filter by exact category name
        #[arg(long)]
        category: Option<String>,

        /// Case-insensitive substring match on name and description
        #[arg(long)]
        search: Option<String>,

        /// Require a tag (repeatable)
        #[arg(long)]
        tag: Vec<String>,
    },

    /// Show one tool by id
    Show { id: i64 },

    /// Show recent scraper runs with their per-scraper outcomes
    Logs {
        /// How many runs to show, newest first
        #[arg(long, default_value_t = 5)]
        limit: i64,
    },

    /// List all categories
    Categories,

    /// List every distinct tag in the catalog
    Tags,

    /// Show catalog statistics
    Stats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_run_parsing() {
        let cli = Cli::parse_from(&["ai_tool_scout", "--db", "/tmp/t.db", "run"]);

        assert_eq!(cli.db, "/tmp/t.db");
        assert!(matches!(cli.command, Command::Run { scraper: None }));
    }

    #[test]
    fn test_cli_single_scraper() {
        let cli = Cli::parse_from(&["ai_tool_scout", "run", "--scraper", "Hacker News"]);

        match cli.command {
            Command::Run { scraper } => assert_eq!(scraper.as_deref(), Some("Hacker News")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_list_filters() {
        let cli = Cli::parse_from(&[
            "ai_tool_scout",
            "list",
            "--page",
            "3",
            "--category",
            "Image Generation",
            "--tag",
            "ai",
            "--tag",
            "art",
        ]);

        match cli.command {
            Command::List {
                page,
                category,
                search,
                tag,
            } => {
                assert_eq!(page, 3);
                assert_eq!(category.as_deref(), Some("Image Generation"));
                assert!(search.is_none());
                assert_eq!(tag, vec!["ai", "art"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_logs_limit() {
        let cli = Cli::parse_from(&["ai_tool_scout", "logs", "--limit", "10"]);
        match cli.command {
            Command::Logs { limit } => assert_eq!(limit, 10),
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::parse_from(&["ai_tool_scout", "logs"]);
        assert!(matches!(cli.command, Command::Logs { limit: 5 }));
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(&["ai_tool_scout", "stats"]);

        assert_eq!(cli.db, "tools.db");
        assert!(matches!(cli.command, Command::Stats));
    }
}
