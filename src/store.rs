//! SQLite-backed catalog store for tools, categories, and run logs.
//!
//! The store owns a single [`rusqlite::Connection`] behind an `Arc<Mutex<..>>`
//! so it can be shared across concurrently running scrapers. List-valued
//! columns (`tags`, run-log `summary`/`details`) are stored as JSON text.
//!
//! Uniqueness of tools is advisory: the deduplication engine pre-checks before
//! insert, but no store-level constraint enforces it, so near-simultaneous
//! scrapers can double-insert. This is an accepted limitation.

use crate::models::{
    Category, NewTool, PlatformStats, RunLog, RunSummary, ScraperOutcome, Tool,
};
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Fixed page size for catalog listing, matching the presentation layer.
pub const PAGE_SIZE: i64 = 12;

const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS tools (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    name         TEXT NOT NULL,
    description  TEXT,
    url          TEXT NOT NULL,
    category     TEXT NOT NULL,
    tags         TEXT NOT NULL DEFAULT '[]',
    image_url    TEXT,
    release_date TEXT,
    source       TEXT NOT NULL,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL UNIQUE,
    description TEXT,
    icon        TEXT
);

CREATE TABLE IF NOT EXISTS run_logs (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    run_date   TEXT NOT NULL,
    summary    TEXT NOT NULL,
    details    TEXT NOT NULL,
    created_at TEXT NOT NULL
);

INSERT OR IGNORE INTO categories (name, description, icon) VALUES
    ('Image Generation', 'Tools that create or edit images from prompts', 'image'),
    ('Text & Writing', 'Writing assistants, copy and content generators', 'pen'),
    ('Code & Development', 'Coding assistants, libraries, and developer tooling', 'code'),
    ('Video & Audio', 'Video, voice, music, and speech tools', 'film'),
    ('Data Analysis', 'Analytics, visualization, and insight tools', 'chart'),
    ('Chatbots & Assistants', 'Conversational agents and virtual assistants', 'message'),
    ('Productivity', 'Workflow, automation, and organization tools', 'zap'),
    ('Design & Creative', 'UI/UX, prototyping, and branding tools', 'palette'),
    ('Research & Education', 'Search, study, and knowledge discovery tools', 'book'),
    ('Other', 'Tools outside the fixed taxonomy', 'box');
"#;

/// Optional filters for [`Store::get_tools`].
#[derive(Debug, Default, Clone)]
pub struct ToolFilters {
    /// Equality match on category.
    pub category: Option<String>,
    /// Case-insensitive substring match on name or description.
    pub search: Option<String>,
    /// Tool must carry every listed tag.
    pub tags: Vec<String>,
}

/// Minimal projection used by the deduplication engine's fuzzy scan.
#[derive(Debug, Clone)]
pub struct ToolIdentity {
    pub name: String,
    pub url: String,
}

#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn init_schema(&self) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(DDL)?;
        Ok(())
    }

    // ---- write API (scrapers only) ----

    pub fn insert_tool(&self, tool: &NewTool) -> anyhow::Result<i64> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO tools (name, description, url, category, tags, image_url, release_date, source, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                tool.name,
                tool.description,
                tool.url,
                tool.category,
                serde_json::to_string(&tool.tags)?,
                tool.image_url,
                tool.release_date,
                tool.source,
                now,
                now,
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!(id, name = %tool.name, source = %tool.source, "Inserted tool");
        Ok(id)
    }

    pub fn insert_run_log(
        &self,
        run_date: &str,
        summary: &RunSummary,
        details: &[ScraperOutcome],
    ) -> anyhow::Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO run_logs (run_date, summary, details, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                run_date,
                serde_json::to_string(summary)?,
                serde_json::to_string(details)?,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn latest_run_logs(&self, limit: i64) -> anyhow::Result<Vec<RunLog>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, run_date, summary, details, created_at
             FROM run_logs ORDER BY created_at DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut logs = Vec::new();
        for row in rows {
            let (id, run_date, summary, details, created_at) = row?;
            logs.push(RunLog {
                id,
                run_date,
                summary: serde_json::from_str(&summary)?,
                details: serde_json::from_str(&details)?,
                created_at,
            });
        }
        Ok(logs)
    }

    // ---- deduplication support ----

    pub fn url_exists(&self, url: &str) -> anyhow::Result<bool> {
        let conn = self.conn.lock().unwrap();
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM tools WHERE url = ?1", params![url], |r| {
                r.get(0)
            })?;
        Ok(count > 0)
    }

    pub fn name_exists_ci(&self, name: &str) -> anyhow::Result<bool> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM tools WHERE name = ?1 COLLATE NOCASE",
            params![name],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    }

    /// Full-table projection for the fuzzy dedup scan. Acceptable at this
    /// catalog size; an approximate-match index would replace it at scale.
    pub fn tool_identities(&self) -> anyhow::Result<Vec<ToolIdentity>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT name, url FROM tools")?;
        let rows = stmt.query_map([], |row| {
            Ok(ToolIdentity {
                name: row.get(0)?,
                url: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ---- read API (presentation layer) ----

    pub fn get_tools(&self, page: i64, filters: &ToolFilters) -> anyhow::Result<Vec<Tool>> {
        let mut sql = String::from("SELECT * FROM tools WHERE 1=1");
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref category) = filters.category {
            sql.push_str(" AND category = ?");
            args.push(Box::new(category.clone()));
        }
        if let Some(ref search) = filters.search {
            sql.push_str(" AND (name LIKE '%' || ? || '%' OR description LIKE '%' || ? || '%')");
            args.push(Box::new(search.clone()));
            args.push(Box::new(search.clone()));
        }
        for tag in &filters.tags {
            // tags is a JSON array of strings; containment via the tag's JSON
            // encoding, with LIKE wildcards escaped so % and _ match literally
            sql.push_str(" AND tags LIKE '%' || ? || '%' ESCAPE '\\'");
            let pattern = serde_json::to_string(tag)?
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            args.push(Box::new(pattern));
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?");
        args.push(Box::new(PAGE_SIZE));
        args.push(Box::new(page * PAGE_SIZE));

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let params = rusqlite::params_from_iter(args.iter().map(|a| a.as_ref()));
        let rows = stmt.query_map(params, row_to_tool)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn get_tool_by_id(&self, id: i64) -> anyhow::Result<Option<Tool>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM tools WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], row_to_tool)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    pub fn get_categories(&self) -> anyhow::Result<Vec<Category>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT id, name, description, icon FROM categories ORDER BY name ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                icon: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn get_all_tags(&self) -> anyhow::Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT tags FROM tools")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut tags: Vec<String> = Vec::new();
        for raw in rows {
            let parsed: Vec<String> = serde_json::from_str(&raw?).unwrap_or_default();
            tags.extend(parsed);
        }
        tags.sort();
        tags.dedup();
        Ok(tags)
    }

    pub fn get_platform_stats(&self) -> anyhow::Result<PlatformStats> {
        let total_tags = self.get_all_tags()?.len() as i64;
        let today = Utc::now().format("%Y-%m-%d").to_string();

        let conn = self.conn.lock().unwrap();
        let total_tools: i64 =
            conn.query_row("SELECT COUNT(*) FROM tools", [], |r| r.get(0))?;
        let total_categories: i64 =
            conn.query_row("SELECT COUNT(*) FROM categories", [], |r| r.get(0))?;
        let new_today: i64 = conn.query_row(
            "SELECT COUNT(*) FROM tools WHERE substr(created_at, 1, 10) = ?1",
            params![today],
            |r| r.get(0),
        )?;

        Ok(PlatformStats {
            total_tools,
            total_categories,
            new_today,
            total_tags,
        })
    }
}

fn row_to_tool(row: &Row<'_>) -> rusqlite::Result<Tool> {
    let raw_tags: String = row.get("tags")?;
    Ok(Tool {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        url: row.get("url")?,
        category: row.get("category")?,
        tags: serde_json::from_str(&raw_tags).unwrap_or_default(),
        image_url: row.get("image_url")?,
        release_date: row.get("release_date")?,
        source: row.get("source")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
