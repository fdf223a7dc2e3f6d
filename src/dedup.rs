//! Duplicate detection for candidate tools.
//!
//! Three checks run in order, first match wins:
//! 1. Exact normalized-URL match against the store
//! 2. Case-insensitive exact name match
//! 3. Full-table scan comparing name similarity (normalized edit distance)
//!    and URL domains
//!
//! The check is best-effort and non-transactional: two scrapers racing on
//! similar candidates can both observe "not a duplicate" and both insert.
//! The domain check in step 3 also trades precision for recall (two distinct
//! tools on one domain will match). Both behaviors are accepted.

use crate::store::Store;
use tracing::{debug, instrument};
use url::Url;

/// Names more similar than this are considered the same tool.
const NAME_SIMILARITY_THRESHOLD: f64 = 0.85;

/// A candidate tool identity, prior to classification.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub name: String,
    pub url: String,
}

/// Canonicalize a URL for stable comparison: strip the trailing slash from
/// the path and clear query string and fragment. Fails open: an unparseable
/// input is returned unchanged so it can still participate in exact matching.
pub fn normalize_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            let path = parsed.path().trim_end_matches('/').to_string();
            parsed.set_path(&path);
            parsed.set_query(None);
            parsed.set_fragment(None);
            // A root path still serializes as "/", so trim it off the
            // reconstructed string to keep comparisons stable.
            let mut out = parsed.to_string();
            if out.ends_with('/') {
                out.pop();
            }
            out
        }
        Err(_) => url.to_string(),
    }
}

/// Normalized edit-distance similarity in `[0, 1]`. Two empty strings are
/// identical (1.0).
pub fn similarity(a: &str, b: &str) -> f64 {
    let (longer, shorter) = if a.chars().count() >= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let max_len = longer.chars().count();
    if max_len == 0 {
        return 1.0;
    }
    let distance = levenshtein(longer, shorter);
    (max_len - distance) as f64 / max_len as f64
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut prev: Vec<usize> = (0..=a.len()).collect();
    let mut curr = vec![0usize; a.len() + 1];

    for (i, bc) in b.iter().enumerate() {
        curr[0] = i + 1;
        for (j, ac) in a.iter().enumerate() {
            let cost = if ac == bc { 0 } else { 1 };
            curr[j + 1] = (prev[j] + cost).min(curr[j] + 1).min(prev[j + 1] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[a.len()]
}

/// Compare hostnames with a leading `www.` stripped. Fails closed: a
/// malformed URL on either side is never "the same domain", so it cannot
/// suppress a legitimate candidate.
pub fn same_domain(url_a: &str, url_b: &str) -> bool {
    let host = |u: &str| -> Option<String> {
        Url::parse(u)
            .ok()?
            .host_str()
            .map(|h| h.strip_prefix("www.").unwrap_or(h).to_string())
    };
    match (host(url_a), host(url_b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Decide whether a candidate already exists in the catalog.
#[instrument(level = "debug", skip(store), fields(name = %candidate.name))]
pub fn is_duplicate(store: &Store, candidate: &Candidate) -> anyhow::Result<bool> {
    if store.url_exists(&candidate.url)? {
        debug!("Duplicate by exact URL");
        return Ok(true);
    }

    if store.name_exists_ci(&candidate.name)? {
        debug!("Duplicate by case-insensitive name");
        return Ok(true);
    }

    let candidate_name = candidate.name.to_lowercase();
    for existing in store.tool_identities()? {
        if similarity(&candidate_name, &existing.name.to_lowercase())
            > NAME_SIMILARITY_THRESHOLD
        {
            debug!(existing = %existing.name, "Duplicate by name similarity");
            return Ok(true);
        }
        if same_domain(&candidate.url, &existing.url) {
            debug!(existing = %existing.url, "Duplicate by domain");
            return Ok(true);
        }
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewTool;

    #[test]
    fn normalize_strips_trailing_slash_query_and_fragment() {
        assert_eq!(
            normalize_url("https://acme.com/tool/?utm_source=x#pricing"),
            "https://acme.com/tool"
        );
        assert_eq!(normalize_url("https://acme.com/"), "https://acme.com");
    }

    #[test]
    fn normalize_is_idempotent() {
        let urls = [
            "https://acme.com/a/b/?q=1#f",
            "https://www.example.org",
            "not a url at all",
        ];
        for u in urls {
            let once = normalize_url(u);
            assert_eq!(normalize_url(&once), once);
        }
    }

    #[test]
    fn normalize_fails_open_on_unparseable_input() {
        assert_eq!(normalize_url("::::"), "::::");
        assert_eq!(normalize_url(""), "");
    }

    #[test]
    fn similarity_identities() {
        assert_eq!(similarity("acme", "acme"), 1.0);
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("acme", ""), 0.0);
        assert_eq!(similarity("", "acme"), 0.0);
    }

    #[test]
    fn similarity_is_normalized_edit_distance() {
        // one substitution over four chars
        assert!((similarity("acme", "acmo") - 0.75).abs() < 1e-9);
        assert!(similarity("photoshop", "photoshopx") > 0.85);
        assert!(similarity("alpha", "zebra") < 0.85);
    }

    #[test]
    fn same_domain_strips_www() {
        assert!(same_domain("https://foo.com/a", "https://www.foo.com/b"));
        assert!(!same_domain("https://foo.com", "https://bar.com"));
    }

    #[test]
    fn same_domain_fails_closed_on_malformed_urls() {
        assert!(!same_domain("nonsense", "https://foo.com"));
        assert!(!same_domain("https://foo.com", ""));
    }

    fn seeded_store() -> Store {
        let store = Store::open_in_memory().unwrap();
        store.init_schema().unwrap();
        store
            .insert_tool(&NewTool {
                name: "Acme".to_string(),
                description: None,
                url: "https://acme.com/x".to_string(),
                category: "Other".to_string(),
                tags: vec![],
                image_url: None,
                release_date: None,
                source: "Test".to_string(),
            })
            .unwrap();
        store
    }

    #[test]
    fn duplicate_by_case_insensitive_name() {
        let store = seeded_store();
        let candidate = Candidate {
            name: "acme".to_string(),
            url: "https://other.com".to_string(),
        };
        assert!(is_duplicate(&store, &candidate).unwrap());
    }

    #[test]
    fn duplicate_by_same_domain() {
        let store = seeded_store();
        let candidate = Candidate {
            name: "Different".to_string(),
            url: "https://acme.com/y".to_string(),
        };
        assert!(is_duplicate(&store, &candidate).unwrap());
    }

    #[test]
    fn unrelated_candidate_is_not_a_duplicate() {
        let store = seeded_store();
        let candidate = Candidate {
            name: "Totally Unrelated Thing".to_string(),
            url: "https://zzz.io".to_string(),
        };
        assert!(!is_duplicate(&store, &candidate).unwrap());
    }

    #[test]
    fn duplicate_by_exact_url() {
        let store = seeded_store();
        let candidate = Candidate {
            name: "Renamed Entirely".to_string(),
            url: "https://acme.com/x".to_string(),
        };
        assert!(is_duplicate(&store, &candidate).unwrap());
    }
}
