//! Merging keyword and semantic results into one de-duplicated list.
//!
//! Each result is keyed by a normalized form of its link so that
//! equivalent references (absolute vs relative, trailing slash, query
//! string, fragment, configured base path) collapse to the same entry.
//! Semantic results come first in their own order; keyword results then
//! either upgrade an existing entry in place (highlighted excerpts beat
//! plain text) or append at the end.

use super::highlight::HIGHLIGHT_OPEN;
use super::types::{KeywordResult, MergedResult, ResultOrigin, SearchHit};
use std::collections::HashMap;

/// Normalizes a link into the identity key used for de-duplication.
///
/// Absolute links reduce to their path component; relative links are used
/// as-is. A configured base path prefix, any query string or fragment, and
/// a trailing slash are all stripped, so `https://x/a/`, `/a?ref=1` and
/// `/a#section` share the key `/a`.
pub fn normalize_link_key(link: &str, base_path: &str) -> String {
    let mut path = if let Some(after_scheme) = link
        .strip_prefix("https://")
        .or_else(|| link.strip_prefix("http://"))
    {
        match after_scheme.find('/') {
            Some(slash) => &after_scheme[slash..],
            None => "/",
        }
    } else {
        link
    };

    if let Some(cut) = path.find(['?', '#']) {
        path = &path[..cut];
    }

    if !base_path.is_empty() {
        if let Some(stripped) = path.strip_prefix(base_path) {
            path = stripped;
        }
    }

    path.strip_suffix('/').unwrap_or(path).to_string()
}

/// Merges the two independently ordered result lists.
///
/// Semantic results register first (first write wins on duplicate keys
/// within the same source). Keyword results either upgrade an existing
/// entry in place (a highlighted title or preview replaces the plain
/// semantic text and the entry is re-tagged [`ResultOrigin::Both`]) or
/// append as keyword-only entries at the end. The output contains no
/// duplicate keys and is stable for identical inputs.
pub fn merge_results(
    semantic: &[SearchHit],
    keyword: &[KeywordResult],
    base_path: &str,
) -> Vec<MergedResult> {
    let mut merged: Vec<MergedResult> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for hit in semantic {
        let key = normalize_link_key(&hit.anchor_link, base_path);
        if index_by_key.contains_key(&key) {
            continue;
        }
        index_by_key.insert(key, merged.len());
        merged.push(MergedResult {
            title: hit.title.clone(),
            summary: hit.preview.clone().unwrap_or_default(),
            link: hit.anchor_link.clone(),
            origin: ResultOrigin::Semantic,
            score: Some(hit.score),
        });
    }

    for result in keyword {
        let key = normalize_link_key(&result.permalink, base_path);
        match index_by_key.get(&key) {
            Some(&position) => {
                let entry = &mut merged[position];
                entry.origin = ResultOrigin::Both;
                if result.title.contains(HIGHLIGHT_OPEN) {
                    entry.title = result.title.clone();
                }
                if result.preview.contains(HIGHLIGHT_OPEN) || entry.summary.is_empty() {
                    entry.summary = result.preview.clone();
                }
            }
            None => {
                index_by_key.insert(key, merged.len());
                merged.push(MergedResult {
                    title: result.title.clone(),
                    summary: result.preview.clone(),
                    link: result.permalink.clone(),
                    origin: ResultOrigin::Keyword,
                    score: None,
                });
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(title: &str, anchor_link: &str, score: f32) -> SearchHit {
        SearchHit {
            title: title.to_string(),
            url: anchor_link.split('#').next().unwrap_or(anchor_link).to_string(),
            anchor_link: anchor_link.to_string(),
            lang: "en".to_string(),
            score,
            preview: None,
        }
    }

    fn keyword(title: &str, permalink: &str, count: usize) -> KeywordResult {
        KeywordResult {
            title: title.to_string(),
            preview: "plain preview".to_string(),
            permalink: permalink.to_string(),
            match_count: count,
        }
    }

    #[test]
    fn test_normalize_absolute_and_relative_links() {
        assert_eq!(normalize_link_key("https://x/a/", ""), "/a");
        assert_eq!(normalize_link_key("/a", ""), "/a");
        assert_eq!(normalize_link_key("http://x/a?ref=1", ""), "/a");
        assert_eq!(normalize_link_key("/a#section-2", ""), "/a");
        assert_eq!(normalize_link_key("https://x", ""), "");
    }

    #[test]
    fn test_normalize_strips_base_path() {
        assert_eq!(normalize_link_key("https://x/blog/a/", "/blog"), "/a");
        assert_eq!(normalize_link_key("/blog/a", "/blog"), "/a");
        // Links outside the base path keep their full path.
        assert_eq!(normalize_link_key("/other/a", "/blog"), "/other/a");
    }

    #[test]
    fn test_equivalent_links_collapse_to_one_entry() {
        let semantic = vec![hit("A Random Walk", "https://x/a/", 0.9)];
        let mut kw = keyword("A <mark>Random</mark> Walk", "/a", 1);
        kw.preview = "with <mark>random</mark> in it".to_string();

        let merged = merge_results(&semantic, &[kw], "");

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].origin, ResultOrigin::Both);
        // Highlighted keyword rendering beats the plain semantic title.
        assert_eq!(merged[0].title, "A <mark>Random</mark> Walk");
        assert_eq!(merged[0].summary, "with <mark>random</mark> in it");
        // The semantic score survives the upgrade.
        assert_eq!(merged[0].score, Some(0.9));
    }

    #[test]
    fn test_keyword_only_entries_append_after_semantic() {
        let semantic = vec![hit("Sem One", "/s1/", 0.8), hit("Sem Two", "/s2/", 0.7)];
        let kw = vec![keyword("Kw Only", "/k1/", 2)];

        let merged = merge_results(&semantic, &kw, "");

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].title, "Sem One");
        assert_eq!(merged[1].title, "Sem Two");
        assert_eq!(merged[2].title, "Kw Only");
        assert_eq!(merged[2].origin, ResultOrigin::Keyword);
        assert_eq!(merged[2].score, None);
    }

    #[test]
    fn test_duplicate_semantic_keys_first_write_wins() {
        let semantic = vec![
            hit("First Chunk", "/a/#chunk-0", 0.9),
            hit("Second Chunk", "/a/#chunk-3", 0.8),
        ];
        let merged = merge_results(&semantic, &[], "");

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].title, "First Chunk");
        assert_eq!(merged[0].score, Some(0.9));
    }

    #[test]
    fn test_plain_keyword_preview_does_not_override_semantic_preview() {
        let mut semantic_hit = hit("Doc", "/a/", 0.9);
        semantic_hit.preview = Some("semantic preview".to_string());
        let kw = keyword("Doc", "/a/", 1);

        let merged = merge_results(&[semantic_hit], &[kw], "");

        assert_eq!(merged[0].summary, "semantic preview");
        assert_eq!(merged[0].origin, ResultOrigin::Both);
    }

    #[test]
    fn test_merge_is_stable_for_identical_inputs() {
        let semantic = vec![hit("One", "/1/", 0.9), hit("Two", "/2/", 0.5)];
        let kw = vec![keyword("Three", "/3/", 4), keyword("Four", "/4/", 4)];

        let first = merge_results(&semantic, &kw, "");
        let second = merge_results(&semantic, &kw, "");
        assert_eq!(first, second);
    }
}
